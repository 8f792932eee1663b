use super::model::{DiffLine, SectionInfo};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// How far a moved paragraph travelled
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "unit", rename_all = "lowercase")]
pub enum MoveDistance {
    Line { amount: usize },
    /// `name` is the title of the section on the other end of the move
    Section { amount: usize, name: String },
}

impl MoveDistance {
    pub fn label(&self) -> String {
        match self {
            MoveDistance::Line { amount } => {
                format!("Moved {} line{}", amount, if *amount == 1 { "" } else { "s" })
            }
            MoveDistance::Section { amount, name } => {
                let title = name.trim().trim_matches('=').trim();
                format!(
                    "Moved {} section{} to {}",
                    amount,
                    if *amount == 1 { "" } else { "s" },
                    title
                )
            }
        }
    }
}

/// Badge index per move id. Both halves of a pair share one index; indices
/// are dense from 0 in order of first appearance.
pub fn grouped_move_indexes(lines: &[DiffLine]) -> HashMap<String, usize> {
    let mut result: HashMap<String, usize> = HashMap::new();
    let mut next = 0usize;

    for info in lines
        .iter()
        .filter(|l| l.is_move())
        .filter_map(|l| l.move_info.as_ref())
    {
        if result.contains_key(&info.id) {
            continue;
        }
        let index = match result.get(&info.link_id) {
            Some(&existing) => existing,
            None => {
                next += 1;
                next - 1
            }
        };
        result.insert(info.id.clone(), index);
    }

    result
}

/// Distance travelled by each move pair, keyed by both `id` and `link_id`.
///
/// A section distance is preferred when the halves sit in sections with
/// different locations; the first pair to record one wins. Otherwise a
/// non-zero line distance is recorded, overwriting earlier entries.
/// Without a section table nothing is computed.
pub fn move_distances(
    lines: &[DiffLine],
    sections: Option<&[SectionInfo]>,
) -> HashMap<String, MoveDistance> {
    let mut result: HashMap<String, MoveDistance> = HashMap::new();
    let sections = match sections {
        Some(s) if !s.is_empty() => s,
        _ => return result,
    };

    let moved: Vec<&DiffLine> = lines.iter().filter(|l| l.is_move()).collect();

    // link_id -> the line carrying it; looking up our own id finds our partner
    let mut corresponding: HashMap<&str, &DiffLine> = HashMap::new();
    for line in &moved {
        if let Some(info) = &line.move_info {
            corresponding.insert(info.link_id.as_str(), line);
        }
    }

    for line in &moved {
        let Some(info) = &line.move_info else {
            continue;
        };
        let Some(other) = corresponding.get(info.id.as_str()) else {
            continue;
        };

        let section_pair = line
            .section_info_index
            .and_then(|i| sections.get(i))
            .zip(other.section_info_index.and_then(|i| sections.get(i)));
        if let Some((own, theirs)) = section_pair {
            let traversed = theirs.location.abs_diff(own.location) as usize;
            if traversed > 0 {
                if !result.contains_key(&info.id) && !result.contains_key(&info.link_id) {
                    let distance = MoveDistance::Section {
                        amount: traversed,
                        name: theirs.title.clone(),
                    };
                    result.insert(info.id.clone(), distance.clone());
                    result.insert(info.link_id.clone(), distance);
                }
                continue;
            }
        }

        if let (Some(own), Some(theirs)) = (line.line_number, other.line_number) {
            let traversed = own.abs_diff(theirs);
            if traversed > 0 {
                let distance = MoveDistance::Line { amount: traversed };
                result.insert(info.id.clone(), distance.clone());
                result.insert(info.link_id.clone(), distance);
            }
        }
    }

    result
}
