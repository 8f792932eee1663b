use super::model::{DiffResponse, SectionInfo};
use serde::{Deserialize, Serialize};

/// Replacement section table for one revision, for responses whose
/// upstream section metadata is missing or wrong.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionOverride {
    /// The `to` revision this override applies to
    pub revision: u64,
    #[serde(default)]
    pub sections: Vec<SectionInfo>,
    #[serde(default)]
    pub assignments: Vec<SectionAssignment>,
}

/// Assign `section` to the diff items at the given 0-based positions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionAssignment {
    pub section: usize,
    #[serde(default)]
    pub items: Vec<usize>,
}

/// Apply the override matching `to_revision`, if any. Returns whether one applied.
pub fn apply_section_override(
    response: &mut DiffResponse,
    to_revision: Option<u64>,
    overrides: &[SectionOverride],
) -> bool {
    let Some(rev) = to_revision else {
        return false;
    };
    let Some(ov) = overrides.iter().find(|o| o.revision == rev) else {
        return false;
    };

    response.section_info = Some(ov.sections.clone());
    for assignment in &ov.assignments {
        for &pos in &assignment.items {
            match response.diff.get_mut(pos) {
                Some(item) => item.section_info_index = Some(assignment.section),
                None => log::warn!(
                    "section override for revision {} points past the diff (item {})",
                    rev,
                    pos
                ),
            }
        }
    }
    log::debug!("applied section override for revision {}", rev);
    true
}

/// Carry the last seen section index and line number forward onto items
/// that lack them (deleted lines, move sources).
///
/// This is a heuristic: when a heading itself was deleted or moved, the
/// carried section can be the wrong one.
pub fn forward_fill(response: &mut DiffResponse) {
    let mut last_section: Option<usize> = None;
    let mut last_line: Option<usize> = None;

    for item in response.diff.iter_mut() {
        match item.section_info_index {
            Some(idx) => last_section = Some(idx),
            None => item.section_info_index = last_section,
        }
        match item.line_number {
            Some(n) => last_line = Some(n),
            None => item.line_number = last_line,
        }
    }
}
