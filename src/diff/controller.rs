use super::group::{group, DiffMode, PresentationGroup};
use super::model::{DiffResponse, SectionInfo};
use super::moves::{grouped_move_indexes, move_distances, MoveDistance};
use super::prepare::{apply_section_override, forward_fill, SectionOverride};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything a renderer needs for one diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffPresentation {
    pub mode: DiffMode,
    pub groups: Vec<PresentationGroup>,
    /// Badge index per move id
    pub move_indexes: HashMap<String, usize>,
    /// Distance per move id
    pub move_distances: HashMap<String, MoveDistance>,
    #[serde(default)]
    pub section_info: Vec<SectionInfo>,
}

impl DiffPresentation {
    pub fn move_badge(&self, id: &str) -> Option<usize> {
        self.move_indexes.get(id).copied()
    }

    pub fn move_distance(&self, id: &str) -> Option<&MoveDistance> {
        self.move_distances.get(id)
    }

    /// Number of distinct move pairs
    pub fn move_pair_count(&self) -> usize {
        self.move_indexes
            .values()
            .max()
            .map(|m| m + 1)
            .unwrap_or(0)
    }

    pub fn change_group_count(&self) -> usize {
        self.groups
            .iter()
            .filter(|g| matches!(g, PresentationGroup::Change { .. }))
            .count()
    }
}

/// Turn a raw response into presentation groups plus move metadata.
///
/// Move indexes are taken from the response as delivered; distances and
/// groups see the section override and forward-filled data.
pub fn build_presentation(
    response: &DiffResponse,
    to_revision: Option<u64>,
    mode: DiffMode,
    overrides: &[SectionOverride],
) -> DiffPresentation {
    let move_indexes = grouped_move_indexes(&response.diff);

    let mut prepared = response.clone();
    apply_section_override(&mut prepared, to_revision, overrides);
    forward_fill(&mut prepared);

    let move_distances = move_distances(&prepared.diff, prepared.section_info.as_deref());
    let groups = group(&prepared.diff, mode);

    log::debug!(
        "grouped {} lines into {} groups ({} mode, {} move ids, {} distances)",
        prepared.diff.len(),
        groups.len(),
        mode.label(),
        move_indexes.len(),
        move_distances.len()
    );

    DiffPresentation {
        mode,
        groups,
        move_indexes,
        move_distances,
        section_info: prepared.section_info.unwrap_or_default(),
    }
}
