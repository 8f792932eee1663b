use super::model::{DiffKind, DiffLine};
use serde::{Deserialize, Serialize};

/// Presentation mode for a diff
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffMode {
    /// One revision's changes, grouped per section
    Single,
    /// Two revisions side by side, with context and gaps
    Compare,
}

impl DiffMode {
    pub fn label(&self) -> &'static str {
        match self {
            DiffMode::Single => "SINGLE",
            DiffMode::Compare => "COMPARE",
        }
    }

    pub fn toggle(&self) -> DiffMode {
        match self {
            DiffMode::Single => DiffMode::Compare,
            DiffMode::Compare => DiffMode::Single,
        }
    }
}

/// One block of the rendered diff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "group", rename_all = "snake_case")]
pub enum PresentationGroup {
    /// Run of unchanged lines (compare mode only)
    Context { lines: Vec<DiffLine> },
    /// Run of changed or moved lines
    Change { lines: Vec<DiffLine>, mode: DiffMode },
    /// Placeholder for `count` unedited lines between two shown line numbers
    UneditedGap { count: usize },
}

impl PresentationGroup {
    #[allow(dead_code)]
    pub fn lines(&self) -> &[DiffLine] {
        match self {
            PresentationGroup::Context { lines } => lines,
            PresentationGroup::Change { lines, .. } => lines,
            PresentationGroup::UneditedGap { .. } => &[],
        }
    }
}

pub fn group(lines: &[DiffLine], mode: DiffMode) -> Vec<PresentationGroup> {
    match mode {
        DiffMode::Single => group_single(lines),
        DiffMode::Compare => group_compare(lines),
    }
}

/// Drop context lines and split the rest wherever the section index changes
/// between consecutive non-context lines.
pub fn group_single(lines: &[DiffLine]) -> Vec<PresentationGroup> {
    let mut result = Vec::new();
    let mut run: Vec<DiffLine> = Vec::new();
    let mut last_section: Option<usize> = None;

    for line in lines.iter().filter(|l| l.kind != DiffKind::Context) {
        if line.section_info_index != last_section && !run.is_empty() {
            result.push(PresentationGroup::Change {
                lines: std::mem::take(&mut run),
                mode: DiffMode::Single,
            });
        }
        run.push(line.clone());
        last_section = line.section_info_index;
    }

    if !run.is_empty() {
        result.push(PresentationGroup::Change {
            lines: run,
            mode: DiffMode::Single,
        });
    }

    result
}

/// Interleave context runs, change runs and unedited gaps in input order.
///
/// A jump of more than one line number between consecutive lines closes
/// both open runs (context first) and emits a gap. Switching between
/// context and non-context closes the other kind's run.
pub fn group_compare(lines: &[DiffLine]) -> Vec<PresentationGroup> {
    let mut grouper = CompareGrouper::default();
    for line in lines {
        grouper.push(line);
    }
    grouper.finish()
}

#[derive(Default)]
struct CompareGrouper {
    result: Vec<PresentationGroup>,
    context: Vec<DiffLine>,
    change: Vec<DiffLine>,
    last_line_number: Option<usize>,
}

impl CompareGrouper {
    fn push(&mut self, line: &DiffLine) {
        if let (Some(prev), Some(cur)) = (self.last_line_number, line.line_number) {
            if cur.saturating_sub(prev) > 1 {
                self.flush_context();
                self.flush_change();
                self.result.push(PresentationGroup::UneditedGap { count: cur - prev });
            }
        }

        if line.kind == DiffKind::Context {
            self.flush_change();
            self.context.push(line.clone());
        } else {
            self.flush_context();
            self.change.push(line.clone());
        }

        self.last_line_number = line.line_number;
    }

    fn flush_context(&mut self) {
        if !self.context.is_empty() {
            self.result.push(PresentationGroup::Context {
                lines: std::mem::take(&mut self.context),
            });
        }
    }

    fn flush_change(&mut self) {
        if !self.change.is_empty() {
            self.result.push(PresentationGroup::Change {
                lines: std::mem::take(&mut self.change),
                mode: DiffMode::Compare,
            });
        }
    }

    fn finish(mut self) -> Vec<PresentationGroup> {
        self.flush_context();
        self.flush_change();
        self.result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(n: Option<usize>, kind: DiffKind, section: Option<usize>) -> DiffLine {
        DiffLine {
            line_number: n,
            kind,
            text: format!("line {:?}", n),
            highlight_ranges: Vec::new(),
            move_info: None,
            section_info_index: section,
        }
    }

    fn ctx(n: usize) -> DiffLine {
        line(Some(n), DiffKind::Context, None)
    }

    fn chg(n: usize) -> DiffLine {
        line(Some(n), DiffKind::Change, None)
    }

    fn numbers(group: &PresentationGroup) -> Vec<Option<usize>> {
        group.lines().iter().map(|l| l.line_number).collect()
    }

    // ── Compare ──

    #[test]
    fn compare_inserts_gap_where_numbers_jump() {
        let groups = group_compare(&[ctx(1), ctx(2), chg(5), chg(6)]);
        assert_eq!(groups.len(), 3);
        assert!(matches!(groups[0], PresentationGroup::Context { .. }));
        assert_eq!(numbers(&groups[0]), vec![Some(1), Some(2)]);
        assert_eq!(groups[1], PresentationGroup::UneditedGap { count: 3 });
        assert!(matches!(
            groups[2],
            PresentationGroup::Change { mode: DiffMode::Compare, .. }
        ));
        assert_eq!(numbers(&groups[2]), vec![Some(5), Some(6)]);
    }

    #[test]
    fn compare_kind_switch_closes_other_run() {
        let groups = group_compare(&[ctx(1), chg(2), chg(3), ctx(4), chg(5)]);
        let shapes: Vec<Vec<Option<usize>>> = groups.iter().map(numbers).collect();
        assert_eq!(
            shapes,
            vec![
                vec![Some(1)],
                vec![Some(2), Some(3)],
                vec![Some(4)],
                vec![Some(5)],
            ]
        );
    }

    #[test]
    fn compare_same_kind_after_gap_starts_new_group() {
        let groups = group_compare(&[chg(1), chg(2), chg(10), chg(11)]);
        assert_eq!(groups.len(), 3);
        assert_eq!(numbers(&groups[0]), vec![Some(1), Some(2)]);
        assert_eq!(groups[1], PresentationGroup::UneditedGap { count: 8 });
        assert_eq!(numbers(&groups[2]), vec![Some(10), Some(11)]);
    }

    #[test]
    fn compare_missing_numbers_never_create_gaps() {
        let groups = group_compare(&[
            chg(1),
            line(None, DiffKind::Change, None),
            chg(9),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].lines().len(), 3);
    }

    #[test]
    fn compare_keeps_every_line_in_order() {
        let input = vec![ctx(1), chg(2), ctx(3), ctx(7), chg(8), chg(20), ctx(21)];
        let groups = group_compare(&input);
        let flat: Vec<DiffLine> = groups.iter().flat_map(|g| g.lines().to_vec()).collect();
        assert_eq!(flat, input);
        let gaps: Vec<usize> = groups
            .iter()
            .filter_map(|g| match g {
                PresentationGroup::UneditedGap { count } => Some(*count),
                _ => None,
            })
            .collect();
        assert_eq!(gaps, vec![4, 12]);
    }

    #[test]
    fn compare_extreme_line_numbers_do_not_overflow() {
        let groups = group_compare(&[chg(usize::MAX), chg(1)]);
        assert_eq!(groups.len(), 1);
        assert_eq!(numbers(&groups[0]), vec![Some(usize::MAX), Some(1)]);

        let groups = group_compare(&[chg(1), chg(usize::MAX)]);
        assert_eq!(groups[1], PresentationGroup::UneditedGap { count: usize::MAX - 1 });
    }

    #[test]
    fn compare_flushes_context_before_change_at_end() {
        // Only one run can be open at the end, but order must still be input order
        let groups = group_compare(&[chg(1), ctx(2)]);
        assert!(matches!(groups[0], PresentationGroup::Change { .. }));
        assert!(matches!(groups[1], PresentationGroup::Context { .. }));
    }

    // ── Single ──

    #[test]
    fn single_drops_context_and_merges_same_section() {
        let groups = group_single(&[
            line(Some(1), DiffKind::Change, Some(0)),
            line(Some(2), DiffKind::Context, Some(0)),
            line(Some(3), DiffKind::Change, Some(0)),
            line(Some(4), DiffKind::Change, Some(1)),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(numbers(&groups[0]), vec![Some(1), Some(3)]);
        assert_eq!(numbers(&groups[1]), vec![Some(4)]);
        assert!(groups
            .iter()
            .all(|g| matches!(g, PresentationGroup::Change { mode: DiffMode::Single, .. })));
    }

    #[test]
    fn single_section_boundaries_include_none() {
        let groups = group_single(&[
            line(Some(1), DiffKind::Change, None),
            line(Some(2), DiffKind::Change, None),
            line(Some(3), DiffKind::MoveSource, Some(2)),
            line(Some(4), DiffKind::MoveDestination, None),
        ]);
        let shapes: Vec<Vec<Option<usize>>> = groups.iter().map(numbers).collect();
        assert_eq!(
            shapes,
            vec![vec![Some(1), Some(2)], vec![Some(3)], vec![Some(4)]]
        );
    }

    #[test]
    fn single_only_context_yields_nothing() {
        assert!(group_single(&[ctx(1), ctx(2)]).is_empty());
    }

    // ── Both ──

    #[test]
    fn empty_input_yields_no_groups() {
        assert!(group(&[], DiffMode::Single).is_empty());
        assert!(group(&[], DiffMode::Compare).is_empty());
    }

    #[test]
    fn grouping_is_repeatable() {
        let input = vec![ctx(1), chg(4), line(Some(5), DiffKind::Change, Some(1))];
        for mode in [DiffMode::Single, DiffMode::Compare] {
            assert_eq!(group(&input, mode), group(&input, mode));
        }
    }

    #[test]
    fn mode_toggle_round_trips() {
        assert_eq!(DiffMode::Single.toggle(), DiffMode::Compare);
        assert_eq!(DiffMode::Compare.toggle().toggle(), DiffMode::Compare);
    }
}
