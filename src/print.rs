use crate::diff::{DiffLine, DiffPresentation, HighlightKind, PresentationGroup};
use std::fmt::Write;

/// Plain-text rendering of a presentation for pipes and scripts.
/// Added text is wrapped in `{+ +}`, deleted text in `[- -]`.
pub fn format_text(p: &DiffPresentation, line_numbers: bool) -> String {
    let mut out = String::new();

    for group in &p.groups {
        match group {
            PresentationGroup::Context { lines } => {
                let _ = writeln!(out, "── context ({} line{})", lines.len(), plural(lines.len()));
                for line in lines {
                    push_line(&mut out, p, line, line_numbers);
                }
            }
            PresentationGroup::Change { lines, .. } => {
                let _ = writeln!(out, "── change ({} line{})", lines.len(), plural(lines.len()));
                for line in lines {
                    push_line(&mut out, p, line, line_numbers);
                }
            }
            PresentationGroup::UneditedGap { count } => {
                let _ = writeln!(out, "··· {} unedited line{} ···", count, plural(*count));
            }
        }
    }

    out
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn push_line(out: &mut String, p: &DiffPresentation, line: &DiffLine, line_numbers: bool) {
    if line_numbers {
        match line.line_number {
            Some(n) => {
                let _ = write!(out, "{:>5} ", n);
            }
            None => out.push_str("      "),
        }
    }
    out.push_str(line.kind.marker());
    out.push(' ');

    for (text, highlight) in line.segments() {
        match highlight {
            Some(HighlightKind::Add) => {
                let _ = write!(out, "{{+{}+}}", text);
            }
            Some(HighlightKind::Delete) => {
                let _ = write!(out, "[-{}-]", text);
            }
            None => out.push_str(text),
        }
    }

    if let Some(info) = &line.move_info {
        if let Some(badge) = p.move_badge(&info.id) {
            let _ = write!(out, "  [#{}]", badge + 1);
        }
        if let Some(distance) = p.move_distance(&info.id) {
            let _ = write!(out, " {}", distance.label());
        }
    }
    out.push('\n');
}
