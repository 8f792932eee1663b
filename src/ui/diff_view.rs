use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Padding, Paragraph, Wrap},
    Frame,
};

use crate::app::App;
use crate::diff::{DiffKind, DiffLine, DiffMode, HighlightKind, PresentationGroup};
use super::styles;
use super::utils::{expand_tabs, truncate};

/// Rows kept above the selected group when scrolling
const SCROLL_MARGIN: usize = 2;

/// Render the grouped diff
pub fn render(f: &mut Frame, area: Rect, app: &App) {
    if app.groups().is_empty() {
        render_empty(f, area);
        return;
    }

    let (lines, selected_row) = build_lines(app);
    let scroll = selected_row.saturating_sub(SCROLL_MARGIN) as u16;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(styles::BORDER))
        .title(format!(" {} ", app.title()))
        .padding(Padding::horizontal(1))
        .style(styles::default_style());

    let mut paragraph = Paragraph::new(lines).block(block).scroll((scroll, 0));
    // With wrapping on, rows can span several screen lines and the scroll offset is approximate
    if app.config.display.wrap_lines {
        paragraph = paragraph.wrap(Wrap { trim: false });
    }
    f.render_widget(paragraph, area);
}

/// Build every row of the view. Returns the rows and the index of the
/// selected group's first row.
pub(crate) fn build_lines(app: &App) -> (Vec<Line<'static>>, usize) {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut selected_row = 0;

    for (idx, group) in app.groups().iter().enumerate() {
        let is_selected = idx == app.selected;
        if is_selected {
            selected_row = lines.len();
        }
        let marker = if is_selected { "▶" } else { " " };

        match group {
            PresentationGroup::Context { lines: context } => {
                let expanded = app.is_context_expanded(idx);
                let fold = if expanded { "▾" } else { "▸" };
                lines.push(header_line(
                    marker,
                    format!(
                        "{} {} context line{}",
                        fold,
                        context.len(),
                        if context.len() == 1 { "" } else { "s" }
                    ),
                    is_selected,
                    Style::default().fg(styles::MUTED),
                ));
                if expanded {
                    for line in context {
                        lines.push(diff_line(app, line));
                    }
                }
            }
            PresentationGroup::Change { lines: changed, mode } => {
                let title = change_header(app, changed, *mode);
                lines.push(header_line(marker, title, is_selected, styles::group_header_style()));
                for line in changed {
                    lines.push(diff_line(app, line));
                }
            }
            PresentationGroup::UneditedGap { count } => {
                lines.push(header_line(
                    marker,
                    format!("··· {} unedited line{} ···", count, if *count == 1 { "" } else { "s" }),
                    is_selected,
                    styles::dim_style(),
                ));
            }
        }
    }

    (lines, selected_row)
}

/// Section title in single mode, starting line in compare mode
fn change_header(app: &App, lines: &[DiffLine], mode: DiffMode) -> String {
    let first = lines.first();
    match mode {
        DiffMode::Single => {
            let section = first
                .and_then(|l| l.section_info_index)
                .and_then(|i| app.presentation.section_info.get(i));
            match section {
                Some(s) => truncate(s.display_title(), 60),
                None => "Intro".to_string(),
            }
        }
        DiffMode::Compare => match first.and_then(|l| l.line_number) {
            Some(n) => format!("Line {}", n),
            None => "Line ?".to_string(),
        },
    }
}

fn header_line(marker: &str, text: String, is_selected: bool, style: Style) -> Line<'static> {
    let marker_style = if is_selected {
        Style::default().fg(styles::CYAN).bg(styles::SELECTED_BG)
    } else {
        Style::default().fg(styles::DIM)
    };
    let text_style = if is_selected {
        style.bg(styles::SELECTED_BG).add_modifier(Modifier::BOLD)
    } else {
        style
    };
    Line::from(vec![
        Span::styled(format!("{} ", marker), marker_style),
        Span::styled(text, text_style),
    ])
}

fn diff_line(app: &App, line: &DiffLine) -> Line<'static> {
    let display = &app.config.display;
    let base_style = match line.kind {
        DiffKind::Context => Style::default().fg(styles::MUTED),
        DiffKind::Change => Style::default().fg(styles::TEXT),
        DiffKind::MoveSource | DiffKind::MoveDestination => Style::default().fg(styles::BRIGHT),
    };

    let mut spans = Vec::new();
    if display.line_numbers {
        let num = line
            .line_number
            .map(|n| format!("{:>5}", n))
            .unwrap_or_else(|| "     ".to_string());
        spans.push(Span::styled(format!("{} │", num), styles::dim_style()));
    }

    // Move lines carry a colored marker matching their pair's badge
    let badge = line
        .move_info
        .as_ref()
        .and_then(|m| app.presentation.move_badge(&m.id));
    let marker_style = match badge {
        Some(i) => Style::default().fg(styles::move_color(i)).add_modifier(Modifier::BOLD),
        None => styles::dim_style(),
    };
    spans.push(Span::styled(format!("{} ", line.kind.marker()), marker_style));

    for (text, highlight) in line.segments() {
        let style = match highlight {
            Some(HighlightKind::Add) => styles::add_style(),
            Some(HighlightKind::Delete) => styles::del_style(),
            None => base_style,
        };
        spans.push(Span::styled(expand_tabs(text, display.tab_width), style));
    }

    if let (Some(info), Some(i)) = (&line.move_info, badge) {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(format!(" #{} ", i + 1), styles::move_badge_style(i)));
        if let Some(distance) = app.presentation.move_distance(&info.id) {
            spans.push(Span::styled(format!(" {}", distance.label()), styles::dim_style()));
        }
    }

    Line::from(spans)
}

fn render_empty(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::NONE)
        .style(Style::default().bg(styles::BG));

    let text = Paragraph::new(vec![
        Line::from(""),
        Line::from(""),
        Line::from(Span::styled(
            "  No changes in this diff",
            Style::default().fg(styles::MUTED),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "  Switch modes with [m]",
            Style::default().fg(styles::DIM),
        )),
    ])
    .block(block);

    f.render_widget(text, area);
}
