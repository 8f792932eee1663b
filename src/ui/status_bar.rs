use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;
use super::styles;

/// Render the top bar: file · mode · revision, counts on the right
pub fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let panel_bg = Style::default().bg(styles::PANEL);
    let presentation = &app.presentation;

    let mut spans: Vec<Span> = vec![
        Span::styled(
            format!(" {}", app.title()),
            Style::default()
                .fg(styles::CYAN)
                .add_modifier(ratatui::style::Modifier::BOLD),
        ),
        Span::styled(" · ", Style::default().fg(styles::BORDER)),
        Span::styled(format!(" {} ", app.mode().label()), styles::mode_style()),
    ];
    if let Some(rev) = app.to_revision {
        spans.push(Span::styled(format!("  rev {}", rev), Style::default().fg(styles::GREEN)));
    }

    let pairs = presentation.move_pair_count();
    let counts = format!(
        "{} change group{} · {} move{}{} ",
        presentation.change_group_count(),
        if presentation.change_group_count() == 1 { "" } else { "s" },
        pairs,
        if pairs == 1 { "" } else { "s" },
        if app.watching { " · watching" } else { "" },
    );

    let left_width: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let pad = (area.width as usize).saturating_sub(left_width + counts.chars().count());
    spans.push(Span::raw(" ".repeat(pad)));
    spans.push(Span::styled(counts, Style::default().fg(styles::DIM)));

    f.render_widget(Paragraph::new(Line::from(spans)).style(panel_bg), area);
}

/// Render the bottom bar: notification if present, otherwise key hints
pub fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let panel_bg = Style::default().bg(styles::PANEL);

    let line = match &app.watch_message {
        Some(msg) => Line::from(vec![
            Span::styled(" ● ", Style::default().fg(styles::GREEN)),
            Span::styled(msg.clone(), Style::default().fg(styles::TEXT)),
        ]),
        None => {
            let hints = [
                ("j/k", "groups"),
                ("n", "next change"),
                ("enter", "fold"),
                ("m", "mode"),
                ("r", "reload"),
                ("w", "watch"),
                ("q", "quit"),
            ];
            let mut spans = vec![Span::raw(" ")];
            for (key, action) in hints {
                spans.push(Span::styled(key, styles::key_hint_style()));
                spans.push(Span::styled(format!(" {}  ", action), Style::default().fg(styles::DIM)));
            }
            Line::from(spans)
        }
    };

    f.render_widget(Paragraph::new(line).style(panel_bg), area);
}
