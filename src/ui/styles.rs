use ratatui::style::{Color, Modifier, Style};

// ── Surfaces ──
pub const BG: Color = Color::Rgb(16, 17, 20);
pub const PANEL: Color = Color::Rgb(30, 32, 38);
pub const BORDER: Color = Color::Rgb(52, 55, 64);
pub const SELECTED_BG: Color = Color::Rgb(34, 48, 66);
const SECTION_BG: Color = Color::Rgb(36, 30, 58);

// ── Text ──
pub const TEXT: Color = Color::Rgb(210, 212, 218);
pub const DIM: Color = Color::Rgb(96, 100, 110);
pub const MUTED: Color = Color::Rgb(140, 144, 154);
pub const BRIGHT: Color = Color::Rgb(240, 240, 244);

// ── Accents ──
pub const CYAN: Color = Color::Rgb(80, 200, 230);
pub const GREEN: Color = Color::Rgb(100, 210, 140);
const ORANGE: Color = Color::Rgb(245, 160, 80);
const VIOLET: Color = Color::Rgb(180, 150, 250);
const SKY: Color = Color::Rgb(110, 170, 245);
const PINK: Color = Color::Rgb(240, 130, 190);

// ── Inline edits ──
const INSERTED_FG: Color = Color::Rgb(150, 235, 175);
const INSERTED_BG: Color = Color::Rgb(22, 66, 44);
const REMOVED_FG: Color = Color::Rgb(250, 150, 150);
const REMOVED_BG: Color = Color::Rgb(74, 24, 30);

/// Badge colors for move pairs, cycled by move index
const MOVE_COLORS: [Color; 6] = [SKY, VIOLET, CYAN, ORANGE, GREEN, PINK];

pub fn move_color(index: usize) -> Color {
    MOVE_COLORS[index % MOVE_COLORS.len()]
}

pub fn default_style() -> Style {
    Style::default().fg(TEXT).bg(BG)
}

pub fn dim_style() -> Style {
    Style::default().fg(DIM)
}

pub fn add_style() -> Style {
    Style::default().fg(INSERTED_FG).bg(INSERTED_BG)
}

pub fn del_style() -> Style {
    Style::default()
        .fg(REMOVED_FG)
        .bg(REMOVED_BG)
        .add_modifier(Modifier::CROSSED_OUT)
}

/// Change-group header (section title or first line number)
pub fn group_header_style() -> Style {
    Style::default().fg(VIOLET).bg(SECTION_BG)
}

pub fn move_badge_style(index: usize) -> Style {
    Style::default()
        .fg(BG)
        .bg(move_color(index))
        .add_modifier(Modifier::BOLD)
}

pub fn key_hint_style() -> Style {
    Style::default().fg(MUTED).add_modifier(Modifier::BOLD)
}

pub fn mode_style() -> Style {
    Style::default()
        .fg(BG)
        .bg(SKY)
        .add_modifier(Modifier::BOLD)
}
