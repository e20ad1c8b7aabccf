use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders};

pub(crate) fn panel<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    Block::default().borders(Borders::ALL).title(title)
}

pub(crate) fn keys_panel() -> Block<'static> {
    panel("Keys")
}

pub(crate) fn active_panel<'a>(title: impl Into<Line<'a>>) -> Block<'a> {
    panel(title).border_style(Style::default().fg(Color::Cyan))
}

pub(crate) fn heading_style() -> Style {
    Style::default()
        .fg(Color::Blue)
        .add_modifier(Modifier::BOLD)
}

pub(crate) fn error_style() -> Style {
    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
}

pub(crate) fn muted_style() -> Style {
    Style::default().fg(Color::Gray).add_modifier(Modifier::DIM)
}
