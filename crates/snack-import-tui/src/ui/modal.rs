use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::Clear;

use crate::centered_rect;
use crate::theme;
use crate::ui::text::{hint_height, hint_paragraph, wrapped_paragraph};

/// Draws a bordered box over the middle of the screen with its key hints
/// pinned to the bottom edge.
pub(crate) fn render_overlay(
    frame: &mut Frame<'_>,
    title: Line<'_>,
    body: Text<'_>,
    hint: &str,
    width_pct: u16,
    height_pct: u16,
) {
    let area = centered_rect(width_pct, height_pct, frame.area());
    let [body_area, hint_area] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),
            Constraint::Length(hint_height(area.width, hint)),
        ])
        .areas(area);

    frame.render_widget(Clear, area);
    frame.render_widget(wrapped_paragraph(body).block(theme::panel(title)), body_area);
    frame.render_widget(hint_paragraph(hint).block(theme::keys_panel()), hint_area);
}

pub(crate) fn render_error_modal(frame: &mut Frame<'_>, message: &str, hint: &str) {
    render_overlay(
        frame,
        Line::from(Span::styled("Error", theme::error_style())),
        Text::from(message.trim_end().to_string()),
        hint,
        72,
        40,
    );
}
