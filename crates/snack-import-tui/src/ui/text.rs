use ratatui::layout::Alignment;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

use crate::theme;

pub(crate) fn wrapped_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    Paragraph::new(text).wrap(Wrap { trim: false })
}

pub(crate) fn hint_paragraph<'a, T>(text: T) -> Paragraph<'a>
where
    T: Into<Text<'a>>,
{
    wrapped_paragraph(text).alignment(Alignment::Center)
}

/// Height of a bordered hint bar that shows `hint` without clipping.
pub(crate) fn hint_height(width: u16, hint: &str) -> u16 {
    let inner = usize::from(width.saturating_sub(2)).max(1);
    let rows: usize = hint
        .split('\n')
        .map(|line| line.chars().count().div_ceil(inner).max(1))
        .sum();
    u16::try_from(rows).unwrap_or(u16::MAX).saturating_add(2)
}

/// Key hints in decreasing length: `[wide, medium, narrow]`.
pub(crate) fn pick_hint(width: u16, variants: [&'static str; 3]) -> &'static str {
    let [wide, medium, narrow] = variants;
    match width {
        110.. => wide,
        78..=109 => medium,
        _ => narrow,
    }
}

pub(crate) fn heading(message: impl Into<String>) -> Line<'static> {
    Line::from(Span::styled(message.into(), theme::heading_style()))
}

pub(crate) fn field_line(label: &str, value: impl Into<String>) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label}: "), theme::muted_style()),
        Span::raw(value.into()),
    ])
}
