use std::time::Duration;

use ratatui::Frame;
use ratatui::text::{Line, Span, Text};

use crate::theme;
use crate::ui::modal::render_overlay;

const FRAMES: [&str; 8] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧"];

#[derive(Debug, Clone, Default)]
pub(crate) struct LoadingState {
    frame_index: usize,
}

impl LoadingState {
    pub(crate) fn next_frame(&mut self) {
        self.frame_index = (self.frame_index + 1) % FRAMES.len();
    }

    fn current_frame(&self) -> &'static str {
        FRAMES[self.frame_index]
    }
}

pub(crate) struct Progress {
    pub(crate) elapsed: Duration,
    pub(crate) timeout: Duration,
}

impl Progress {
    pub(crate) fn label(&self) -> String {
        let elapsed = self.elapsed.min(self.timeout).as_secs();
        format!("{elapsed}s of {}s", self.timeout.as_secs())
    }
}

pub(crate) fn render_loading_modal(
    frame: &mut Frame<'_>,
    title: &str,
    message: &str,
    key_hint: &str,
    loading: &LoadingState,
    progress: Option<Progress>,
) {
    let mut lines = vec![
        Line::from(""),
        Line::from(format!("{} {}", loading.current_frame(), message)),
    ];
    if let Some(progress) = progress {
        lines.push(Line::from(Span::styled(
            progress.label(),
            theme::muted_style(),
        )));
    }

    render_overlay(
        frame,
        Line::from(Span::styled(title, theme::heading_style())),
        Text::from(lines),
        key_hint,
        72,
        42,
    );
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{FRAMES, LoadingState, Progress};

    #[test]
    fn spinner_wraps_after_last_frame() {
        let mut loading = LoadingState::default();
        for _ in 0..FRAMES.len() {
            loading.next_frame();
        }
        assert_eq!(loading.current_frame(), FRAMES[0]);
    }

    #[test]
    fn progress_label_caps_at_timeout() {
        let progress = Progress {
            elapsed: Duration::from_secs(50),
            timeout: Duration::from_secs(45),
        };
        assert_eq!(progress.label(), "45s of 45s");
    }
}
