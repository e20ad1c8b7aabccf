mod import_flow;
mod keymap;
mod theme;
mod ui;

use std::io::{Stdout, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use import_flow::{FlowSignal, ImportScreen};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Flex, Layout, Rect};
use snack_import_app::App;
use snack_import_core::config::EffectiveConfig;
use snack_import_core::navigation::RedirectSlot;

use crate::ui::modal::render_error_modal;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiExit {
    /// The import succeeded; `redirect` is where the new project lives.
    Imported { redirect: String },
    Dismissed,
    Canceled,
}

pub(crate) struct TerminalSession {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalSession {
    pub(crate) fn enter() -> Result<Self> {
        let mut screen = CrosstermScreen;
        prepare_screen(&mut screen)?;

        match Terminal::new(CrosstermBackend::new(stdout())) {
            Ok(terminal) => Ok(Self { terminal }),
            Err(error) => Err(restore_after_failure(
                &mut screen,
                anyhow!(error).context("failed to create terminal backend"),
                true,
            )),
        }
    }

    pub(crate) fn draw<F>(&mut self, draw_fn: F) -> Result<()>
    where
        F: FnOnce(&mut ratatui::Frame<'_>),
    {
        self.terminal
            .draw(draw_fn)
            .context("failed to render terminal")?;
        Ok(())
    }

    pub(crate) fn autoresize(&mut self) -> Result<()> {
        self.terminal
            .autoresize()
            .context("failed to autoresize terminal")?;
        Ok(())
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        let _ = execute!(self.terminal.backend_mut(), Show, LeaveAlternateScreen);
        let _ = disable_raw_mode();
    }
}

/// The four terminal mode switches, split out so the rollback order can be
/// checked without a real tty.
trait ScreenModes {
    fn enable_raw(&mut self) -> Result<()>;
    fn enter_alternate(&mut self) -> Result<()>;
    fn leave_alternate(&mut self) -> Result<()>;
    fn disable_raw(&mut self) -> Result<()>;
}

struct CrosstermScreen;

impl ScreenModes for CrosstermScreen {
    fn enable_raw(&mut self) -> Result<()> {
        enable_raw_mode().context("failed to enable raw mode")
    }

    fn enter_alternate(&mut self) -> Result<()> {
        let mut out = stdout();
        execute!(out, EnterAlternateScreen, Hide).context("failed to enter alternate screen")
    }

    fn leave_alternate(&mut self) -> Result<()> {
        let mut out = stdout();
        execute!(out, Show, LeaveAlternateScreen)
            .context("failed to leave alternate screen during rollback")
    }

    fn disable_raw(&mut self) -> Result<()> {
        disable_raw_mode().context("failed to disable raw mode during rollback")
    }
}

fn prepare_screen(screen: &mut impl ScreenModes) -> Result<()> {
    screen.enable_raw()?;
    if let Err(error) = screen.enter_alternate() {
        return Err(restore_after_failure(screen, error, false));
    }
    Ok(())
}

/// Undoes whatever setup already happened and folds any cleanup failure into
/// the original error.
fn restore_after_failure(
    screen: &mut impl ScreenModes,
    error: anyhow::Error,
    alternate_entered: bool,
) -> anyhow::Error {
    let mut cleanup = Vec::new();
    if alternate_entered && let Err(leave) = screen.leave_alternate() {
        cleanup.push(format!("{leave:#}"));
    }
    if let Err(disable) = screen.disable_raw() {
        cleanup.push(format!("{disable:#}"));
    }

    if cleanup.is_empty() {
        error
    } else {
        anyhow!("{error:#}\nterminal cleanup also failed: {}", cleanup.join("; "))
    }
}

pub(crate) fn is_ctrl_c(key: KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c')
}

/// Runs the import form until the user imports, dismisses, or cancels.
pub fn run_import(
    app: &App,
    config: &EffectiveConfig,
    initial_url: Option<&str>,
) -> Result<UiExit> {
    let redirects = Arc::new(RedirectSlot::new(config.website_url.clone()));
    let session = app.open_session(config, redirects.clone());
    let mut screen = ImportScreen::new(session, initial_url);

    let mut terminal = TerminalSession::enter()?;
    let mut global_error: Option<String> = None;
    const TICK_RATE: Duration = Duration::from_millis(120);

    let exit = loop {
        terminal.draw(|frame| {
            screen.render(frame);
            if let Some(message) = global_error.as_deref() {
                render_error_modal(frame, message, "Enter/Esc: continue");
            }
        })?;

        let has_event = event::poll(TICK_RATE).context("failed to poll terminal event")?;
        if !has_event {
            if let FlowSignal::Exit(exit) = screen.on_tick() {
                break exit;
            }
            continue;
        }

        let key = match event::read().context("failed to read terminal event")? {
            Event::Resize(_, _) => {
                terminal.autoresize()?;
                continue;
            }
            Event::Key(key) if matches!(key.kind, KeyEventKind::Press) => key,
            _ => continue,
        };

        if is_ctrl_c(key) {
            screen.close();
            break UiExit::Canceled;
        }

        if global_error.is_some() {
            if keymap::is_confirm(key) || keymap::is_back(key) {
                global_error = None;
            }
            continue;
        }

        match screen.on_key(key) {
            Ok(FlowSignal::Exit(exit)) => break exit,
            Ok(FlowSignal::Continue) => {}
            Err(error) => global_error = Some(format!("{error:#}")),
        }

        if let FlowSignal::Exit(exit) = screen.on_tick() {
            break exit;
        }
    };

    drop(terminal);

    Ok(match exit {
        UiExit::Imported { redirect } => UiExit::Imported {
            redirect: redirects.take().unwrap_or(redirect),
        },
        other => other,
    })
}

pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let [row] = Layout::vertical([Constraint::Percentage(percent_y.min(100))])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Percentage(percent_x.min(100))])
        .flex(Flex::Center)
        .areas(row);
    cell
}
