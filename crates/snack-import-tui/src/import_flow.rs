use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, KeyEvent};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::text::{Line, Span, Text};
use snack_import_app::ImportSession;
use snack_import_core::workflow::{
    Effect, ImportWorkflow, SubmitError, WorkflowEvent, WorkflowStatus,
};
use tui_input::Input;
use tui_input::backend::crossterm::EventHandler;

use crate::ui::field::render_input;
use crate::ui::loading::{LoadingState, Progress, render_loading_modal};
use crate::ui::text::{
    field_line, heading, hint_height, hint_paragraph, pick_hint, wrapped_paragraph,
};
use crate::{UiExit, keymap, theme};

const IMPORT_FAILED: &str = "Import failed. Make sure the repository is public and the URL is correct, then press Enter to retry.";

pub(crate) trait ImportFlowOps {
    fn dispatch(&mut self, event: WorkflowEvent) -> Result<Vec<Effect>, SubmitError>;
    fn poll(&mut self) -> Vec<Effect>;
    fn workflow(&self) -> &ImportWorkflow;
    fn elapsed(&self) -> Option<Duration>;
}

impl ImportFlowOps for ImportSession {
    fn dispatch(&mut self, event: WorkflowEvent) -> Result<Vec<Effect>, SubmitError> {
        ImportSession::dispatch(self, event)
    }

    fn poll(&mut self) -> Vec<Effect> {
        ImportSession::poll(self)
    }

    fn workflow(&self) -> &ImportWorkflow {
        ImportSession::workflow(self)
    }

    fn elapsed(&self) -> Option<Duration> {
        ImportSession::elapsed(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FlowSignal {
    Continue,
    Exit(UiExit),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Url,
    Repo,
    Subpath,
    Branch,
}

const ADVANCED_FIELDS: [Field; 3] = [Field::Repo, Field::Subpath, Field::Branch];

pub(crate) struct ImportScreen<O: ImportFlowOps> {
    ops: O,
    focus: Field,
    url_input: Input,
    repo_input: Input,
    subpath_input: Input,
    branch_input: Input,
    notice: Option<String>,
    loading: LoadingState,
}

impl<O: ImportFlowOps> ImportScreen<O> {
    pub(crate) fn new(mut ops: O, initial_url: Option<&str>) -> Self {
        let notice = ops
            .dispatch(WorkflowEvent::Show)
            .err()
            .map(|error| error.to_string());

        let mut screen = Self {
            ops,
            focus: Field::Url,
            url_input: Input::default(),
            repo_input: Input::default(),
            subpath_input: Input::default(),
            branch_input: Input::default(),
            notice,
            loading: LoadingState::default(),
        };

        if let Some(url) = initial_url {
            screen.url_input = Input::new(url.to_string());
            if let Err(error) = screen.edit(Field::Url) {
                screen.notice = Some(error.to_string());
            }
        }

        screen
    }

    /// Hides the form, abandoning any in-flight import.
    pub(crate) fn close(&mut self) {
        if let Err(error) = self.ops.dispatch(WorkflowEvent::Hide) {
            self.notice = Some(error.to_string());
        }
    }

    fn status(&self) -> WorkflowStatus {
        self.ops.workflow().status()
    }

    fn advanced(&self) -> bool {
        self.ops.workflow().fields().advanced
    }

    pub(crate) fn on_key(&mut self, key: KeyEvent) -> Result<FlowSignal> {
        if keymap::is_back(key) {
            return self.dismiss();
        }

        if self.status() == WorkflowStatus::Importing {
            return Ok(FlowSignal::Continue);
        }

        if keymap::is_toggle_advanced(key) {
            self.toggle_advanced()?;
            return Ok(FlowSignal::Continue);
        }

        if keymap::is_confirm(key) {
            self.submit();
            return Ok(FlowSignal::Continue);
        }

        if self.advanced() {
            if keymap::is_next_field(key) {
                self.focus = cycle(self.focus, 1);
                return Ok(FlowSignal::Continue);
            }
            if keymap::is_previous_field(key) {
                self.focus = cycle(self.focus, ADVANCED_FIELDS.len() - 1);
                return Ok(FlowSignal::Continue);
            }
        }

        let focus = self.focus;
        if self.input_mut(focus).handle_event(&Event::Key(key)).is_some() {
            self.edit(focus)?;
        }

        Ok(FlowSignal::Continue)
    }

    pub(crate) fn on_tick(&mut self) -> FlowSignal {
        self.loading.next_frame();

        for effect in self.ops.poll() {
            match effect {
                Effect::Navigate { path } => {
                    return FlowSignal::Exit(UiExit::Imported { redirect: path });
                }
                Effect::Hide => return FlowSignal::Exit(UiExit::Dismissed),
                _ => {}
            }
        }

        FlowSignal::Continue
    }

    fn dismiss(&mut self) -> Result<FlowSignal> {
        let effects = self.ops.dispatch(WorkflowEvent::Dismiss)?;
        if effects.contains(&Effect::Hide) {
            return Ok(FlowSignal::Exit(UiExit::Dismissed));
        }
        Ok(FlowSignal::Continue)
    }

    fn submit(&mut self) {
        self.notice = match self.ops.dispatch(WorkflowEvent::Submit) {
            Ok(_) => None,
            Err(error) => Some(error.to_string()),
        };
    }

    fn toggle_advanced(&mut self) -> Result<()> {
        self.ops.dispatch(WorkflowEvent::ToggleAdvanced)?;
        self.notice = None;
        if self.advanced() {
            self.sync_derived_inputs();
            self.focus = Field::Repo;
        } else {
            self.focus = Field::Url;
        }
        Ok(())
    }

    fn edit(&mut self, field: Field) -> Result<()> {
        let value = self.input_mut(field).value().to_string();
        let event = match field {
            Field::Url => WorkflowEvent::EditUrl(value),
            Field::Repo => WorkflowEvent::EditRepo(value),
            Field::Subpath => WorkflowEvent::EditSubpath(value),
            Field::Branch => WorkflowEvent::EditBranch(value),
        };
        self.ops.dispatch(event)?;
        self.notice = None;

        if field == Field::Url {
            self.sync_derived_inputs();
        }
        Ok(())
    }

    fn sync_derived_inputs(&mut self) {
        let fields = self.ops.workflow().fields();
        self.repo_input = Input::new(fields.repo.clone());
        self.subpath_input = Input::new(fields.subpath.clone());
        self.branch_input = Input::new(fields.branch.clone());
    }

    fn input_mut(&mut self, field: Field) -> &mut Input {
        match field {
            Field::Url => &mut self.url_input,
            Field::Repo => &mut self.repo_input,
            Field::Subpath => &mut self.subpath_input,
            Field::Branch => &mut self.branch_input,
        }
    }

    pub(crate) fn render(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let key_text = self.key_hint(area.width);
        let footer_height = hint_height(area.width, key_text);
        let [header, form, status, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(9),
                Constraint::Length(4),
                Constraint::Length(footer_height),
            ])
            .areas(area);

        let subtitle = if self.advanced() {
            "Advanced: enter the repository, subfolder and branch separately"
        } else {
            "Paste a GitHub or GitLab URL (tree/blob links keep their branch and folder)"
        };
        let header_text = Text::from(vec![
            heading("Import git repository"),
            Line::from(Span::styled(subtitle, theme::muted_style())),
        ]);
        frame.render_widget(
            wrapped_paragraph(header_text).block(theme::panel("snack-import")),
            header,
        );

        let editable = self.status() != WorkflowStatus::Importing;
        if self.advanced() {
            self.render_advanced_form(frame, form, editable);
        } else {
            self.render_simple_form(frame, form, editable);
        }

        frame.render_widget(
            wrapped_paragraph(self.status_text()).block(theme::panel("Status")),
            status,
        );
        frame.render_widget(
            hint_paragraph(key_text).block(theme::keys_panel()),
            footer,
        );

        if self.status() == WorkflowStatus::Importing {
            let progress = self.ops.elapsed().map(|elapsed| Progress {
                elapsed,
                timeout: self.ops.workflow().settings().timeout,
            });
            render_loading_modal(
                frame,
                "Importing",
                "Importing repository...",
                "Esc: cancel",
                &self.loading,
                progress,
            );
        }
    }

    fn render_simple_form(&self, frame: &mut Frame<'_>, area: Rect, editable: bool) {
        let [input, preview] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(3)])
            .areas(area);

        render_input(
            frame,
            input,
            &self.url_input,
            Line::from("Repository URL"),
            editable,
        );

        let fields = self.ops.workflow().fields();
        let lines = vec![
            field_line("Repository", or_placeholder(&fields.repo, "(incomplete)")),
            field_line("Folder", or_placeholder(&fields.subpath, "(repository root)")),
            field_line("Branch", or_placeholder(&fields.branch, "(default branch)")),
        ];
        frame.render_widget(
            wrapped_paragraph(Text::from(lines)).block(theme::panel("Will import")),
            preview,
        );
    }

    fn render_advanced_form(&self, frame: &mut Frame<'_>, area: Rect, editable: bool) {
        let [repo, subpath, branch] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Length(3),
                Constraint::Length(3),
            ])
            .areas(area);

        for (field, rect, title, input) in [
            (Field::Repo, repo, "Repository URL", &self.repo_input),
            (Field::Subpath, subpath, "Folder (optional)", &self.subpath_input),
            (Field::Branch, branch, "Branch (optional)", &self.branch_input),
        ] {
            render_input(
                frame,
                rect,
                input,
                Line::from(title),
                editable && self.focus == field,
            );
        }
    }

    fn status_text(&self) -> Text<'static> {
        if let Some(notice) = &self.notice {
            return Text::from(Line::from(Span::styled(
                notice.clone(),
                theme::error_style(),
            )));
        }

        match self.status() {
            WorkflowStatus::Error => Text::from(Line::from(Span::styled(
                IMPORT_FAILED,
                theme::error_style(),
            ))),
            WorkflowStatus::Importing => Text::from("Importing..."),
            WorkflowStatus::Idle => Text::from(Line::from(Span::styled(
                "Press Enter to import.",
                theme::muted_style(),
            ))),
        }
    }

    fn key_hint(&self, width: u16) -> &'static str {
        if self.advanced() {
            pick_hint(
                width,
                [
                    "Enter: import    Tab/Shift+Tab: next/previous field    Ctrl+A: simple mode    Esc: dismiss",
                    "Enter: import    Tab: next field    Ctrl+A: simple    Esc: dismiss",
                    "Enter import | Tab field | ^A simple | Esc dismiss",
                ],
            )
        } else {
            pick_hint(
                width,
                [
                    "Enter: import    Ctrl+A: advanced mode    Esc: dismiss",
                    "Enter: import    Ctrl+A: advanced    Esc: dismiss",
                    "Enter import | ^A advanced | Esc dismiss",
                ],
            )
        }
    }
}

fn cycle(focus: Field, step: usize) -> Field {
    let index = ADVANCED_FIELDS
        .iter()
        .position(|field| *field == focus)
        .unwrap_or(0);
    ADVANCED_FIELDS[(index + step) % ADVANCED_FIELDS.len()]
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}
