use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::import_client::{ImportFailure, identifier_from_body};
use crate::repo_ref;
use crate::request::{ImportRequest, ManualFields, RequestError};
use crate::telemetry::{CompletionReason, TelemetryEvent};

pub const DEFAULT_IMPORT_TIMEOUT: Duration = Duration::from_secs(45);

/// Identifies one submit-to-resolution cycle. Signals carrying any id other
/// than the current one are stale and never change state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttemptId(u64);

impl AttemptId {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for AttemptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WorkflowStatus {
    #[default]
    Idle,
    Importing,
    Error,
}

/// Whether dismissing right after a successful import still reports
/// `dismiss`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum DismissTelemetry {
    #[default]
    #[serde(rename = "report")]
    Always,
    #[serde(rename = "suppress")]
    SuppressAfterSuccess,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSettings {
    pub service_url: Option<Url>,
    pub timeout: Duration,
    pub dismiss_telemetry: DismissTelemetry,
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            service_url: None,
            timeout: DEFAULT_IMPORT_TIMEOUT,
            dismiss_telemetry: DismissTelemetry::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowFields {
    pub url: String,
    pub repo: String,
    pub subpath: String,
    pub branch: String,
    pub advanced: bool,
}

impl WorkflowFields {
    fn manual(&self) -> ManualFields {
        ManualFields {
            repo: self.repo.clone(),
            subpath: self.subpath.clone(),
            branch: self.branch.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowEvent {
    Show,
    Hide,
    EditUrl(String),
    EditRepo(String),
    EditSubpath(String),
    EditBranch(String),
    ToggleAdvanced,
    Submit,
    Response {
        attempt: AttemptId,
        outcome: Result<String, ImportFailure>,
    },
    TimerElapsed {
        attempt: AttemptId,
    },
    Dismiss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartImport {
        attempt: AttemptId,
        endpoint: Url,
        request: ImportRequest,
    },
    StartTimer {
        attempt: AttemptId,
        after: Duration,
    },
    Navigate {
        path: String,
    },
    Report(TelemetryEvent),
    Hide,
}

/// Rejections raised before any state change or network traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error("a repository URL is required")]
    MissingRepository,
    #[error("import service URL is not configured; set import.service_url or IMPORT_SERVER_URL")]
    MissingConfiguration,
}

impl From<RequestError> for SubmitError {
    fn from(error: RequestError) -> Self {
        match error {
            RequestError::MissingRepository => Self::MissingRepository,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImportWorkflow {
    settings: WorkflowSettings,
    status: WorkflowStatus,
    fields: WorkflowFields,
    visible: bool,
    current_attempt: Option<AttemptId>,
    next_attempt: u64,
    last_resolution: Option<CompletionReason>,
}

impl ImportWorkflow {
    pub fn new(settings: WorkflowSettings) -> Self {
        Self {
            settings,
            status: WorkflowStatus::Idle,
            fields: WorkflowFields::default(),
            visible: false,
            current_attempt: None,
            next_attempt: 1,
            last_resolution: None,
        }
    }

    pub fn status(&self) -> WorkflowStatus {
        self.status
    }

    pub fn fields(&self) -> &WorkflowFields {
        &self.fields
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn current_attempt(&self) -> Option<AttemptId> {
        self.current_attempt
    }

    pub fn settings(&self) -> &WorkflowSettings {
        &self.settings
    }

    /// The request a submit would send right now, without changing state.
    pub fn pending_request(&self) -> Result<ImportRequest, RequestError> {
        if self.fields.advanced {
            ImportRequest::from_fields(&self.fields.manual())
        } else {
            ImportRequest::from_reference(&repo_ref::parse(&self.fields.url))
        }
    }

    pub fn handle(&mut self, event: WorkflowEvent) -> Result<Vec<Effect>, SubmitError> {
        let effects = match event {
            WorkflowEvent::Show => {
                self.on_show();
                Vec::new()
            }
            WorkflowEvent::Hide => self.on_hide(),
            WorkflowEvent::EditUrl(url) => {
                self.edit_url(url);
                Vec::new()
            }
            WorkflowEvent::EditRepo(value) => {
                self.fields.repo = value;
                Vec::new()
            }
            WorkflowEvent::EditSubpath(value) => {
                self.fields.subpath = value;
                Vec::new()
            }
            WorkflowEvent::EditBranch(value) => {
                self.fields.branch = value;
                Vec::new()
            }
            WorkflowEvent::ToggleAdvanced => {
                self.fields.advanced = !self.fields.advanced;
                Vec::new()
            }
            WorkflowEvent::Submit => return self.on_submit(),
            WorkflowEvent::Response { attempt, outcome } => self.on_response(attempt, outcome),
            WorkflowEvent::TimerElapsed { attempt } => self.on_timer(attempt),
            WorkflowEvent::Dismiss => self.on_dismiss(),
        };

        Ok(effects)
    }

    fn on_show(&mut self) {
        if self.visible {
            return;
        }
        self.visible = true;
        self.status = WorkflowStatus::Idle;
        self.current_attempt = None;
    }

    fn on_hide(&mut self) -> Vec<Effect> {
        if !self.visible {
            return Vec::new();
        }
        self.visible = false;

        let Some(attempt) = self.current_attempt.take() else {
            return Vec::new();
        };

        tracing::debug!(%attempt, "view hidden while importing; abandoning attempt");
        self.status = WorkflowStatus::Idle;
        self.last_resolution = Some(CompletionReason::Dismiss);
        vec![Effect::Report(TelemetryEvent::import_completed(
            CompletionReason::Dismiss,
        ))]
    }

    fn edit_url(&mut self, url: String) {
        if !self.fields.advanced {
            let reference = repo_ref::parse(&url);
            self.fields.repo = reference.repository_url().unwrap_or_default();
            self.fields.subpath = reference.subpath;
            self.fields.branch = reference.git_ref;
        }
        self.fields.url = url;
    }

    fn on_submit(&mut self) -> Result<Vec<Effect>, SubmitError> {
        if !self.visible {
            tracing::debug!("ignoring submit while hidden");
            return Ok(Vec::new());
        }

        if self.status == WorkflowStatus::Importing {
            tracing::debug!(attempt = ?self.current_attempt, "ignoring submit while importing");
            return Ok(Vec::new());
        }

        let request = self.pending_request()?;
        let service_url = self
            .settings
            .service_url
            .as_ref()
            .ok_or(SubmitError::MissingConfiguration)?;
        let endpoint = request.endpoint(service_url);

        let attempt = AttemptId(self.next_attempt);
        self.next_attempt = self.next_attempt.saturating_add(1);
        self.current_attempt = Some(attempt);
        self.status = WorkflowStatus::Importing;
        self.last_resolution = None;

        tracing::info!(%attempt, repo = %request.repo, "starting import");

        Ok(vec![
            Effect::StartImport {
                attempt,
                endpoint,
                request,
            },
            Effect::StartTimer {
                attempt,
                after: self.settings.timeout,
            },
        ])
    }

    fn accepts(&self, attempt: AttemptId) -> bool {
        self.visible
            && self.status == WorkflowStatus::Importing
            && self.current_attempt == Some(attempt)
    }

    fn on_response(
        &mut self,
        attempt: AttemptId,
        outcome: Result<String, ImportFailure>,
    ) -> Vec<Effect> {
        if !self.accepts(attempt) {
            tracing::debug!(%attempt, "ignoring stale import response");
            return Vec::new();
        }
        self.current_attempt = None;

        match outcome.and_then(|body| identifier_from_body(&body)) {
            Ok(identifier) => {
                tracing::info!(%attempt, identifier, "import succeeded");
                self.status = WorkflowStatus::Idle;
                self.clear_fields();
                self.last_resolution = Some(CompletionReason::Success);
                vec![
                    Effect::Report(TelemetryEvent::import_completed(CompletionReason::Success)),
                    Effect::Navigate {
                        path: format!("/{identifier}"),
                    },
                ]
            }
            Err(failure) => self.fail(attempt, failure),
        }
    }

    fn on_timer(&mut self, attempt: AttemptId) -> Vec<Effect> {
        if !self.accepts(attempt) {
            tracing::debug!(%attempt, "ignoring stale import timer");
            return Vec::new();
        }
        self.current_attempt = None;

        let seconds = self.settings.timeout.as_secs();
        self.fail(attempt, ImportFailure::Timeout { seconds })
    }

    fn fail(&mut self, attempt: AttemptId, failure: ImportFailure) -> Vec<Effect> {
        tracing::warn!(%attempt, kind = failure.kind().as_str(), "import failed: {failure}");
        self.status = WorkflowStatus::Error;
        self.last_resolution = Some(CompletionReason::Error);
        vec![Effect::Report(TelemetryEvent::import_failed(failure.kind()))]
    }

    fn on_dismiss(&mut self) -> Vec<Effect> {
        if !self.visible {
            return Vec::new();
        }

        let suppressed = self.settings.dismiss_telemetry == DismissTelemetry::SuppressAfterSuccess
            && self.status == WorkflowStatus::Idle
            && self.last_resolution == Some(CompletionReason::Success);

        let mut effects = Vec::with_capacity(2);
        if !suppressed {
            effects.push(Effect::Report(TelemetryEvent::import_completed(
                CompletionReason::Dismiss,
            )));
        }

        self.visible = false;
        self.status = WorkflowStatus::Idle;
        self.current_attempt = None;
        self.last_resolution = Some(CompletionReason::Dismiss);
        self.clear_fields();

        effects.push(Effect::Hide);
        effects
    }

    // The advanced toggle is a view preference and survives a reset.
    fn clear_fields(&mut self) {
        self.fields = WorkflowFields {
            advanced: self.fields.advanced,
            ..WorkflowFields::default()
        };
    }
}
