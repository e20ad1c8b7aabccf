use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};

use snack_import_core::import_client::{ImportClient, ImportFailure};
use snack_import_core::navigation::Navigator;
use snack_import_core::telemetry::TelemetrySink;
use snack_import_core::workflow::{
    AttemptId, Effect, ImportWorkflow, SubmitError, WorkflowEvent, WorkflowSettings,
    WorkflowStatus,
};
use url::Url;

/// Completion of one side of the response-vs-timer race.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptSignal {
    Response {
        attempt: AttemptId,
        outcome: Result<String, ImportFailure>,
    },
    TimerElapsed {
        attempt: AttemptId,
    },
}

impl AttemptSignal {
    fn into_event(self) -> WorkflowEvent {
        match self {
            Self::Response { attempt, outcome } => WorkflowEvent::Response { attempt, outcome },
            Self::TimerElapsed { attempt } => WorkflowEvent::TimerElapsed { attempt },
        }
    }
}

/// Starts the two racers for an attempt. Both report back over `signals`;
/// neither is ever cancelled, the workflow drops whichever arrives second.
pub trait AttemptRunner: Send + Sync {
    fn spawn_import(&self, attempt: AttemptId, endpoint: Url, signals: Sender<AttemptSignal>);
    fn spawn_timer(&self, attempt: AttemptId, after: Duration, signals: Sender<AttemptSignal>);
}

pub struct SystemAttemptRunner {
    client: Arc<dyn ImportClient>,
}

impl SystemAttemptRunner {
    pub fn new(client: Arc<dyn ImportClient>) -> Self {
        Self { client }
    }
}

impl AttemptRunner for SystemAttemptRunner {
    fn spawn_import(&self, attempt: AttemptId, endpoint: Url, signals: Sender<AttemptSignal>) {
        let client = Arc::clone(&self.client);
        let fallback = signals.clone();

        let spawned = thread::Builder::new()
            .name(format!("import-{}", attempt.value()))
            .spawn(move || {
                let outcome = client.import(&endpoint);
                let _ = signals.send(AttemptSignal::Response { attempt, outcome });
            });

        if let Err(error) = spawned {
            tracing::error!(%attempt, "failed to spawn import worker: {error}");
            let _ = fallback.send(AttemptSignal::Response {
                attempt,
                outcome: Err(ImportFailure::Transport(format!(
                    "failed to spawn import worker: {error}"
                ))),
            });
        }
    }

    fn spawn_timer(&self, attempt: AttemptId, after: Duration, signals: Sender<AttemptSignal>) {
        let spawned = thread::Builder::new()
            .name(format!("import-timer-{}", attempt.value()))
            .spawn(move || {
                thread::sleep(after);
                let _ = signals.send(AttemptSignal::TimerElapsed { attempt });
            });

        if let Err(error) = spawned {
            // Without a timer the response (or the client's own timeout)
            // still resolves the attempt.
            tracing::error!(%attempt, "failed to spawn import timer: {error}");
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Succeeded { path: String },
    Failed,
    Abandoned,
}

/// Owns the workflow and carries out its effects against real collaborators.
pub struct ImportSession {
    workflow: ImportWorkflow,
    runner: Arc<dyn AttemptRunner>,
    telemetry: Arc<dyn TelemetrySink>,
    navigator: Arc<dyn Navigator>,
    signals_tx: Sender<AttemptSignal>,
    signals_rx: Receiver<AttemptSignal>,
    started_at: Option<Instant>,
}

impl ImportSession {
    pub fn new(
        settings: WorkflowSettings,
        runner: Arc<dyn AttemptRunner>,
        telemetry: Arc<dyn TelemetrySink>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let (signals_tx, signals_rx) = mpsc::channel();
        Self {
            workflow: ImportWorkflow::new(settings),
            runner,
            telemetry,
            navigator,
            signals_tx,
            signals_rx,
            started_at: None,
        }
    }

    pub fn workflow(&self) -> &ImportWorkflow {
        &self.workflow
    }

    pub fn status(&self) -> WorkflowStatus {
        self.workflow.status()
    }

    /// Time since the in-flight attempt started.
    pub fn elapsed(&self) -> Option<Duration> {
        if self.workflow.status() != WorkflowStatus::Importing {
            return None;
        }
        self.started_at.map(|started| started.elapsed())
    }

    pub fn timeout(&self) -> Duration {
        self.workflow.settings().timeout
    }

    pub fn dispatch(&mut self, event: WorkflowEvent) -> Result<Vec<Effect>, SubmitError> {
        let effects = self.workflow.handle(event)?;
        self.apply(&effects);
        Ok(effects)
    }

    /// Applies every signal that has already arrived. Never blocks.
    pub fn poll(&mut self) -> Vec<Effect> {
        let mut applied = Vec::new();
        loop {
            match self.signals_rx.try_recv() {
                Ok(signal) => applied.extend(self.apply_signal(signal)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        applied
    }

    /// Blocks until the in-flight attempt resolves. Returns `None` when no
    /// attempt is in flight.
    pub fn wait_for_resolution(&mut self) -> Option<Resolution> {
        self.workflow.current_attempt()?;

        loop {
            // The session holds a sender, so `recv` only fails if that
            // invariant is broken.
            let Ok(signal) = self.signals_rx.recv() else {
                return Some(Resolution::Abandoned);
            };

            let effects = self.apply_signal(signal);
            if let Some(path) = effects.iter().find_map(|effect| match effect {
                Effect::Navigate { path } => Some(path.clone()),
                _ => None,
            }) {
                return Some(Resolution::Succeeded { path });
            }

            match self.workflow.status() {
                WorkflowStatus::Error => return Some(Resolution::Failed),
                WorkflowStatus::Idle => return Some(Resolution::Abandoned),
                WorkflowStatus::Importing => {}
            }
        }
    }

    /// Hides the view, abandoning any in-flight attempt.
    pub fn close(&mut self) {
        if let Ok(effects) = self.workflow.handle(WorkflowEvent::Hide) {
            self.apply(&effects);
        }
    }

    fn apply_signal(&mut self, signal: AttemptSignal) -> Vec<Effect> {
        match self.workflow.handle(signal.into_event()) {
            Ok(effects) => {
                self.apply(&effects);
                effects
            }
            Err(error) => {
                tracing::warn!("attempt signal rejected: {error}");
                Vec::new()
            }
        }
    }

    fn apply(&mut self, effects: &[Effect]) {
        for effect in effects {
            match effect {
                Effect::StartImport {
                    attempt, endpoint, ..
                } => {
                    self.started_at = Some(Instant::now());
                    self.runner
                        .spawn_import(*attempt, endpoint.clone(), self.signals_tx.clone());
                }
                Effect::StartTimer { attempt, after } => {
                    self.runner
                        .spawn_timer(*attempt, *after, self.signals_tx.clone());
                }
                Effect::Navigate { path } => self.navigator.navigate(path),
                Effect::Report(event) => self.telemetry.log_event(event),
                Effect::Hide => tracing::debug!("import view hidden"),
            }
        }
    }
}

impl Drop for ImportSession {
    fn drop(&mut self) {
        self.close();
    }
}
