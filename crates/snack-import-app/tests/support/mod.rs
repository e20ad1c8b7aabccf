#![allow(dead_code)]

use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use snack_import_app::{AttemptRunner, AttemptSignal};
use snack_import_core::import_client::{ImportClient, ImportFailure};
use snack_import_core::navigation::Navigator;
use snack_import_core::telemetry::{CompletionReason, TelemetryEvent, TelemetrySink};
use snack_import_core::workflow::AttemptId;
use url::Url;

pub static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Records spawn requests and lets the test decide when each racer finishes.
#[derive(Default)]
pub struct ScriptedRunner {
    imports: Mutex<Vec<(AttemptId, Url, Sender<AttemptSignal>)>>,
    timers: Mutex<Vec<(AttemptId, Duration, Sender<AttemptSignal>)>>,
}

impl ScriptedRunner {
    pub fn endpoints(&self) -> Vec<Url> {
        self.imports
            .lock()
            .expect("imports lock")
            .iter()
            .map(|(_, endpoint, _)| endpoint.clone())
            .collect()
    }

    pub fn timer_durations(&self) -> Vec<Duration> {
        self.timers
            .lock()
            .expect("timers lock")
            .iter()
            .map(|(_, after, _)| *after)
            .collect()
    }

    pub fn attempts(&self) -> Vec<AttemptId> {
        self.imports
            .lock()
            .expect("imports lock")
            .iter()
            .map(|(attempt, _, _)| *attempt)
            .collect()
    }

    pub fn respond(&self, index: usize, outcome: Result<String, ImportFailure>) {
        let imports = self.imports.lock().expect("imports lock");
        let (attempt, _, signals) = &imports[index];
        // The session may already be gone; a late signal then goes nowhere.
        let _ = signals.send(AttemptSignal::Response {
            attempt: *attempt,
            outcome,
        });
    }

    pub fn elapse(&self, index: usize) {
        let timers = self.timers.lock().expect("timers lock");
        let (attempt, _, signals) = &timers[index];
        let _ = signals.send(AttemptSignal::TimerElapsed { attempt: *attempt });
    }
}

impl AttemptRunner for ScriptedRunner {
    fn spawn_import(&self, attempt: AttemptId, endpoint: Url, signals: Sender<AttemptSignal>) {
        self.imports
            .lock()
            .expect("imports lock")
            .push((attempt, endpoint, signals));
    }

    fn spawn_timer(&self, attempt: AttemptId, after: Duration, signals: Sender<AttemptSignal>) {
        self.timers
            .lock()
            .expect("timers lock")
            .push((attempt, after, signals));
    }
}

#[derive(Default)]
pub struct QueueImportClient {
    outcomes: Mutex<VecDeque<Result<String, ImportFailure>>>,
    delay: Duration,
    calls: Mutex<Vec<Url>>,
}

impl QueueImportClient {
    pub fn new(outcomes: Vec<Result<String, ImportFailure>>) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    pub fn delayed(outcomes: Vec<Result<String, ImportFailure>>, delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new(outcomes)
        }
    }

    pub fn calls(&self) -> Vec<Url> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl ImportClient for QueueImportClient {
    fn import(&self, endpoint: &Url) -> Result<String, ImportFailure> {
        self.calls.lock().expect("calls lock").push(endpoint.clone());
        if !self.delay.is_zero() {
            thread::sleep(self.delay);
        }
        self.outcomes
            .lock()
            .expect("outcomes lock")
            .pop_front()
            .unwrap_or_else(|| Err(ImportFailure::Transport("missing scripted outcome".to_string())))
    }
}

#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn events(&self) -> Vec<TelemetryEvent> {
        self.events.lock().expect("events lock").clone()
    }

    pub fn reasons(&self) -> Vec<CompletionReason> {
        self.events().into_iter().map(|event| event.reason).collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn log_event(&self, event: &TelemetryEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    paths: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn paths(&self) -> Vec<String> {
        self.paths.lock().expect("paths lock").clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.paths.lock().expect("paths lock").push(path.to_string());
    }
}

pub fn write_config(home: &Path, body: &str) {
    let config_dir = home.join(".config").join("snack-import");
    fs::create_dir_all(&config_dir).expect("create config dir");
    fs::write(config_dir.join("config.toml"), body).expect("write config");
}

pub fn service_url() -> Url {
    Url::parse("https://import.example.com").expect("service url")
}
