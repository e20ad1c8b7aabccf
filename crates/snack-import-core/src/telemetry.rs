use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::import_client::FailureKind;

pub const IMPORT_COMPLETED: &str = "IMPORT_COMPLETED";
pub const IMPORT_CORRELATION_ID: &str = "importStart";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionReason {
    Success,
    Error,
    Dismiss,
}

impl CompletionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Dismiss => "dismiss",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryEvent {
    pub name: &'static str,
    pub reason: CompletionReason,
    pub correlation_id: &'static str,
    pub failure: Option<FailureKind>,
}

impl TelemetryEvent {
    pub fn import_completed(reason: CompletionReason) -> Self {
        Self {
            name: IMPORT_COMPLETED,
            reason,
            correlation_id: IMPORT_CORRELATION_ID,
            failure: None,
        }
    }

    pub fn import_failed(kind: FailureKind) -> Self {
        Self {
            failure: Some(kind),
            ..Self::import_completed(CompletionReason::Error)
        }
    }
}

/// Fire-and-forget analytics sink. Implementations must not fail the
/// caller; delivery problems are logged and dropped.
pub trait TelemetrySink: Send + Sync {
    fn log_event(&self, event: &TelemetryEvent);
}

#[derive(Debug, Default)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn log_event(&self, event: &TelemetryEvent) {
        tracing::info!(
            target: "telemetry",
            event = event.name,
            reason = event.reason.as_str(),
            correlation_id = event.correlation_id,
            failure = event.failure.map(|kind| kind.as_str()),
        );
    }
}

#[derive(Serialize)]
struct JsonlRecord<'a> {
    timestamp: String,
    event: &'a str,
    properties: JsonlProperties,
    correlation_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<&'static str>,
}

#[derive(Serialize)]
struct JsonlProperties {
    reason: CompletionReason,
}

/// Appends one JSON object per event to a local file.
#[derive(Debug)]
pub struct JsonlTelemetry {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonlTelemetry {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, event: &TelemetryEvent) -> anyhow::Result<()> {
        let record = JsonlRecord {
            timestamp: crate::time::now_utc_rfc3339()?,
            event: event.name,
            properties: JsonlProperties {
                reason: event.reason,
            },
            correlation_id: event.correlation_id,
            failure: event.failure.map(|kind| kind.as_str()),
        };
        let line = serde_json::to_string(&record)?;

        let _guard = self
            .lock
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;
        Ok(())
    }
}

impl TelemetrySink for JsonlTelemetry {
    fn log_event(&self, event: &TelemetryEvent) {
        if let Err(error) = self.append(event) {
            tracing::warn!(
                path = %self.path.display(),
                "dropping telemetry event: {error:#}"
            );
        }
    }
}

#[derive(Default)]
pub struct TelemetryFanout {
    sinks: Vec<Arc<dyn TelemetrySink>>,
}

impl TelemetryFanout {
    pub fn new(sinks: Vec<Arc<dyn TelemetrySink>>) -> Self {
        Self { sinks }
    }
}

impl TelemetrySink for TelemetryFanout {
    fn log_event(&self, event: &TelemetryEvent) {
        for sink in &self.sinks {
            sink.log_event(event);
        }
    }
}
