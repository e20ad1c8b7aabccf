use std::sync::Mutex;

use crate::telemetry::{CompletionReason, TelemetryEvent, TelemetrySink};

#[derive(Default)]
pub struct RecordingTelemetry {
    events: Mutex<Vec<TelemetryEvent>>,
}

impl RecordingTelemetry {
    pub fn reasons(&self) -> Vec<CompletionReason> {
        self.events
            .lock()
            .expect("events lock")
            .iter()
            .map(|event| event.reason)
            .collect()
    }
}

impl TelemetrySink for RecordingTelemetry {
    fn log_event(&self, event: &TelemetryEvent) {
        self.events.lock().expect("events lock").push(event.clone());
    }
}
