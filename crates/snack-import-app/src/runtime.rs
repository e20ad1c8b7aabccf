use std::sync::Arc;
use std::time::Duration;

use snack_import_core::config::EffectiveConfig;
use snack_import_core::telemetry::{
    JsonlTelemetry, TelemetryFanout, TelemetrySink, TracingTelemetry,
};

const CLIENT_GRACE: Duration = Duration::from_secs(5);

pub(crate) fn client_timeout(workflow_timeout: Duration) -> Duration {
    workflow_timeout.saturating_add(CLIENT_GRACE)
}

pub(crate) fn telemetry_for(config: &EffectiveConfig) -> Arc<dyn TelemetrySink> {
    let mut sinks: Vec<Arc<dyn TelemetrySink>> = vec![Arc::new(TracingTelemetry)];
    if let Some(path) = &config.telemetry_log {
        sinks.push(Arc::new(JsonlTelemetry::new(path)));
    }
    Arc::new(TelemetryFanout::new(sinks))
}
