use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use snack_import_core::config::{EffectiveConfig, load_effective_config, resolve_config_path};
use snack_import_core::doctor::{DoctorReport, run_doctor};
use snack_import_core::import_client::{HttpImportClient, ImportClient};
use snack_import_core::navigation::Navigator;

mod import;
mod preview;
mod runtime;
mod session;

pub use import::{ImportError, ImportInput, ImportResult};
pub use preview::ImportPreview;
pub use session::{
    AttemptRunner, AttemptSignal, ImportSession, Resolution, SystemAttemptRunner,
};

pub struct App {
    client: Arc<dyn ImportClient>,
}

impl App {
    pub fn new(client: Arc<dyn ImportClient>) -> Self {
        Self { client }
    }

    /// Builds the app around the real HTTP client. The client's own timeout
    /// trails the workflow timer so abandoned worker threads still finish.
    pub fn with_http_client(config: &EffectiveConfig) -> Result<Self> {
        let client = HttpImportClient::new(runtime::client_timeout(config.timeout))
            .context("failed to build HTTP client for import service")?;
        Ok(Self::new(Arc::new(client)))
    }

    /// Runs without a client so a broken config can still be diagnosed.
    pub fn doctor() -> Result<DoctorReport> {
        Ok(run_doctor())
    }

    pub fn preview(raw_url: &str, config: &EffectiveConfig) -> ImportPreview {
        ImportPreview::build(raw_url, config.service_url.as_ref())
    }

    pub fn open_session(
        &self,
        config: &EffectiveConfig,
        navigator: Arc<dyn Navigator>,
    ) -> ImportSession {
        let runner = Arc::new(SystemAttemptRunner::new(Arc::clone(&self.client)));
        ImportSession::new(
            config.workflow_settings(),
            runner,
            runtime::telemetry_for(config),
            navigator,
        )
    }
}

/// Reads `~/.config/snack-import/config.toml` when present and applies the
/// environment override. A missing file is fine; a broken one is not.
pub fn load_config() -> Result<EffectiveConfig> {
    let config_path = resolve_config_path().context("failed to resolve config path")?;

    load_effective_config(&config_path).map_err(|error| {
        anyhow!(
            "invalid config at {}: {error}\nFix the config and retry.",
            config_path.display()
        )
    })
}
