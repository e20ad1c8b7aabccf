use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::workflow::{DismissTelemetry, WorkflowSettings};

/// Overrides `import.service_url` when set to a non-empty value.
pub const SERVICE_URL_ENV: &str = "IMPORT_SERVER_URL";

const DEFAULT_TIMEOUT_SECS: u64 = 45;
pub const MAX_TIMEOUT_SECS: u64 = 3600;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SnackImportConfig {
    pub version: u32,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl Default for SnackImportConfig {
    fn default() -> Self {
        Self {
            version: 1,
            import: ImportConfig::default(),
            telemetry: TelemetryConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ImportConfig {
    pub service_url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    pub website_url: Option<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            service_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            website_url: None,
        }
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub dismiss_after_success: DismissTelemetry,
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceUrlSource {
    ConfigFile,
    Environment,
}

impl ServiceUrlSource {
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConfigFile => "config file",
            Self::Environment => SERVICE_URL_ENV,
        }
    }
}

/// Config file values merged with the environment, ready for the workflow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EffectiveConfig {
    pub config_file: Option<PathBuf>,
    pub service_url: Option<Url>,
    pub service_url_source: Option<ServiceUrlSource>,
    pub website_url: Option<Url>,
    pub timeout: Duration,
    pub dismiss_telemetry: DismissTelemetry,
    pub telemetry_log: Option<PathBuf>,
}

impl EffectiveConfig {
    pub fn workflow_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            service_url: self.service_url.clone(),
            timeout: self.timeout,
            dismiss_telemetry: self.dismiss_telemetry,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not resolve home directory for config path")]
    HomeDirectoryUnavailable,
    #[error("failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {message}")]
    Validation { message: String },
}

pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or(ConfigError::HomeDirectoryUnavailable)?;
    Ok(base_dirs
        .home_dir()
        .join(".config")
        .join("snack-import")
        .join("config.toml"))
}

pub fn load_config(path: &Path) -> Result<SnackImportConfig, ConfigError> {
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let parsed: SnackImportConfig = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_config(&parsed)?;
    Ok(parsed)
}

pub fn validate_config(config: &SnackImportConfig) -> Result<(), ConfigError> {
    if config.version != 1 {
        return Err(ConfigError::Validation {
            message: "version must be 1".to_string(),
        });
    }

    if config.import.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "import.timeout_secs must be greater than zero".to_string(),
        });
    }

    if config.import.timeout_secs > MAX_TIMEOUT_SECS {
        return Err(ConfigError::Validation {
            message: format!("import.timeout_secs must be at most {MAX_TIMEOUT_SECS}"),
        });
    }

    if let Some(raw) = &config.import.service_url {
        parse_http_url("import.service_url", raw)?;
    }

    if let Some(raw) = &config.import.website_url {
        parse_http_url("import.website_url", raw)?;
    }

    let empty_log_path = config
        .telemetry
        .log_path
        .as_ref()
        .is_some_and(|path| path.as_os_str().is_empty());
    if empty_log_path {
        return Err(ConfigError::Validation {
            message: "telemetry.log_path must be non-empty when set".to_string(),
        });
    }

    Ok(())
}

pub fn parse_http_url(field: &str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|error| ConfigError::Validation {
        message: format!("{field} is not a valid URL ({error})"),
    })?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            message: format!("{field} must use http or https, got {}", url.scheme()),
        });
    }

    Ok(url)
}

/// Loads the config file when present (absence is not an error) and applies
/// the `IMPORT_SERVER_URL` override.
pub fn load_effective_config(path: &Path) -> Result<EffectiveConfig, ConfigError> {
    let loaded = if path.exists() {
        Some((path.to_path_buf(), load_config(path)?))
    } else {
        tracing::debug!(path = %path.display(), "no config file; using defaults");
        None
    };

    let env_service_url = std::env::var(SERVICE_URL_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty());

    merge_config(loaded, env_service_url)
}

pub fn merge_config(
    loaded: Option<(PathBuf, SnackImportConfig)>,
    env_service_url: Option<String>,
) -> Result<EffectiveConfig, ConfigError> {
    let (config_file, config) = match loaded {
        Some((path, config)) => (Some(path), config),
        None => (None, SnackImportConfig::default()),
    };

    let (service_url, service_url_source) = match env_service_url {
        Some(raw) => (
            Some(parse_http_url(SERVICE_URL_ENV, &raw)?),
            Some(ServiceUrlSource::Environment),
        ),
        None => match &config.import.service_url {
            Some(raw) => (
                Some(parse_http_url("import.service_url", raw)?),
                Some(ServiceUrlSource::ConfigFile),
            ),
            None => (None, None),
        },
    };

    let website_url = config
        .import
        .website_url
        .as_deref()
        .map(|raw| parse_http_url("import.website_url", raw))
        .transpose()?;

    Ok(EffectiveConfig {
        config_file,
        service_url,
        service_url_source,
        website_url,
        timeout: Duration::from_secs(config.import.timeout_secs),
        dismiss_telemetry: config.telemetry.dismiss_after_success,
        telemetry_log: config.telemetry.log_path,
    })
}
