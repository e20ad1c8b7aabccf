use std::time::Duration;

use thiserror::Error;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Network,
    Timeout,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportFailure {
    #[error("import service responded with HTTP {status}")]
    Status { status: u16 },
    #[error("failed to reach import service: {0}")]
    Transport(String),
    #[error("import service returned an empty project identifier")]
    EmptyIdentifier,
    #[error("import did not finish within {seconds}s")]
    Timeout { seconds: u64 },
}

impl ImportFailure {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Timeout { .. } => FailureKind::Timeout,
            Self::Status { .. } | Self::Transport(_) | Self::EmptyIdentifier => {
                FailureKind::Network
            }
        }
    }
}

/// Performs the outbound `GET <service>/git?...` call and returns the
/// project identifier from the plain-text body.
pub trait ImportClient: Send + Sync {
    fn import(&self, endpoint: &Url) -> Result<String, ImportFailure>;
}

#[derive(Debug, Clone)]
pub struct HttpImportClient {
    http: reqwest::blocking::Client,
}

impl HttpImportClient {
    /// `request_timeout` only bounds how long a worker thread may linger;
    /// the workflow's own timer decides when an attempt has failed.
    pub fn new(request_timeout: Duration) -> Result<Self, ImportFailure> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(concat!("snack-import/", env!("CARGO_PKG_VERSION")))
            .timeout(request_timeout)
            .build()
            .map_err(|error| ImportFailure::Transport(error.to_string()))?;

        Ok(Self { http })
    }
}

impl ImportClient for HttpImportClient {
    fn import(&self, endpoint: &Url) -> Result<String, ImportFailure> {
        tracing::debug!(%endpoint, "sending import request");

        let response = self
            .http
            .get(endpoint.clone())
            .send()
            .map_err(|error| ImportFailure::Transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|error| ImportFailure::Transport(error.to_string()))?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), body = %body.trim(), "import rejected");
            return Err(ImportFailure::Status {
                status: status.as_u16(),
            });
        }

        identifier_from_body(&body)
    }
}

pub fn identifier_from_body(body: &str) -> Result<String, ImportFailure> {
    let identifier = body.trim();
    if identifier.is_empty() {
        return Err(ImportFailure::EmptyIdentifier);
    }
    Ok(identifier.to_string())
}
