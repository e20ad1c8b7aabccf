pub mod cli;
pub mod diagnostics;
pub mod dispatch;

use anyhow::Result;
use clap::Parser;

use crate::cli::Cli;
use crate::diagnostics::{DiagnosticsSession, LogTarget};

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let fallback = if cli.command.is_some() {
        LogTarget::Stderr
    } else {
        LogTarget::Silent
    };
    let diagnostics = DiagnosticsSession::initialize(cli.diagnostics, fallback)?;
    if let Some(path) = diagnostics.path() {
        eprintln!("Diagnostics enabled: {}", path.display());
    }

    let result = dispatch::run_with_deps(cli);
    if let Err(error) = &result {
        tracing::info!("command failed: {error:#}");
    }
    result
}
