use std::backtrace::Backtrace;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, Once, OnceLock};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const FILE_FILTER: &str = "debug";
const STDERR_FILTER: &str = "warn";

static PANIC_HOOK: Once = Once::new();
static LOG_PATH: OnceLock<PathBuf> = OnceLock::new();

/// Where tracing output goes for this process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Headless commands: warnings and errors on stderr.
    Stderr,
    /// The interactive form owns the terminal, so nothing is printed.
    Silent,
}

pub struct DiagnosticsSession {
    path: Option<PathBuf>,
}

impl DiagnosticsSession {
    /// With `enabled`, every tracing event and any panic lands in a fresh
    /// `<epoch_ms>.log` next to the config file. Otherwise `fallback` decides.
    pub fn initialize(enabled: bool, fallback: LogTarget) -> Result<Self> {
        install_panic_hook();

        if !enabled {
            if fallback == LogTarget::Stderr {
                install_subscriber(STDERR_FILTER, std::io::stderr, true);
            }
            return Ok(Self { path: None });
        }

        let path = new_log_path()?;
        let file = open_log(&path)?;
        install_subscriber(FILE_FILTER, Mutex::new(file), false);
        let _ = LOG_PATH.set(path.clone());

        tracing::info!(
            version = env!("CARGO_PKG_VERSION"),
            pid = std::process::id(),
            argv = ?std::env::args().collect::<Vec<_>>(),
            "diagnostics enabled"
        );
        Ok(Self { path: Some(path) })
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

fn open_log(path: &Path) -> Result<File> {
    let mut file = OpenOptions::new()
        .create_new(true)
        .write(true)
        .open(path)
        .with_context(|| format!("failed to create diagnostics log at {}", path.display()))?;

    writeln!(file, "snack-import diagnostics start_epoch_ms={}", epoch_ms())
        .and_then(|()| file.flush())
        .with_context(|| format!("failed to write diagnostics header to {}", path.display()))?;
    Ok(file)
}

// Keeps whichever subscriber was installed first in this process.
fn install_subscriber<W>(default_filter: &str, writer: W, terse: bool)
where
    W: for<'writer> tracing_subscriber::fmt::MakeWriter<'writer> + Send + Sync + 'static,
{
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false);

    let _ = if terse {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.without_time().with_target(false))
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(layer.with_thread_names(true))
            .try_init()
    };
}

fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let location = info
                .location()
                .map(|location| format!("{}:{}", location.file(), location.line()))
                .unwrap_or_else(|| "unknown".to_string());
            tracing::error!(
                message = %panic_message(info),
                %location,
                backtrace = %Backtrace::force_capture(),
                "panic captured"
            );

            eprintln!("Fatal internal error in snack-import.");
            match LOG_PATH.get() {
                Some(path) => eprintln!("Diagnostics written to {}", path.display()),
                None => eprintln!("Run `snack-import --diagnostics` to capture a diagnostics log."),
            }
        }));
    });
}

fn panic_message(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|message| (*message).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}

fn epoch_ms() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

fn new_log_path() -> Result<PathBuf> {
    let config_path = snack_import_core::config::resolve_config_path()
        .context("failed to resolve snack-import config path for diagnostics")?;
    let directory = config_path
        .parent()
        .map(|config_dir| config_dir.join("diagnostics"))
        .ok_or_else(|| {
            anyhow!(
                "failed to resolve diagnostics directory from config path {}",
                config_path.display()
            )
        })?;

    fs::create_dir_all(&directory).with_context(|| {
        format!(
            "failed to create diagnostics directory {}",
            directory.display()
        )
    })?;
    Ok(directory.join(format!("{}.log", epoch_ms())))
}
