//! Logging setup
//!
//! `RUST_LOG` overrides the default filter in both modes.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset
pub const DEFAULT_FILTER: &str = "rlv_engine=info";

/// Directory for rolling log files
pub const LOG_DIR: &str = "logs";

/// Log file prefix; the appender adds the date
pub const LOG_FILE_PREFIX: &str = "rlv-engine.log";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Log JSON lines to a daily-rolling file under `logs/`
///
/// Keep the returned guard alive; dropping it flushes and stops the writer.
pub fn init_logging() -> Result<WorkerGuard> {
    init_logging_in(LOG_DIR)
}

/// Log to a daily-rolling file under `dir`
pub fn init_logging_in(dir: impl AsRef<Path>) -> Result<WorkerGuard> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true);

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    tracing::info!("[Logging] Writing logs to {}", dir.display());
    Ok(guard)
}

/// Log to stderr, for interactive use
pub fn init_console_logging() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))
}
