//! Logging setup
//!
//! The library only emits `tracing` events. Applications that have no
//! subscriber of their own can install a file logger with [`init`].

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Install a file logger; `RUST_LOG` overrides `level` when set
///
/// Returns the appender guard, which must be kept alive for buffered lines
/// to be flushed. `LevelFilter::OFF` installs nothing.
pub fn init(level: LevelFilter, path: Option<PathBuf>) -> Result<Option<WorkerGuard>> {
    if level == LevelFilter::OFF {
        return Ok(None);
    }

    let log_path = path.unwrap_or_else(default_log_path);

    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::default().add_directive(level.into()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("restmodel logging at level {}", level);
    tracing::info!("Log file: {:?}", log_path);

    Ok(Some(guard))
}

/// Default log file location
pub fn default_log_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("restmodel").join("restmodel.log");
    }
    if let Some(home) = dirs::home_dir() {
        return home.join(".restmodel").join("restmodel.log");
    }
    PathBuf::from("restmodel.log")
}
