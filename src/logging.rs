use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;

/// Name of the log file for a process started at `started`.
pub fn log_file_name(prefix: &str, started: chrono::DateTime<Local>) -> String {
    format!("{}_{}.log", prefix, started.format("%Y%m%d_%H%M%S"))
}

/// Installs the global subscriber: stdout plus one log file per process.
/// `RUST_LOG` takes precedence over the configured filter. Keep the returned
/// guard alive until exit or buffered lines are lost.
pub fn init(config: &LoggingConfig) -> Result<WorkerGuard> {
    let directory = Path::new(&config.directory);
    fs::create_dir_all(directory)
        .with_context(|| format!("creating log directory {}", directory.display()))?;

    let file_name = log_file_name(&config.file_prefix, Local::now());
    let appender = tracing_appender::rolling::never(directory, file_name);
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .context("parsing log filter")?;

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("installing tracing subscriber")?;

    Ok(guard)
}
