//! Logging configuration using the tracing ecosystem.
//!
//! Logs go to a daily rotating file so they never draw over the TUI. The
//! optional telemetry layer writes `jayrah_tui::telemetry` events to stderr
//! and is only installed when telemetry is switched on.

use std::path::PathBuf;

use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{filter::EnvFilter, filter::Targets, fmt, prelude::*};

/// Default log level if RUST_LOG is not set.
const DEFAULT_LOG_FILTER: &str = "jayrah_tui=info,warn";

const TELEMETRY_TARGET: &str = "jayrah_tui::telemetry";

/// Initialize the logging system.
///
/// Log files live in the platform's local data directory, e.g.
/// `~/.local/share/jayrah-tui/logs/` on Linux. Set `RUST_LOG` to change
/// verbosity (`RUST_LOG=jayrah_tui=debug`).
pub fn init(telemetry: bool) -> anyhow::Result<()> {
    let log_dir = get_log_directory()?;
    std::fs::create_dir_all(&log_dir)?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "jayrah-tui.log");

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(filter);

    let telemetry_layer = telemetry.then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(false)
            .with_target(false)
            .with_filter(Targets::new().with_target(TELEMETRY_TARGET, Level::INFO))
    });

    let subscriber = tracing_subscriber::registry()
        .with(file_layer)
        .with(telemetry_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), telemetry, "jayrah-tui starting up");
    tracing::debug!(log_dir = %log_dir.display(), "Log directory");

    Ok(())
}

fn get_log_directory() -> anyhow::Result<PathBuf> {
    let base_dir = dirs::data_local_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not determine local data directory"))?;

    Ok(base_dir.join("jayrah-tui").join("logs"))
}

/// Where log files are written, for error messages.
pub fn log_directory() -> Option<PathBuf> {
    get_log_directory().ok()
}

pub fn shutdown() {
    tracing::info!("jayrah-tui shutting down");
}
