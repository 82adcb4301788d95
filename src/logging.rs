//! Diagnostic logging for data sweeper.
//!
//! Diagnostics go to stderr and to a daily rolling file in the platform data
//! directory. This is separate from the user-facing action log kept by
//! [`crate::session::ActionLog`].
//!
//! ```no_run
//! use data_sweeper::logging;
//!
//! // Once, at startup
//! let log_file_dir = logging::init()?;
//! tracing::info!(?log_file_dir, "ready");
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! `RUST_LOG` overrides the default `info` filter, e.g. `RUST_LOG=data_sweeper=debug`.

use anyhow::{Context as _, Result};
use std::path::PathBuf;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _};

const APP_DIR: &str = "data-sweeper";
const LOG_PREFIX: &str = "data-sweeper";

/// Gets the log directory path based on platform conventions
///
/// - Windows: `%APPDATA%/data-sweeper/logs`
/// - macOS: `~/Library/Application Support/data-sweeper/logs`
/// - Linux: `~/.local/share/data-sweeper/logs`
pub fn get_log_dir() -> Result<PathBuf> {
    let base_dir = dirs::data_dir().context("Failed to determine data directory")?;
    let log_dir = base_dir.join(APP_DIR).join("logs");

    if !log_dir.exists() {
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;
    }

    Ok(log_dir)
}

fn file_appender() -> Result<(RollingFileAppender, PathBuf)> {
    let log_dir = get_log_dir()?;
    let appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .max_log_files(10)
        .filename_prefix(LOG_PREFIX)
        .filename_suffix("log")
        .build(&log_dir)
        .context("Failed to create log file appender")?;
    Ok((appender, log_dir))
}

/// Installs the global subscriber and returns the log file directory, or
/// `None` when only console logging could be set up.
///
/// # Errors
///
/// Returns error if the filter is invalid or a subscriber is already installed.
pub fn init() -> Result<Option<PathBuf>> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("Failed to create env filter")?;

    // Stdout carries command output, so diagnostics stay on stderr.
    let stderr_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();

    let (file_layer, log_dir, file_error) = match file_appender() {
        Ok((appender, dir)) => (
            Some(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_file(true)
                    .with_ansi(false)
                    .with_writer(appender),
            ),
            Some(dir),
            None,
        ),
        Err(e) => (None, None, Some(e)),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    match (&log_dir, file_error) {
        (Some(dir), _) => tracing::debug!("Logging initialized, log directory: {}", dir.display()),
        (None, Some(e)) => tracing::warn!("File logging disabled: {e:#}"),
        (None, None) => {}
    }

    Ok(log_dir)
}

/// Path of today's log file
pub fn get_current_log_path() -> Result<PathBuf> {
    let log_dir = get_log_dir()?;
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();
    Ok(log_dir.join(format!("{LOG_PREFIX}.{today}.log")))
}
