//! Structured logging setup
//!
//! Logs go to a daily rolling file under `$XDG_STATE_HOME/audioprint` so they
//! never interleave with the spinner on the terminal.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

const LOG_FILE_PREFIX: &str = "audioprint.log";

/// Rotated files kept on disk
const MAX_LOG_FILES: usize = 7;

/// Keeps the non-blocking writer alive for the life of the process
static APPENDER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Logging setup errors
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Could not determine a log directory")]
    NoLogDir,

    #[error("Failed to create log directory: {0}")]
    CreateDir(#[from] std::io::Error),

    #[error("Logging already initialized")]
    AlreadyInitialized,
}

/// Map `-v` occurrences to a default filter directive
pub fn default_directive(verbose: u8) -> &'static str {
    match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Initialize file logging. `RUST_LOG` wins over the verbosity flag.
pub fn init_logging(verbose: u8) -> Result<PathBuf, LoggingError> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    if let Err(e) = cleanup_old_logs(&log_dir) {
        eprintln!("Warning: Failed to clean up old logs: {}", e);
    }

    let appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    APPENDER_GUARD
        .set(guard)
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .try_init()
        .map_err(|_| LoggingError::AlreadyInitialized)?;

    tracing::debug!(dir = %log_dir.display(), "Logging initialized");
    Ok(log_dir)
}

/// `$XDG_STATE_HOME/audioprint`, or `~/.local/state/audioprint`
fn log_dir() -> Result<PathBuf, LoggingError> {
    if let Ok(state_home) = std::env::var("XDG_STATE_HOME") {
        if !state_home.is_empty() {
            return Ok(PathBuf::from(state_home).join("audioprint"));
        }
    }
    let home = dirs::home_dir().ok_or(LoggingError::NoLogDir)?;
    Ok(home.join(".local").join("state").join("audioprint"))
}

/// Remove rotated files beyond the newest `MAX_LOG_FILES`
fn cleanup_old_logs(log_dir: &Path) -> std::io::Result<()> {
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_string_lossy().to_string();
            if !name.starts_with(&format!("{}.", LOG_FILE_PREFIX)) {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    // Newest first
    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!(path = %path.display(), error = %e, "Failed to delete old log file");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn verbosity_raises_level() {
        assert_eq!(default_directive(0), "info");
        assert_eq!(default_directive(1), "debug");
        assert_eq!(default_directive(5), "trace");
    }

    #[test]
    fn cleanup_keeps_newest_files() {
        let dir = TempDir::new().unwrap();
        for day in 1..=9 {
            let path = dir.path().join(format!("audioprint.log.2026-01-0{}", day));
            fs::write(&path, "x").unwrap();
        }
        fs::write(dir.path().join("unrelated.txt"), "x").unwrap();

        cleanup_old_logs(dir.path()).unwrap();

        let remaining = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(remaining, MAX_LOG_FILES + 1);
    }
}
