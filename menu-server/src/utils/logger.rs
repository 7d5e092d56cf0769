//! Logging Infrastructure
//!
//! Structured logging setup with support for both development and production environments.

use std::path::Path;
use std::time::{Duration, SystemTime};

use tracing_subscriber::{EnvFilter, Layer, fmt, prelude::*};

/// Log file prefix inside the log directory
const LOG_FILE_PREFIX: &str = "menu-server";

/// Initialize the logger
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON formatting and file output
///
/// `RUST_LOG` takes precedence over `log_level` when set.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let mut layers = Vec::new();

    if json.unwrap_or(false) {
        layers.push(fmt::layer().json().with_target(false).boxed());
    } else {
        layers.push(
            fmt::layer()
                .with_file(false)
                .with_line_number(false)
                .with_thread_ids(false)
                .with_target(false)
                .boxed(),
        );
    }

    // Add file output if log_dir is provided
    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if log_path.exists() {
            let file_appender = tracing_appender::rolling::daily(log_path, LOG_FILE_PREFIX);
            layers.push(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(file_appender)
                    .boxed(),
            );
        }
    }

    // A second init (tests) keeps the first subscriber
    let _ = tracing_subscriber::registry()
        .with(layers)
        .with(filter)
        .try_init();
}

/// Remove rolled log files older than `days`
///
/// Returns the number of files removed.
pub fn cleanup_old_logs(log_dir: &str, days: u64) -> std::io::Result<usize> {
    let max_age = Duration::from_secs(days * 24 * 60 * 60);
    let now = SystemTime::now();
    let mut removed = 0;

    for entry in std::fs::read_dir(log_dir)? {
        let entry = entry?;
        let path = entry.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX));
        if !is_log || !path.is_file() {
            continue;
        }

        let modified = entry.metadata()?.modified()?;
        if now.duration_since(modified).unwrap_or_default() > max_age {
            std::fs::remove_file(&path)?;
            removed += 1;
        }
    }

    Ok(removed)
}
