//! Logging configuration for the SQL assistant.
//!
//! The sink follows the run mode that `main` picks from `Cli::is_headless`.
//! The interactive prompt reprints panels on the same terminal it reads
//! commands from, so its logs go to a file. Headless runs own stdout for
//! the text, JSON or frames report and send logs to stderr, where CI
//! captures them separately.

use std::fs::{self, File};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is not set.
const DEFAULT_FILTER: &str = "info";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Initializes logging to the state-directory log file.
///
/// Location: `~/.local/state/sql-assistant/sql-assistant.log` on Linux,
/// or the platform-appropriate state/config directory elsewhere.
pub fn init_file_logging() {
    let log_path = get_log_path();

    if let Some(parent) = log_path.parent() {
        if let Err(e) = fs::create_dir_all(parent) {
            eprintln!("Warning: Could not create log directory: {e}");
            return;
        }
    }

    // Truncated on each run
    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file: {e}");
            return;
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(log_file)
        .with_ansi(false)
        .init();
}

/// Initializes logging to stderr.
pub fn init_stderr_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .init();
}

/// Returns the path for the log file.
pub fn get_log_path() -> PathBuf {
    if let Some(state_dir) = dirs::state_dir() {
        return state_dir.join("sql-assistant").join("sql-assistant.log");
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("sql-assistant").join("sql-assistant.log");
    }

    std::env::temp_dir().join("sql-assistant.log")
}
