// BirthWindow - util/logging.rs
//
// Structured logging with runtime-selectable debug mode.
//
// Activation:
//   - Environment variable: RUST_LOG=debug (or trace)
//   - CLI flag: --debug (sets the filter to debug)
//   - Config file: [logging] level = "debug"
//
// Output: stderr by default, so stdout stays reserved for questionnaire
// output. Optionally to a file instead ([logging] file in config.toml).
// Never logs question answers at info level; they appear at debug only.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Initialise the logging subsystem.
///
/// `debug_flag` is true when the user passed --debug on the CLI.
/// `config_level` is the level from config.toml (if present).
/// `log_file` is the optional log file path from config.toml. If it cannot be
/// opened, output stays on stderr and a warning is emitted once logging is up.
///
/// Priority: RUST_LOG env var > CLI --debug flag > config level > default "info".
pub fn init(debug_flag: bool, config_level: Option<&str>, log_file: Option<&Path>) {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if debug_flag {
        EnvFilter::new("debug")
    } else if let Some(level) = config_level {
        EnvFilter::new(level)
    } else {
        EnvFilter::new(super::constants::DEFAULT_LOG_LEVEL)
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .compact();

    let file_error = match log_file.map(open_log_file) {
        Some(Ok(file)) => {
            builder.with_ansi(false).with_writer(Mutex::new(file)).init();
            None
        }
        Some(Err(e)) => {
            builder.with_writer(std::io::stderr).init();
            Some(e)
        }
        None => {
            builder.with_writer(std::io::stderr).init();
            None
        }
    };

    if let (Some(path), Some(e)) = (log_file, file_error) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Could not open log file; logging to stderr"
        );
    }

    tracing::debug!(
        app = super::constants::APP_NAME,
        version = super::constants::APP_VERSION,
        "Logging initialised"
    );
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}
