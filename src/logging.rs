//! Structured logging setup
//!
//! Human-readable or JSON output on stderr, with an optional log file.
//! Stdout is left to command output.

use crate::config::LoggingConfig;
use anyhow::Result;
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize logging based on configuration.
///
/// A non-empty, valid `RUST_LOG` takes precedence over `config.level`.
///
/// # Errors
///
/// Returns error if the configured level is not a valid filter, the log file
/// cannot be opened, or a global subscriber is already installed.
///
/// # Examples
///
/// ```no_run
/// use ragsync::config::LoggingConfig;
/// use ragsync::logging::init_logging;
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     json_format: true,
///     file_path: None,
/// };
///
/// init_logging(&config).unwrap();
/// ```
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&config.level, rust_log.as_deref())?;
    let file = config.file_path.as_deref().map(open_log_file).transpose()?;

    let registry = tracing_subscriber::registry().with(filter);
    if config.json_format {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file.map(|f| fmt::layer().json().with_writer(Arc::new(f))))
            .try_init()?;
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(file.map(|f| fmt::layer().with_ansi(false).with_writer(Arc::new(f))))
            .try_init()?;
    }

    Ok(())
}

/// Pick the filter: `rust_log` when it parses, otherwise the configured level
fn build_filter(level: &str, rust_log: Option<&str>) -> Result<EnvFilter> {
    if let Some(directives) = rust_log.filter(|d| !d.trim().is_empty()) {
        if let Ok(filter) = EnvFilter::try_new(directives) {
            return Ok(filter);
        }
    }
    Ok(EnvFilter::try_new(level)?)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}
