//! Logging and tracing initialization for glacier-drain.
//!
//! Uses the `tracing` ecosystem. Output goes to an append-only log file (or stdout
//! when none is configured), either human-readable or as JSON for machine parsing.
//! Workflow components do not log directly; they report through
//! [`crate::core::ProgressReporter`], which the binary backs with this subscriber.

use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::Level;
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

use crate::config::LoggingConfig;

/// Configuration for the logging system.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    /// Log file, opened for append. `None` writes to stdout.
    pub file: Option<PathBuf>,
    /// Output logs as JSON (for machine parsing)
    pub json: bool,
    /// Enable verbose logging (sets default level to DEBUG, including per-archive lines)
    pub verbose: bool,
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            file: config.file.clone(),
            json: config.json,
            verbose: config.verbose,
        }
    }
}

/// Default filter directive when `RUST_LOG` is not set.
fn default_directive(verbose: bool) -> String {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    format!("glacier_drain={}", level.as_str().to_lowercase())
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Call once, early in main(), after config is loaded.
/// The log level can be overridden at runtime via the `RUST_LOG` environment variable.
pub fn init(config: LogConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(config.verbose)));

    let (writer, ansi) = match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (BoxMakeWriter::new(Mutex::new(file)), false)
        }
        None => (BoxMakeWriter::new(std::io::stdout), true),
    };

    if config.json {
        // JSON output for structured logging / log aggregation
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_span_events(FmtSpan::CLOSE)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                fmt::layer()
                    .with_writer(writer)
                    .with_ansi(ansi)
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .try_init()?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbose_lowers_default_level() {
        assert_eq!(default_directive(false), "glacier_drain=info");
        assert_eq!(default_directive(true), "glacier_drain=debug");
    }

    #[test]
    fn log_config_follows_app_config() {
        let app = LoggingConfig::default();
        let config = LogConfig::from(&app);
        assert_eq!(config.file, Some(PathBuf::from("app.log")));
        assert!(!config.json);
        assert!(!config.verbose);
    }
}
