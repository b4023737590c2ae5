//! Tracing subscriber setup shared by setlist binaries
//!
//! Filter priority: `RUST_LOG` → explicit level → `[logging].level` → "info".

use crate::config::LoggingConfig;
use crate::{Error, Result};
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Build the env filter for the given level override and config
pub fn build_filter(level_override: Option<&str>, config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level_override.unwrap_or(config.level.as_str());
        EnvFilter::new(level)
    })
}

/// Install the global tracing subscriber
///
/// Logs go to stderr unless `[logging].file` names a file, in which case
/// lines are appended to it without ANSI colors.
pub fn init_tracing(level_override: Option<&str>, config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(level_override, config);

    match &config.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| Error::Config(format!("Open log file {} failed: {}", path.display(), e)))?;

            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .try_init()
                .map_err(|e| Error::Internal(format!("Tracing init failed: {}", e)))
        }
        None => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| Error::Internal(format!("Tracing init failed: {}", e))),
    }
}
