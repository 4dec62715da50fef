//! Structured logging setup via tracing-subscriber.
//!
//! `RUST_LOG` takes precedence over the configured level.

use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{LogFormat, LoggingSettings};

/// Build the filter from `RUST_LOG`, then the configured level, then `info`.
pub fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber.
pub fn init(settings: &LoggingSettings) -> anyhow::Result<()> {
    let filter = env_filter(&settings.level);

    let installed = match settings.format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .with_current_span(true)
            .try_init(),
        LogFormat::Text => fmt().with_env_filter(filter).with_target(true).try_init(),
    };

    installed.map_err(|err| anyhow::anyhow!(err))
}
