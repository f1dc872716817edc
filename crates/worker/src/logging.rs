//! Logging initialization and configuration.

use std::str::FromStr;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Output format of the log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, fields flattened to the top level.
    Json,
    /// Multi-line human readable output.
    Pretty,
    /// Single-line human readable output.
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(format!("Unknown log format: {}", other)),
        }
    }
}

/// Initializes the logging subsystem based on configuration.
///
/// `RUST_LOG` takes precedence over the configured level. Unknown formats
/// fall back to pretty output.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.parse::<LogFormat>().unwrap_or(LogFormat::Pretty) {
        LogFormat::Json => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_target(true);
            subscriber.with(json_layer).init();
        }
        LogFormat::Pretty => {
            subscriber.with(fmt::layer().pretty().with_target(true)).init();
        }
        LogFormat::Compact => {
            subscriber.with(fmt::layer().compact().with_target(false)).init();
        }
    }
}
