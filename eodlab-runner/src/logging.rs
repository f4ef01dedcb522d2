//! Logging configuration and initialization.
//!
//! Logs go to stderr so `history` output on stdout stays machine-readable.

use std::env;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Multi-line, human-readable.
    #[default]
    Pretty,
    Compact,
    /// One JSON object per event.
    Json,
}

impl LogFormat {
    /// Unknown values fall back to `Pretty`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            _ => LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub format: LogFormat,
    /// Filter used when `RUST_LOG` is unset.
    pub default_level: String,
    pub include_target: bool,
    pub include_thread_ids: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            default_level: "info".to_string(),
            include_target: false,
            include_thread_ids: false,
        }
    }
}

impl LogConfig {
    /// Create config from environment variables
    ///
    /// Reads:
    /// - `LOG_FORMAT`: pretty, compact, or json
    /// - `LOG_LEVEL`: default log level (fallback if RUST_LOG not set)
    /// - `LOG_THREAD_IDS`: true/false, useful with `ingest.workers > 1`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            format: lookup("LOG_FORMAT")
                .map(|s| LogFormat::parse(&s))
                .unwrap_or_default(),
            default_level: lookup("LOG_LEVEL").unwrap_or(defaults.default_level),
            include_target: defaults.include_target,
            include_thread_ids: lookup("LOG_THREAD_IDS")
                .map(|s| s == "true" || s == "1")
                .unwrap_or(defaults.include_thread_ids),
        }
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber is already installed.
pub fn init_logging(config: LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let base = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.include_target)
        .with_thread_ids(config.include_thread_ids);

    let registry = tracing_subscriber::registry().with(env_filter);
    match config.format {
        LogFormat::Json => registry.with(base.json()).try_init()?,
        LogFormat::Compact => registry.with(base.compact()).try_init()?,
        LogFormat::Pretty => registry.with(base.pretty()).try_init()?,
    }
    Ok(())
}
