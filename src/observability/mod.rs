//! Observability Infrastructure (AU-2, AU-3, AU-12)
//!
//! Structured security-event logging over `tracing`. Application code uses
//! the [`security_event!`](crate::security_event) macro and standard
//! `tracing` macros; this module owns subscriber setup at startup.
//!
//! # Usage
//!
//! ```ignore
//! use portcullis::observability::{init, ObservabilityConfig};
//!
//! // From environment variables
//! init(ObservabilityConfig::from_env())?;
//! ```

mod events;

pub use events::{security_event, SecurityEvent, Severity};

use tracing::info;
use tracing_subscriber::EnvFilter;

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable output for development
    #[default]
    Text,
    /// JSON lines for log aggregation
    Json,
}

/// Runtime logging configuration.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    pub log_format: LogFormat,
    /// `tracing` filter directive, e.g. `"info,portcullis=debug"`.
    /// `None` defers to `RUST_LOG`, falling back to `info`.
    pub filter: Option<String>,
}

impl ObservabilityConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `LOG_FORMAT`: "text" or "json" (default: "text")
    /// - `LOG_FILTER`: filter directives; `RUST_LOG` applies if unset
    pub fn from_env() -> Self {
        let log_format = match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Text,
        };
        Self {
            log_format,
            filter: std::env::var("LOG_FILTER").ok(),
        }
    }
}

/// Initialize the tracing subscriber.
///
/// Must be called once at application startup, before any logging occurs.
/// Fails if a global subscriber is already installed.
pub fn init(config: ObservabilityConfig) -> Result<(), ObservabilityError> {
    let filter = match &config.filter {
        Some(directives) => EnvFilter::try_new(directives)
            .map_err(|e| ObservabilityError::Config(e.to_string()))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    let result = match config.log_format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Text => builder.try_init(),
    };
    result.map_err(|e| ObservabilityError::Provider(e.to_string()))?;

    info!(log_format = ?config.log_format, "Observability initialized");
    Ok(())
}

/// Observability initialization errors
#[derive(Debug, thiserror::Error)]
pub enum ObservabilityError {
    /// Invalid configuration
    #[error("observability config error: {0}")]
    Config(String),
    /// Subscriber installation failed
    #[error("subscriber error: {0}")]
    Provider(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_default_is_text() {
        assert_eq!(LogFormat::default(), LogFormat::Text);
    }
}
