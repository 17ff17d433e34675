//! HueSight Common Library
//!
//! This crate provides shared types and utilities for HueSight pollers and exporters:
//!
//! - [`telemetry`] - Metric data model (`MetricRecord`, `FieldValue`, `Measurement`)
//! - [`sink`] - The `MetricSink` capability pollers write into
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`args`] - Common CLI arguments
//! - [`error`] - Error types

pub mod args;
pub mod config;
pub mod error;
pub mod sink;
pub mod telemetry;

// Re-export commonly used types at the crate root
pub use args::BridgeArgs;
pub use config::{BridgeConfig, LogFormat, LoggingConfig};
pub use error::{Error, Result};
pub use sink::{MetricSink, SinkError};
pub use telemetry::{FieldValue, Measurement, MetricRecord, current_timestamp_millis};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
///
/// # Example
///
/// ```ignore
/// use huesight_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
