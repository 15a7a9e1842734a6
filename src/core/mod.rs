//! Configuration and error types shared across fluxmetrics.

#![warn(missing_docs)]

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::{Config, ConfigBuilder, LogLevel, LoggingConfig, ReporterConfig};
pub use error::{MetricsError, Result};
