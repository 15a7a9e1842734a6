//! Configuration management for fluxmetrics.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Programmatic construction through [`ConfigBuilder`]
//! - Validation and defaults

use crate::core::{MetricsError, Result};
use crate::metrics::Tags;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default flush interval of a reporter
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Longest accepted flush interval, one week
pub const MAX_INTERVAL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Complete configuration for a fluxmetrics process
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Reporter configuration
    pub reporter: ReporterConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Reporter configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReporterConfig {
    /// InfluxDB base URL, e.g. `http://localhost:8086`. Empty means no endpoint.
    pub endpoint: String,
    /// Target database
    pub database: String,
    /// Username for the database connection
    pub username: Option<String>,
    /// Password for the database connection
    pub password: Option<String>,
    /// Flush interval
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Tags added to every point sent by this reporter
    pub tags: Option<Tags>,
    /// Align batch timestamps to the flush interval
    pub align: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
    /// Structured (JSON) logging format
    pub structured: bool,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for ReporterConfig {
    fn default() -> Self {
        ReporterConfig {
            endpoint: String::new(),
            database: String::new(),
            username: None,
            password: None,
            interval: DEFAULT_INTERVAL,
            tags: None,
            align: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
            structured: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        ConfigBuilder::new().from_yaml(&content)?.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.reporter.validate()
    }
}

impl ReporterConfig {
    /// Validate the reporter configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(MetricsError::config("interval must be greater than 0"));
        }
        if self.interval > MAX_INTERVAL {
            return Err(MetricsError::config(format!(
                "interval {:?} exceeds the maximum of {:?}",
                self.interval, MAX_INTERVAL
            )));
        }
        self.endpoint_url()?;
        Ok(())
    }

    /// Parse the endpoint. An empty endpoint yields `None`.
    pub fn endpoint_url(&self) -> Result<Option<Url>> {
        if self.endpoint.is_empty() {
            return Ok(None);
        }

        let url = Url::parse(&self.endpoint).map_err(|e| {
            MetricsError::config(format!("unable to parse endpoint '{}': {}", self.endpoint, e))
        })?;

        match url.scheme() {
            "http" | "https" => Ok(Some(url)),
            scheme => Err(MetricsError::config(format!(
                "unsupported endpoint scheme '{}' in '{}'",
                scheme, self.endpoint
            ))),
        }
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| MetricsError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the endpoint
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.reporter.endpoint = endpoint.into();
        self
    }

    /// Set the database
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.config.reporter.database = database.into();
        self
    }

    /// Set the flush interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.reporter.interval = interval;
        self
    }

    /// Set the log level
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.logging.level = level;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
