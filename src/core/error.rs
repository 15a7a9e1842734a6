use thiserror::Error;

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Write error: {0}")]
    Write(String),

    #[error("Ping error: {0}")]
    Ping(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metric already registered: {0}")]
    DuplicateMetric(String),

    #[error("Unknown metric kind for '{0}'")]
    UnknownMetricKind(String),

    #[error("Default reporter is already set")]
    DefaultReporterAlreadySet,
}

/// Result type alias for metrics operations
pub type Result<T> = std::result::Result<T, MetricsError>;

impl MetricsError {
    /// Creates a new configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a new connection error
    pub fn connection<S: Into<String>>(msg: S) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates a new write error
    pub fn write<S: Into<String>>(msg: S) -> Self {
        Self::Write(msg.into())
    }

    /// Creates a new ping error
    pub fn ping<S: Into<String>>(msg: S) -> Self {
        Self::Ping(msg.into())
    }

    /// Returns true if the reporting loop can carry on after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Connection(_) | Self::Write(_) | Self::Ping(_) => true,
            Self::Http(err) => err.is_timeout() || err.is_connect() || err.is_request(),
            _ => false,
        }
    }

    /// Returns the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "config",
            Self::Connection(_) | Self::Ping(_) | Self::Http(_) => "network",
            Self::Write(_) => "write",
            Self::Io(_) => "io",
            Self::DuplicateMetric(_) | Self::UnknownMetricKind(_) => "registration",
            Self::DefaultReporterAlreadySet => "reporter",
        }
    }
}
