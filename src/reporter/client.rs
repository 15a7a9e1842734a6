//! Database client seam used by the reporter.

use crate::core::Result;
use crate::metrics::Point;
use chrono::{DateTime, Utc};
use reqwest::Url;
use std::time::Duration;

/// Points written together, all stamped with the same time.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPoints {
    pub points: Vec<Point>,
    pub database: String,
    pub time: DateTime<Utc>,
}

/// Reply to a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteResponse {
    pub status: u16,
    pub body: String,
}

/// Reply to a successful ping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pong {
    pub latency: Duration,
    pub version: String,
}

/// Where and as whom to connect.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub url: Url,
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Time-series database client.
#[async_trait::async_trait]
pub trait DbClient: Send + Sync {
    /// Write a batch of points.
    async fn write(&self, batch: BatchPoints) -> Result<WriteResponse>;

    /// Check that the server is reachable.
    async fn ping(&self) -> Result<Pong>;
}
