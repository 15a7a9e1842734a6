//! Common test utilities and fixtures.

#![allow(dead_code)]

use async_trait::async_trait;
use fluxmetrics::metrics::{Point, BUCKET_TAG};
use fluxmetrics::reporter::{BatchPoints, DbClient, Pong, WriteResponse};
use fluxmetrics::{MetricsError, Registry, Reporter, Result};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Database client that records every batch instead of sending it.
#[derive(Default)]
pub struct RecordingClient {
    batches: Mutex<Vec<BatchPoints>>,
    writes: AtomicUsize,
    pings: AtomicUsize,
    fail_writes: AtomicBool,
}

impl RecordingClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Make every following write fail
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn pings(&self) -> usize {
        self.pings.load(Ordering::SeqCst)
    }

    pub fn batches(&self) -> Vec<BatchPoints> {
        self.batches.lock().clone()
    }

    pub fn last_points(&self) -> Vec<Point> {
        self.batches
            .lock()
            .last()
            .map(|b| b.points.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DbClient for RecordingClient {
    async fn write(&self, batch: BatchPoints) -> Result<WriteResponse> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(MetricsError::write("server returned 500 Internal Server Error"));
        }
        self.batches.lock().push(batch);
        Ok(WriteResponse {
            status: 204,
            body: String::new(),
        })
    }

    async fn ping(&self) -> Result<Pong> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        Ok(Pong {
            latency: Duration::from_micros(250),
            version: "1.8.10".to_string(),
        })
    }
}

/// Reporter with its own registry, writing into `client`.
pub fn test_reporter(client: &Arc<RecordingClient>, interval: Duration) -> Arc<Reporter> {
    Reporter::builder("", "testdb")
        .interval(interval)
        .registry(&Arc::new(Registry::new()))
        .client(Arc::clone(client) as Arc<dyn DbClient>)
        .build()
        .expect("reporter configuration is valid")
}

/// Value of the `bucket` tag of `point`
pub fn bucket_of(point: &Point) -> Option<&str> {
    point
        .tags
        .as_ref()
        .and_then(|t| t.get(BUCKET_TAG))
        .map(String::as_str)
}

/// Numeric value of `field` on the point tagged with `bucket`
pub fn bucket_value(points: &[Point], bucket: &str, field: &str) -> Option<f64> {
    points
        .iter()
        .find(|p| bucket_of(p) == Some(bucket) && p.fields.contains_key(field))
        .and_then(|p| p.fields.get(field))
        .map(|v| v.as_f64())
}
