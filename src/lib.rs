//! fluxmetrics - application metrics reported to InfluxDB.
//!
//! Metrics are created through per-kind constructors that register them with
//! a [`Reporter`]. The reporter periodically snapshots its registry into
//! tagged points and writes them to the database in one batch.
//!
//! # Architecture
//!
//! - `stats`: the underlying statistics (counters, gauges, histograms, meters, timers)
//! - `metrics`: adapters turning statistics into points, plus naming and registration
//! - `registry`: concurrent name to metric map
//! - `reporter`: flush and liveness loops, database client
//! - `core`: configuration and errors
//! - `cli`: command-line interface
//!
//! # Example
//!
//! ```no_run
//! use fluxmetrics::metrics::{Counter, MetricOptions};
//! use fluxmetrics::Reporter;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let reporter = Reporter::builder("http://localhost:8086", "metrics")
//!         .interval(Duration::from_secs(10))
//!         .build()?;
//!
//!     let requests = Counter::new("requests", MetricOptions::new().reporter(&reporter));
//!     requests.inc(1);
//!
//!     reporter.run().await;
//!     Ok(())
//! }
//! ```

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod cli;
pub mod core;
pub mod metrics;
pub mod registry;
pub mod reporter;
pub mod stats;

pub use crate::core::{Config, MetricsError, Result};
pub use crate::registry::Registry;
pub use crate::reporter::{Reporter, ReporterBuilder, ReporterState};
