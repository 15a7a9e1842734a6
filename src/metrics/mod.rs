//! Metric adapters.
//!
//! An adapter pairs a statistic from [`crate::stats`] with a name, a
//! measurement and tags, and turns the statistic into points when the
//! reporter flushes. Constructors register the adapter with a reporter,
//! either the one passed in [`MetricOptions`] or the process default, and
//! hand back the already registered instance when one exists.

pub mod buckets;
pub mod counter;
pub mod gauge;
pub mod histogram;
pub mod meter;
pub mod naming;
pub mod options;
pub mod point;
pub mod timer;

pub use counter::Counter;
pub use gauge::{Gauge, GaugeF64};
pub use histogram::Histogram;
pub use meter::Meter;
pub use naming::{registration_key, MetricKind, DEFAULT_MEASUREMENT};
pub use options::MetricOptions;
pub use point::{FieldValue, Fields, Point, Tags, BUCKET_TAG};
pub use timer::Timer;

use crate::core::{MetricsError, Result};
use crate::reporter::Reporter;
use crate::stats::{Instrument, Stat};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

/// Upcast to `Any` so registry entries can be matched back to their concrete type.
pub trait AsAny {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: Any + Send + Sync> AsAny for T {
    fn as_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Something the reporter can turn into points.
pub trait Metric: AsAny + Send + Sync + 'static {
    /// Append the current values as points
    fn add_points(&self, points: &mut Vec<Point>);
}

static DEFAULT_REPORTER: OnceCell<Arc<Reporter>> = OnceCell::new();

/// Make `reporter` the process-wide default. Can only be done once.
pub fn set_default_reporter(reporter: Arc<Reporter>) -> Result<()> {
    DEFAULT_REPORTER
        .set(reporter)
        .map_err(|_| MetricsError::DefaultReporterAlreadySet)
}

/// The process-wide default reporter, if one was set
pub fn default_reporter() -> Option<Arc<Reporter>> {
    DEFAULT_REPORTER.get().map(Arc::clone)
}

/// Register an arbitrary instrument under `name`.
///
/// The instrument is resolved to a single kind (see [`Stat::resolve`]) and
/// wrapped in the matching adapter, which is then registered like any other
/// metric. Fails with [`MetricsError::UnknownMetricKind`] when the
/// instrument supports none of the known kinds.
pub fn register(name: &str, instrument: Arc<dyn Instrument>, options: MetricOptions) -> Result<()> {
    let stat = Stat::resolve(instrument)
        .ok_or_else(|| MetricsError::UnknownMetricKind(name.to_string()))?;
    debug!(metric = %name, kind = ?stat.kind(), "registering instrument");

    let options = options.stat(stat.clone());
    match stat {
        Stat::Counter(_) => drop(Counter::new(name, options)),
        Stat::Gauge(_) => drop(Gauge::new(name, options)),
        Stat::GaugeF64(_) => drop(GaugeF64::new(name, options)),
        Stat::Histogram(_) => drop(Histogram::new(name, options)),
        Stat::Meter(_) => drop(Meter::new(name, options)),
        Stat::Timer(_) => drop(Timer::new(name, options)),
    }
    Ok(())
}

/// Wrap a bare statistic in its adapter without registering it.
pub(crate) fn wrap_stat(name: &str, stat: Stat, tags: Option<&Tags>) -> Box<dyn Metric> {
    let mut options = MetricOptions::new().stat(stat.clone());
    options.tags = tags.cloned();
    let name = name.to_string();
    match stat {
        Stat::Counter(_) => Box::new(Counter::build(name, &options, None)),
        Stat::Gauge(_) => Box::new(Gauge::build(name, &options, None)),
        Stat::GaugeF64(_) => Box::new(GaugeF64::build(name, &options, None)),
        Stat::Histogram(_) => Box::new(Histogram::build(name, &options, None)),
        Stat::Meter(_) => Box::new(Meter::build(name, &options, None)),
        Stat::Timer(_) => Box::new(Timer::build(name, &options, None)),
    }
}
