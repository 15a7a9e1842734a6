//! Underlying statistics wrapped by the metric adapters.
//!
//! Each statistic kind is a trait so that callers can plug in their own
//! implementation; the `Standard*` types are the defaults. All of them are
//! safe to update and snapshot concurrently.
//!
//! Which kinds an arbitrary object supports is answered by [`Instrument`],
//! and [`Stat::resolve`] turns that answer into a single [`Stat`] using a
//! fixed precedence order.

pub mod counter;
pub mod histogram;
pub mod meter;
pub mod timer;

pub use counter::{
    CounterStat, GaugeF64Stat, GaugeStat, StandardCounter, StandardGauge, StandardGaugeF64,
};
pub use histogram::{HistogramSnapshot, HistogramStat, StandardHistogram};
pub use meter::{Ewma, MeterSnapshot, MeterStat, StandardMeter};
pub use timer::{StandardTimer, TimerSnapshot, TimerStat};

use crate::metrics::MetricKind;
use std::fmt;
use std::sync::Arc;

/// A statistic of one known kind.
#[derive(Clone)]
pub enum Stat {
    Counter(Arc<dyn CounterStat>),
    Gauge(Arc<dyn GaugeStat>),
    GaugeF64(Arc<dyn GaugeF64Stat>),
    Histogram(Arc<dyn HistogramStat>),
    Meter(Arc<dyn MeterStat>),
    Timer(Arc<dyn TimerStat>),
}

impl Stat {
    /// Kind of this statistic
    pub fn kind(&self) -> MetricKind {
        match self {
            Stat::Counter(_) => MetricKind::Counter,
            Stat::Gauge(_) => MetricKind::Gauge,
            Stat::GaugeF64(_) => MetricKind::GaugeF64,
            Stat::Histogram(_) => MetricKind::Histogram,
            Stat::Meter(_) => MetricKind::Meter,
            Stat::Timer(_) => MetricKind::Timer,
        }
    }

    /// Resolve the capabilities of `instrument` to a single kind.
    ///
    /// Precedence: counter, gauge, float gauge, timer, meter, histogram.
    /// A timer is checked before meter and histogram because a type that
    /// records durations usually also exposes both of those views.
    /// Returns `None` when the object supports none of the known kinds.
    pub fn resolve(instrument: Arc<dyn Instrument>) -> Option<Stat> {
        if let Some(s) = Arc::clone(&instrument).as_counter() {
            return Some(Stat::Counter(s));
        }
        if let Some(s) = Arc::clone(&instrument).as_gauge() {
            return Some(Stat::Gauge(s));
        }
        if let Some(s) = Arc::clone(&instrument).as_gauge_f64() {
            return Some(Stat::GaugeF64(s));
        }
        if let Some(s) = Arc::clone(&instrument).as_timer() {
            return Some(Stat::Timer(s));
        }
        if let Some(s) = Arc::clone(&instrument).as_meter() {
            return Some(Stat::Meter(s));
        }
        instrument.as_histogram().map(Stat::Histogram)
    }
}

impl fmt::Debug for Stat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Stat").field(&self.kind()).finish()
    }
}

/// Capability queries for objects handed to [`crate::metrics::register`].
///
/// Every method defaults to `None`; implement the ones your type supports
/// by returning `Some(self)`.
pub trait Instrument: Send + Sync + 'static {
    fn as_counter(self: Arc<Self>) -> Option<Arc<dyn CounterStat>> {
        None
    }

    fn as_gauge(self: Arc<Self>) -> Option<Arc<dyn GaugeStat>> {
        None
    }

    fn as_gauge_f64(self: Arc<Self>) -> Option<Arc<dyn GaugeF64Stat>> {
        None
    }

    fn as_histogram(self: Arc<Self>) -> Option<Arc<dyn HistogramStat>> {
        None
    }

    fn as_meter(self: Arc<Self>) -> Option<Arc<dyn MeterStat>> {
        None
    }

    fn as_timer(self: Arc<Self>) -> Option<Arc<dyn TimerStat>> {
        None
    }
}

impl Instrument for StandardCounter {
    fn as_counter(self: Arc<Self>) -> Option<Arc<dyn CounterStat>> {
        Some(self)
    }
}

impl Instrument for StandardGauge {
    fn as_gauge(self: Arc<Self>) -> Option<Arc<dyn GaugeStat>> {
        Some(self)
    }
}

impl Instrument for StandardGaugeF64 {
    fn as_gauge_f64(self: Arc<Self>) -> Option<Arc<dyn GaugeF64Stat>> {
        Some(self)
    }
}

impl Instrument for StandardHistogram {
    fn as_histogram(self: Arc<Self>) -> Option<Arc<dyn HistogramStat>> {
        Some(self)
    }
}

impl Instrument for StandardMeter {
    fn as_meter(self: Arc<Self>) -> Option<Arc<dyn MeterStat>> {
        Some(self)
    }
}

impl Instrument for StandardTimer {
    fn as_timer(self: Arc<Self>) -> Option<Arc<dyn TimerStat>> {
        Some(self)
    }
}
