//! Timers: a histogram of durations plus a meter of how often they occur.

use super::histogram::{HistogramSnapshot, HistogramStat, StandardHistogram};
use super::meter::{MeterSnapshot, MeterStat, StandardMeter};
use std::time::{Duration, Instant};

/// Records durations and the rate at which they are recorded.
pub trait TimerStat: Send + Sync {
    /// Record a duration
    fn update(&self, elapsed: Duration);

    /// Record the time elapsed since `start`
    fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Point-in-time copy of the distribution and rates
    fn snapshot(&self) -> TimerSnapshot;
}

/// Immutable view of a timer. Durations are in nanoseconds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TimerSnapshot {
    pub histogram: HistogramSnapshot,
    pub meter: MeterSnapshot,
}

impl TimerSnapshot {
    /// Number of recorded durations
    pub fn count(&self) -> i64 {
        self.histogram.count()
    }
}

/// Timer composed of a [`StandardHistogram`] and a [`StandardMeter`].
#[derive(Debug)]
pub struct StandardTimer {
    histogram: StandardHistogram,
    meter: StandardMeter,
}

impl StandardTimer {
    /// Create an empty timer
    pub fn new() -> Self {
        Self {
            histogram: StandardHistogram::new(),
            meter: StandardMeter::new(),
        }
    }
}

impl Default for StandardTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerStat for StandardTimer {
    fn update(&self, elapsed: Duration) {
        let nanos = i64::try_from(elapsed.as_nanos()).unwrap_or(i64::MAX);
        self.histogram.update(nanos);
        self.meter.mark(1);
    }

    fn snapshot(&self) -> TimerSnapshot {
        TimerSnapshot {
            histogram: self.histogram.snapshot(),
            meter: self.meter.snapshot(),
        }
    }
}
