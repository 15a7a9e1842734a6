//! Histograms backed by an HDR histogram.
//!
//! Values are bucketed with two significant figures, so memory grows with
//! the range of recorded values rather than their number. Minimum and
//! maximum are tracked exactly next to the buckets. Negative values are
//! recorded as zero.

use hdrhistogram::Histogram as Hdr;
use parking_lot::Mutex;

/// Significant decimal digits kept by each bucket
pub const SIGNIFICANT_FIGURES: u8 = 2;

/// A distribution of integer values.
pub trait HistogramStat: Send + Sync {
    /// Record a value
    fn update(&self, value: i64);
    /// Drop all recorded values
    fn clear(&self);
    /// Number of recorded values
    fn count(&self) -> i64;
    /// Point-in-time copy of the distribution
    fn snapshot(&self) -> HistogramSnapshot;
}

fn empty_distribution() -> Hdr<u64> {
    Hdr::new(SIGNIFICANT_FIGURES).expect("two significant figures are within hdrhistogram's range")
}

fn clamp(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

#[derive(Debug, Clone)]
struct Distribution {
    buckets: Hdr<u64>,
    min: i64,
    max: i64,
}

impl Distribution {
    fn new() -> Self {
        Self {
            buckets: empty_distribution(),
            min: 0,
            max: 0,
        }
    }

    fn record(&mut self, value: i64) {
        let value = value.max(0);
        if self.buckets.len() == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.buckets.saturating_record(clamp(value));
    }

    fn reset(&mut self) {
        self.buckets.reset();
        self.min = 0;
        self.max = 0;
    }

    #[allow(clippy::cast_possible_wrap)]
    fn count(&self) -> i64 {
        self.buckets.len() as i64
    }
}

/// Default histogram implementation.
#[derive(Debug)]
pub struct StandardHistogram {
    inner: Mutex<Distribution>,
}

impl StandardHistogram {
    /// Create an empty histogram
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Distribution::new()),
        }
    }
}

impl Default for StandardHistogram {
    fn default() -> Self {
        Self::new()
    }
}

impl HistogramStat for StandardHistogram {
    fn update(&self, value: i64) {
        self.inner.lock().record(value);
    }

    fn clear(&self) {
        self.inner.lock().reset();
    }

    fn count(&self) -> i64 {
        self.inner.lock().count()
    }

    fn snapshot(&self) -> HistogramSnapshot {
        let inner = self.inner.lock();
        HistogramSnapshot {
            count: inner.count(),
            distribution: inner.clone(),
        }
    }
}

/// Immutable view of a histogram.
#[derive(Debug, Clone)]
pub struct HistogramSnapshot {
    count: i64,
    distribution: Distribution,
}

impl Default for HistogramSnapshot {
    fn default() -> Self {
        Self {
            count: 0,
            distribution: Distribution::new(),
        }
    }
}

impl PartialEq for HistogramSnapshot {
    fn eq(&self, other: &Self) -> bool {
        self.count == other.count
            && self.distribution.min == other.distribution.min
            && self.distribution.max == other.distribution.max
            && self.distribution.buckets == other.distribution.buckets
    }
}

impl HistogramSnapshot {
    /// Build a snapshot from a total count and a set of recorded values.
    ///
    /// `count` may exceed `values.len()` for implementations that only keep
    /// a sample of what was recorded.
    pub fn from_values(count: i64, values: Vec<i64>) -> Self {
        let mut distribution = Distribution::new();
        for value in values {
            distribution.record(value);
        }
        Self {
            count,
            distribution,
        }
    }

    /// Number of recorded values
    pub fn count(&self) -> i64 {
        self.count
    }

    /// Smallest recorded value, 0 when empty
    pub fn min(&self) -> i64 {
        self.distribution.min
    }

    /// Largest recorded value, 0 when empty
    pub fn max(&self) -> i64 {
        self.distribution.max
    }

    /// Arithmetic mean of the recorded values
    pub fn mean(&self) -> f64 {
        self.distribution.buckets.mean()
    }

    /// Population variance of the recorded values
    pub fn variance(&self) -> f64 {
        let sd = self.std_dev();
        sd * sd
    }

    /// Standard deviation of the recorded values
    pub fn std_dev(&self) -> f64 {
        self.distribution.buckets.stdev()
    }

    /// Value at quantile `q` (0.0..=1.0)
    pub fn percentile(&self, q: f64) -> f64 {
        self.percentiles(&[q])[0]
    }

    /// Values at each requested quantile.
    #[allow(clippy::cast_precision_loss)]
    pub fn percentiles(&self, qs: &[f64]) -> Vec<f64> {
        let buckets = &self.distribution.buckets;
        if buckets.len() == 0 {
            return vec![0.0; qs.len()];
        }
        qs.iter()
            .map(|&q| buckets.value_at_quantile(q) as f64)
            .collect()
    }
}
