//! Histogram adapter.

use super::buckets::{self, percentile_index, BucketLayout, HISTOGRAM_BUCKETS, PERCENTILES};
use super::naming::{register_or_get, Descriptor, MetricKind, Registrable};
use super::options::MetricOptions;
use super::point::Point;
use super::Metric;
use crate::reporter::Reporter;
use crate::stats::{HistogramSnapshot, HistogramStat, StandardHistogram, Stat};
use std::sync::Arc;

/// A histogram expanded into one point per statistic, tagged `bucket=<stat>`.
pub struct Histogram {
    stat: Arc<dyn HistogramStat>,
    desc: Descriptor,
    layout: BucketLayout,
}

impl Histogram {
    /// Create a histogram or retrieve the existing histogram with the same name.
    pub fn new(name: impl Into<String>, options: MetricOptions) -> Arc<Histogram> {
        let reporter = options.resolve_reporter();
        let histogram = Arc::new(Self::build(name.into(), &options, reporter.as_ref()));
        register_or_get(histogram, reporter.as_ref())
    }

    pub(crate) fn build(
        name: String,
        options: &MetricOptions,
        reporter: Option<&Arc<Reporter>>,
    ) -> Self {
        let stat = match &options.stat {
            Some(Stat::Histogram(stat)) => Arc::clone(stat),
            _ => Arc::new(StandardHistogram::new()),
        };
        let desc = Descriptor::new(name, MetricKind::Histogram, options, reporter);
        let layout = BucketLayout::new(&HISTOGRAM_BUCKETS, &desc);
        Self { stat, desc, layout }
    }

    pub fn update(&self, value: i64) {
        self.stat.update(value);
    }

    pub fn clear(&self) {
        self.stat.clear();
    }

    pub fn count(&self) -> i64 {
        self.stat.count()
    }

    pub fn snapshot(&self) -> HistogramSnapshot {
        self.stat.snapshot()
    }

    /// The wrapped statistic
    pub fn stat(&self) -> &Arc<dyn HistogramStat> {
        &self.stat
    }
}

/// Value of a distribution bucket; `None` for buckets a histogram does not carry.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn distribution_value(
    snapshot: &HistogramSnapshot,
    percentiles: &[f64],
    bucket: &str,
) -> Option<f64> {
    if let Some(idx) = percentile_index(bucket) {
        return percentiles.get(idx).copied();
    }
    let value = match bucket {
        buckets::COUNT => snapshot.count() as f64,
        buckets::MAX => snapshot.max() as f64,
        buckets::MEAN => snapshot.mean(),
        buckets::MIN => snapshot.min() as f64,
        buckets::STDDEV => snapshot.std_dev(),
        buckets::VARIANCE => snapshot.variance(),
        _ => return None,
    };
    Some(value)
}

impl Metric for Histogram {
    fn add_points(&self, points: &mut Vec<Point>) {
        let snapshot = self.stat.snapshot();
        let percentiles = snapshot.percentiles(&PERCENTILES);
        self.layout.emit(points, |bucket| {
            distribution_value(&snapshot, &percentiles, bucket).unwrap_or_default()
        });
    }
}

impl Registrable for Histogram {
    fn descriptor(&self) -> &Descriptor {
        &self.desc
    }
}
