//! Meter adapter.

use super::buckets::{self, BucketLayout, METER_BUCKETS};
use super::naming::{register_or_get, Descriptor, MetricKind, Registrable};
use super::options::MetricOptions;
use super::point::Point;
use super::Metric;
use crate::reporter::Reporter;
use crate::stats::{MeterSnapshot, MeterStat, StandardMeter, Stat};
use std::sync::Arc;

/// A meter expanded into count, the three moving rates and the mean rate.
pub struct Meter {
    stat: Arc<dyn MeterStat>,
    desc: Descriptor,
    layout: BucketLayout,
}

impl Meter {
    /// Create a meter or retrieve the existing meter with the same name.
    pub fn new(name: impl Into<String>, options: MetricOptions) -> Arc<Meter> {
        let reporter = options.resolve_reporter();
        let meter = Arc::new(Self::build(name.into(), &options, reporter.as_ref()));
        register_or_get(meter, reporter.as_ref())
    }

    pub(crate) fn build(
        name: String,
        options: &MetricOptions,
        reporter: Option<&Arc<Reporter>>,
    ) -> Self {
        let stat = match &options.stat {
            Some(Stat::Meter(stat)) => Arc::clone(stat),
            _ => Arc::new(StandardMeter::new()),
        };
        let desc = Descriptor::new(name, MetricKind::Meter, options, reporter);
        let layout = BucketLayout::new(&METER_BUCKETS, &desc);
        Self { stat, desc, layout }
    }

    pub fn mark(&self, n: i64) {
        self.stat.mark(n);
    }

    pub fn snapshot(&self) -> MeterSnapshot {
        self.stat.snapshot()
    }

    /// The wrapped statistic
    pub fn stat(&self) -> &Arc<dyn MeterStat> {
        &self.stat
    }
}

/// Value of a rate bucket. The meter reports its mean rate as `mean`,
/// the timer as `meanrate`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn rate_value(snapshot: &MeterSnapshot, bucket: &str) -> Option<f64> {
    match bucket {
        buckets::COUNT => Some(snapshot.count as f64),
        buckets::M1 => Some(snapshot.rate1),
        buckets::M5 => Some(snapshot.rate5),
        buckets::M15 => Some(snapshot.rate15),
        buckets::MEAN | buckets::MEANRATE => Some(snapshot.rate_mean),
        _ => None,
    }
}

impl Metric for Meter {
    fn add_points(&self, points: &mut Vec<Point>) {
        let snapshot = self.stat.snapshot();
        self.layout
            .emit(points, |bucket| rate_value(&snapshot, bucket).unwrap_or_default());
    }
}

impl Registrable for Meter {
    fn descriptor(&self) -> &Descriptor {
        &self.desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::point::BUCKET_TAG;
    use std::collections::BTreeSet;

    #[test]
    fn test_meter_expands_to_five_buckets() {
        let meter = Meter::build("events".into(), &MetricOptions::new(), None);
        meter.mark(1);
        meter.mark(3);

        let mut points = Vec::new();
        meter.add_points(&mut points);

        assert_eq!(points.len(), 5);
        let seen: BTreeSet<_> = points
            .iter()
            .map(|p| p.tags.as_ref().unwrap().get(BUCKET_TAG).unwrap().clone())
            .collect();
        let expected: BTreeSet<_> = ["count", "m1", "m5", "m15", "mean"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(seen, expected);

        let count = points
            .iter()
            .find(|p| p.tags.as_ref().unwrap().get(BUCKET_TAG).unwrap() == "count")
            .unwrap();
        assert_eq!(count.fields.get("events.meter").unwrap().as_f64(), 4.0);
    }

    #[test]
    fn test_rate_value_mapping() {
        let snapshot = MeterSnapshot {
            count: 2,
            rate1: 1.0,
            rate5: 5.0,
            rate15: 15.0,
            rate_mean: 0.5,
        };
        assert_eq!(rate_value(&snapshot, "m15"), Some(15.0));
        assert_eq!(rate_value(&snapshot, "meanrate"), Some(0.5));
        assert_eq!(rate_value(&snapshot, "p99"), None);
    }
}
