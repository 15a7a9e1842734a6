//! Counter adapter.

use super::naming::{register_or_get, Descriptor, MetricKind, Registrable};
use super::options::MetricOptions;
use super::point::{make_point, Fields, Point};
use super::Metric;
use crate::reporter::Reporter;
use crate::stats::{CounterStat, StandardCounter, Stat};
use std::sync::Arc;

/// A counter reported as a single `<name>.count` field.
pub struct Counter {
    stat: Arc<dyn CounterStat>,
    desc: Descriptor,
}

impl Counter {
    /// Create a counter or retrieve the existing counter with the same name.
    pub fn new(name: impl Into<String>, options: MetricOptions) -> Arc<Counter> {
        let reporter = options.resolve_reporter();
        let counter = Arc::new(Self::build(name.into(), &options, reporter.as_ref()));
        register_or_get(counter, reporter.as_ref())
    }

    pub(crate) fn build(
        name: String,
        options: &MetricOptions,
        reporter: Option<&Arc<Reporter>>,
    ) -> Self {
        let stat = match &options.stat {
            Some(Stat::Counter(stat)) => Arc::clone(stat),
            _ => Arc::new(StandardCounter::new()),
        };
        Self {
            stat,
            desc: Descriptor::new(name, MetricKind::Counter, options, reporter),
        }
    }

    pub fn inc(&self, n: i64) {
        self.stat.inc(n);
    }

    pub fn dec(&self, n: i64) {
        self.stat.dec(n);
    }

    pub fn clear(&self) {
        self.stat.clear();
    }

    pub fn count(&self) -> i64 {
        self.stat.count()
    }

    /// The wrapped statistic
    pub fn stat(&self) -> &Arc<dyn CounterStat> {
        &self.stat
    }
}

impl Metric for Counter {
    fn add_points(&self, points: &mut Vec<Point>) {
        let mut fields = Fields::new();
        fields.insert(self.desc.field_name.clone(), self.stat.count().into());
        points.push(make_point(&self.desc.measurement, fields, self.desc.tags.clone()));
    }
}

impl Registrable for Counter {
    fn descriptor(&self) -> &Descriptor {
        &self.desc
    }
}
