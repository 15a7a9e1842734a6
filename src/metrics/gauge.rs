//! Integer and floating point gauge adapters.

use super::naming::{register_or_get, Descriptor, MetricKind, Registrable};
use super::options::MetricOptions;
use super::point::{make_point, Fields, Point};
use super::Metric;
use crate::reporter::Reporter;
use crate::stats::{GaugeF64Stat, GaugeStat, StandardGauge, StandardGaugeF64, Stat};
use std::sync::Arc;

/// An integer gauge reported as a single `<name>.gauge` field.
pub struct Gauge {
    stat: Arc<dyn GaugeStat>,
    desc: Descriptor,
}

impl Gauge {
    /// Create a gauge or retrieve the existing gauge with the same name.
    pub fn new(name: impl Into<String>, options: MetricOptions) -> Arc<Gauge> {
        let reporter = options.resolve_reporter();
        let gauge = Arc::new(Self::build(name.into(), &options, reporter.as_ref()));
        register_or_get(gauge, reporter.as_ref())
    }

    pub(crate) fn build(
        name: String,
        options: &MetricOptions,
        reporter: Option<&Arc<Reporter>>,
    ) -> Self {
        let stat = match &options.stat {
            Some(Stat::Gauge(stat)) => Arc::clone(stat),
            _ => Arc::new(StandardGauge::new()),
        };
        Self {
            stat,
            desc: Descriptor::new(name, MetricKind::Gauge, options, reporter),
        }
    }

    pub fn update(&self, value: i64) {
        self.stat.update(value);
    }

    pub fn value(&self) -> i64 {
        self.stat.value()
    }

    /// The wrapped statistic
    pub fn stat(&self) -> &Arc<dyn GaugeStat> {
        &self.stat
    }
}

impl Metric for Gauge {
    fn add_points(&self, points: &mut Vec<Point>) {
        let mut fields = Fields::new();
        fields.insert(self.desc.field_name.clone(), self.stat.value().into());
        points.push(make_point(&self.desc.measurement, fields, self.desc.tags.clone()));
    }
}

impl Registrable for Gauge {
    fn descriptor(&self) -> &Descriptor {
        &self.desc
    }
}

/// A floating point gauge, also reported as `<name>.gauge`.
pub struct GaugeF64 {
    stat: Arc<dyn GaugeF64Stat>,
    desc: Descriptor,
}

impl GaugeF64 {
    /// Create a gauge or retrieve the existing float gauge with the same name.
    pub fn new(name: impl Into<String>, options: MetricOptions) -> Arc<GaugeF64> {
        let reporter = options.resolve_reporter();
        let gauge = Arc::new(Self::build(name.into(), &options, reporter.as_ref()));
        register_or_get(gauge, reporter.as_ref())
    }

    pub(crate) fn build(
        name: String,
        options: &MetricOptions,
        reporter: Option<&Arc<Reporter>>,
    ) -> Self {
        let stat = match &options.stat {
            Some(Stat::GaugeF64(stat)) => Arc::clone(stat),
            _ => Arc::new(StandardGaugeF64::new()),
        };
        Self {
            stat,
            desc: Descriptor::new(name, MetricKind::GaugeF64, options, reporter),
        }
    }

    pub fn update(&self, value: f64) {
        self.stat.update(value);
    }

    pub fn value(&self) -> f64 {
        self.stat.value()
    }

    /// The wrapped statistic
    pub fn stat(&self) -> &Arc<dyn GaugeF64Stat> {
        &self.stat
    }
}

impl Metric for GaugeF64 {
    fn add_points(&self, points: &mut Vec<Point>) {
        let mut fields = Fields::new();
        fields.insert(self.desc.field_name.clone(), self.stat.value().into());
        points.push(make_point(&self.desc.measurement, fields, self.desc.tags.clone()));
    }
}

impl Registrable for GaugeF64 {
    fn descriptor(&self) -> &Descriptor {
        &self.desc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::point::FieldValue;

    #[test]
    fn test_gauge_reports_last_value() {
        let gauge = Gauge::build("queue".into(), &MetricOptions::new(), None);
        gauge.update(3);
        gauge.update(9);

        let mut points = Vec::new();
        gauge.add_points(&mut points);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].measurement, "default");
        assert_eq!(points[0].fields.get("queue.gauge"), Some(&FieldValue::Integer(9)));
        assert!(points[0].tags.is_none());
    }

    #[test]
    fn test_gauge_f64_reports_float() {
        let gauge = GaugeF64::build("load".into(), &MetricOptions::new(), None);
        gauge.update(5.542);

        let mut points = Vec::new();
        gauge.add_points(&mut points);

        assert_eq!(points[0].fields.get("load.gauge"), Some(&FieldValue::Float(5.542)));
    }

    #[test]
    fn test_mismatched_stat_is_ignored() {
        let counter = Arc::new(crate::stats::StandardCounter::new());
        let gauge = Gauge::build(
            "mismatch".into(),
            &MetricOptions::new().stat(Stat::Counter(counter)),
            None,
        );
        assert_eq!(gauge.value(), 0);
    }
}
