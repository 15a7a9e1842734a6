//! Options applied when a metric is created.

use super::point::Tags;
use crate::reporter::Reporter;
use crate::stats::Stat;
use std::sync::Arc;

/// Builder-style options for metric constructors.
///
/// ```
/// use fluxmetrics::metrics::{Counter, MetricOptions};
///
/// let requests = Counter::new(
///     "requests",
///     MetricOptions::new().measurement("http").tag("route", "/health"),
/// );
/// requests.inc(1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetricOptions {
    pub(crate) reporter: Option<Arc<Reporter>>,
    pub(crate) measurement: Option<String>,
    pub(crate) tags: Option<Tags>,
    pub(crate) stat: Option<Stat>,
}

impl MetricOptions {
    /// Empty options: default reporter, measurement `default`, no tags
    pub fn new() -> Self {
        Self::default()
    }

    /// Register with this reporter instead of the default one
    pub fn reporter(mut self, reporter: &Arc<Reporter>) -> Self {
        self.reporter = Some(Arc::clone(reporter));
        self
    }

    /// Measurement the points are written to
    pub fn measurement(mut self, measurement: impl Into<String>) -> Self {
        self.measurement = Some(measurement.into());
        self
    }

    /// Metric tags; they extend and override the reporter tags
    pub fn tags(mut self, tags: Tags) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Add a single metric tag
    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags
            .get_or_insert_with(Tags::new)
            .insert(key.into(), value.into());
        self
    }

    /// Wrap an existing statistic instead of creating a new one.
    /// Ignored when its kind does not match the metric being built.
    pub fn stat(mut self, stat: Stat) -> Self {
        self.stat = Some(stat);
        self
    }

    /// The explicit reporter, falling back to the default reporter
    pub(crate) fn resolve_reporter(&self) -> Option<Arc<Reporter>> {
        self.reporter
            .as_ref()
            .map(Arc::clone)
            .or_else(super::default_reporter)
    }
}
