//! Timer adapter.

use super::buckets::{BucketLayout, PERCENTILES, TIMER_BUCKETS};
use super::histogram::distribution_value;
use super::meter::rate_value;
use super::naming::{register_or_get, Descriptor, MetricKind, Registrable};
use super::options::MetricOptions;
use super::point::Point;
use super::Metric;
use crate::reporter::Reporter;
use crate::stats::{StandardTimer, Stat, TimerSnapshot, TimerStat};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A timer reported as a duration distribution (nanoseconds) plus its rates.
pub struct Timer {
    stat: Arc<dyn TimerStat>,
    desc: Descriptor,
    layout: BucketLayout,
}

impl Timer {
    /// Create a timer or retrieve the existing timer with the same name.
    pub fn new(name: impl Into<String>, options: MetricOptions) -> Arc<Timer> {
        let reporter = options.resolve_reporter();
        let timer = Arc::new(Self::build(name.into(), &options, reporter.as_ref()));
        register_or_get(timer, reporter.as_ref())
    }

    pub(crate) fn build(
        name: String,
        options: &MetricOptions,
        reporter: Option<&Arc<Reporter>>,
    ) -> Self {
        let stat = match &options.stat {
            Some(Stat::Timer(stat)) => Arc::clone(stat),
            _ => Arc::new(StandardTimer::new()),
        };
        let desc = Descriptor::new(name, MetricKind::Timer, options, reporter);
        let layout = BucketLayout::new(&TIMER_BUCKETS, &desc);
        Self { stat, desc, layout }
    }

    pub fn update(&self, elapsed: Duration) {
        self.stat.update(elapsed);
    }

    /// Record the time elapsed since `start`
    pub fn update_since(&self, start: Instant) {
        self.stat.update_since(start);
    }

    /// Run `f` and record how long it took.
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.stat.update_since(start);
        out
    }

    /// Start timing now; calling the returned closure records the elapsed time.
    ///
    /// ```
    /// use fluxmetrics::metrics::{MetricOptions, Timer};
    ///
    /// let timer = Timer::new("load", MetricOptions::new());
    /// let done = timer.time_this();
    /// // ... work ...
    /// done();
    /// assert_eq!(timer.snapshot().count(), 1);
    /// ```
    pub fn time_this(&self) -> impl Fn() + '_ {
        let start = Instant::now();
        move || self.stat.update_since(start)
    }

    pub fn snapshot(&self) -> TimerSnapshot {
        self.stat.snapshot()
    }

    /// The wrapped statistic
    pub fn stat(&self) -> &Arc<dyn TimerStat> {
        &self.stat
    }
}

impl Metric for Timer {
    fn add_points(&self, points: &mut Vec<Point>) {
        let snapshot = self.stat.snapshot();
        let percentiles = snapshot.histogram.percentiles(&PERCENTILES);
        self.layout.emit(points, |bucket| {
            distribution_value(&snapshot.histogram, &percentiles, bucket)
                .or_else(|| rate_value(&snapshot.meter, bucket))
                .unwrap_or_default()
        });
    }
}

impl Registrable for Timer {
    fn descriptor(&self) -> &Descriptor {
        &self.desc
    }
}
