//! Reporter integration tests: registration, flushing and lifecycle.

mod common;

use common::{bucket_of, bucket_value, test_reporter, RecordingClient};
use fluxmetrics::metrics::{
    register, Counter, FieldValue, Gauge, GaugeF64, Histogram, Meter, Metric, MetricOptions, Point,
    Tags, Timer,
};
use fluxmetrics::reporter::DbClient;
use fluxmetrics::stats::{
    GaugeStat, HistogramSnapshot, HistogramStat, Instrument, MeterSnapshot, MeterStat, StandardHistogram,
    StandardMeter, StandardTimer, TimerSnapshot, TimerStat,
};
use fluxmetrics::{MetricsError, Registry, Reporter, ReporterState};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

const INTERVAL: Duration = Duration::from_secs(1);

fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn spawn_run(reporter: &Arc<Reporter>) -> tokio::task::JoinHandle<()> {
    let reporter = Arc::clone(reporter);
    tokio::spawn(async move { reporter.run().await })
}

#[tokio::test(start_paused = true)]
async fn test_counter_flush() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);
    let counter = Counter::new("requests", MetricOptions::new().reporter(&reporter).measurement("http"));
    for i in 0..10 {
        counter.inc(i);
    }

    let handle = spawn_run(&reporter);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    reporter.stop();
    handle.await.unwrap();

    let batches = client.batches();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].database, "testdb");
    assert_eq!(
        batches[0].points,
        vec![Point {
            measurement: "http".to_string(),
            tags: None,
            fields: [("requests.count".to_string(), FieldValue::Integer(45))]
                .into_iter()
                .collect(),
        }]
    );
}

#[test]
fn test_timer_points_carry_merged_tags() {
    let client = RecordingClient::new();
    let reporter = Reporter::builder("", "testdb")
        .registry(&Arc::new(Registry::new()))
        .tags(tags(&[("host", "h1"), ("env", "prod")]))
        .client(Arc::clone(&client) as Arc<dyn DbClient>)
        .build()
        .unwrap();

    let timer = Timer::new(
        "load",
        MetricOptions::new()
            .reporter(&reporter)
            .tags(tags(&[("host", "h2"), ("job", "import")])),
    );
    timer.update(Duration::from_secs(5));

    let points = reporter.collect_points();
    assert_eq!(points.len(), 16);
    for point in &points {
        let point_tags = point.tags.as_ref().unwrap();
        assert_eq!(point_tags.get("host").unwrap(), "h2");
        assert_eq!(point_tags.get("env").unwrap(), "prod");
        assert_eq!(point_tags.get("job").unwrap(), "import");
        assert!(bucket_of(point).is_some());
    }
    assert_eq!(bucket_value(&points, "count", "load.timer"), Some(1.0));
}

#[test]
fn test_meter_and_histogram_bucket_counts() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);

    Meter::new("events", MetricOptions::new().reporter(&reporter)).mark(5);
    let points = reporter.collect_points();
    assert_eq!(points.len(), 5);
    assert!(points.iter().all(|p| bucket_of(p).is_some()));
    assert_eq!(bucket_value(&points, "count", "events.meter"), Some(5.0));

    let histogram = Histogram::new("sizes", MetricOptions::new().reporter(&reporter));
    for v in 0..10 {
        histogram.update(v);
    }
    let points = reporter.collect_points();
    assert_eq!(points.len(), 5 + 12);
    assert_eq!(bucket_value(&points, "max", "sizes.histogram"), Some(9.0));
}

#[tokio::test(start_paused = true)]
async fn test_huge_histogram_values_are_flushed() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);
    let histogram = Histogram::new("epochs", MetricOptions::new().reporter(&reporter));
    for _ in 0..6 {
        histogram.update(1_700_000_000_000_000_000);
    }
    let timer = Timer::new("stuck", MetricOptions::new().reporter(&reporter));
    timer.update(Duration::MAX);
    timer.update(Duration::MAX);

    let handle = spawn_run(&reporter);
    tokio::time::sleep(Duration::from_millis(1_500)).await;
    assert_eq!(reporter.state(), ReporterState::Running);
    reporter.stop();
    handle.await.unwrap();

    let batches = client.batches();
    assert_eq!(batches.len(), 1);
    let points = &batches[0].points;
    assert_eq!(points.len(), 12 + 16);
    assert_eq!(bucket_value(points, "count", "epochs.histogram"), Some(6.0));
    assert_eq!(bucket_value(points, "max", "stuck.timer"), Some(i64::MAX as f64));
    assert!(bucket_value(points, "mean", "epochs.histogram").unwrap() >= 1.6e18);
}

#[test]
fn test_registration_is_idempotent() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);

    let a = Counter::new("hits", MetricOptions::new().reporter(&reporter));
    let b = Counter::new("hits", MetricOptions::new().reporter(&reporter));
    assert!(Arc::ptr_eq(&a, &b));

    a.inc(2);
    b.inc(3);
    assert_eq!(a.count(), 5);
    assert_eq!(reporter.registry().len(), 1);
}

#[test]
fn test_concurrent_registration_has_one_winner() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let reporter = Arc::clone(&reporter);
            std::thread::spawn(move || {
                let counter = Counter::new("shared", MetricOptions::new().reporter(&reporter));
                counter.inc(1);
                counter
            })
        })
        .collect();
    let counters: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert!(counters.iter().all(|c| Arc::ptr_eq(c, &counters[0])));
    assert_eq!(counters[0].count(), 8);
    assert_eq!(reporter.registry().names(), vec!["default/shared.count".to_string()]);
}

#[test]
fn test_conflicting_kinds_are_disambiguated() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);
    let opts = || MetricOptions::new().reporter(&reporter);

    let counter = Counter::new("x", opts());
    let gauge = Gauge::new("x", opts());
    let gauge_f64 = GaugeF64::new("x", opts());

    assert_eq!(
        reporter.registry().names(),
        vec![
            "default/x.count".to_string(),
            "default/x.gauge".to_string(),
            "default/x1.gauge".to_string(),
        ]
    );

    assert!(Arc::ptr_eq(&gauge, &Gauge::new("x", opts())));
    assert!(Arc::ptr_eq(&gauge_f64, &GaugeF64::new("x", opts())));
    assert!(Arc::ptr_eq(&counter, &Counter::new("x", opts())));
    assert_eq!(reporter.registry().len(), 3);

    counter.inc(1);
    gauge.update(2);
    gauge_f64.update(0.5);
    let mut values: Vec<f64> = reporter
        .collect_points()
        .iter()
        .flat_map(|p| p.fields.values().map(FieldValue::as_f64).collect::<Vec<_>>())
        .collect();
    values.sort_by(f64::total_cmp);
    assert_eq!(values, vec![0.5, 1.0, 2.0]);
}

#[tokio::test(start_paused = true)]
async fn test_stop_halts_writes_and_pings() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);
    Gauge::new("depth", MetricOptions::new().reporter(&reporter)).update(1);

    let handle = spawn_run(&reporter);
    tokio::time::sleep(Duration::from_millis(5_500)).await;
    assert_eq!(client.writes(), 5);
    assert_eq!(client.pings(), 1);

    reporter.stop();
    handle.await.unwrap();
    assert_eq!(reporter.state(), ReporterState::Stopped);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(client.writes(), 5);
    assert_eq!(client.pings(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_second_run_is_a_no_op() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);

    let handle = spawn_run(&reporter);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(reporter.state(), ReporterState::Running);

    // Returns at once instead of running a second pair of loops.
    reporter.run().await;
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(client.writes(), 1);

    reporter.stop();
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_write_errors_do_not_stop_the_loop() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);
    let counter = Counter::new("jobs", MetricOptions::new().reporter(&reporter));
    counter.inc(1);
    client.fail_writes(true);

    let handle = spawn_run(&reporter);
    tokio::time::sleep(Duration::from_millis(2_500)).await;
    assert_eq!(client.writes(), 2);
    assert!(client.batches().is_empty());

    client.fail_writes(false);
    counter.inc(1);
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    reporter.stop();
    handle.await.unwrap();

    let points = client.last_points();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].fields.get("jobs.count"), Some(&FieldValue::Integer(2)));
}

struct CustomGauge(AtomicI64);

impl GaugeStat for CustomGauge {
    fn update(&self, value: i64) {
        self.0.store(value, Ordering::Relaxed);
    }

    fn value(&self) -> i64 {
        self.0.load(Ordering::Relaxed)
    }
}

impl Instrument for CustomGauge {
    fn as_gauge(self: Arc<Self>) -> Option<Arc<dyn GaugeStat>> {
        Some(self)
    }
}

struct NotAMetric;
impl Instrument for NotAMetric {}

#[test]
fn test_register_resolves_capabilities() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);

    let err = register("nothing", Arc::new(NotAMetric), MetricOptions::new().reporter(&reporter)).unwrap_err();
    assert!(matches!(err, MetricsError::UnknownMetricKind(_)));
    assert!(reporter.registry().is_empty());

    let custom = Arc::new(CustomGauge(AtomicI64::new(0)));
    register(
        "custom",
        Arc::clone(&custom) as Arc<dyn Instrument>,
        MetricOptions::new().reporter(&reporter).measurement("ext"),
    )
    .unwrap();
    custom.update(77);

    let points = reporter.collect_points();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].measurement, "ext");
    assert_eq!(points[0].fields.get("custom.gauge"), Some(&FieldValue::Integer(77)));
}

/// Exposes timer, meter and histogram views of one set of measurements.
struct Stopwatch {
    timer: StandardTimer,
    meter: StandardMeter,
    histogram: StandardHistogram,
}

impl TimerStat for Stopwatch {
    fn update(&self, elapsed: Duration) {
        self.timer.update(elapsed);
    }

    fn snapshot(&self) -> TimerSnapshot {
        self.timer.snapshot()
    }
}

impl MeterStat for Stopwatch {
    fn mark(&self, n: i64) {
        self.meter.mark(n);
    }

    fn snapshot(&self) -> MeterSnapshot {
        self.meter.snapshot()
    }
}

impl HistogramStat for Stopwatch {
    fn update(&self, value: i64) {
        self.histogram.update(value);
    }

    fn clear(&self) {
        self.histogram.clear();
    }

    fn count(&self) -> i64 {
        self.histogram.count()
    }

    fn snapshot(&self) -> HistogramSnapshot {
        self.histogram.snapshot()
    }
}

impl Instrument for Stopwatch {
    fn as_histogram(self: Arc<Self>) -> Option<Arc<dyn HistogramStat>> {
        Some(self)
    }

    fn as_meter(self: Arc<Self>) -> Option<Arc<dyn MeterStat>> {
        Some(self)
    }

    fn as_timer(self: Arc<Self>) -> Option<Arc<dyn TimerStat>> {
        Some(self)
    }
}

#[test]
fn test_timer_wins_over_meter_and_histogram() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);
    let stopwatch = Arc::new(Stopwatch {
        timer: StandardTimer::new(),
        meter: StandardMeter::new(),
        histogram: StandardHistogram::new(),
    });

    register("watch", stopwatch, MetricOptions::new().reporter(&reporter)).unwrap();

    assert_eq!(reporter.registry().names(), vec!["default/watch.timer".to_string()]);
    assert_eq!(reporter.collect_points().len(), 16);
}

struct Constant;

impl Metric for Constant {
    fn add_points(&self, points: &mut Vec<Point>) {
        points.push(Point {
            measurement: "const".to_string(),
            tags: None,
            fields: [("answer".to_string(), FieldValue::Integer(42))]
                .into_iter()
                .collect(),
        });
    }
}

#[test]
fn test_reporter_register_and_get() {
    let client = RecordingClient::new();
    let reporter = test_reporter(&client, INTERVAL);

    reporter.register("const", Arc::new(Constant)).unwrap();
    assert!(matches!(
        reporter.register("const", Arc::new(Constant)),
        Err(MetricsError::DuplicateMetric(_))
    ));

    let metric = reporter.get("const").unwrap();
    let mut points = Vec::new();
    metric.add_points(&mut points);
    assert_eq!(points[0].fields.get("answer"), Some(&FieldValue::Integer(42)));
    assert_eq!(reporter.collect_points(), points);
}
