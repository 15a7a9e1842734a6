//! Periodic reporting of registered metrics.
//!
//! A [`Reporter`] owns a registry and a database client. While running it
//! drives two independent loops: a flush loop that snapshots every registry
//! entry into one batch per interval and writes it, and a liveness loop that
//! pings the database every [`PING_INTERVAL`]. Write and ping failures are
//! logged and the loops carry on.

pub mod client;
pub mod http;
pub mod line_protocol;

pub use client::{BatchPoints, ConnectionConfig, DbClient, Pong, WriteResponse};
pub use http::InfluxHttpClient;

use crate::core::{MetricsError, ReporterConfig, Result};
use crate::metrics::{wrap_stat, Metric, Point, Tags};
use crate::registry::{default_registry, Entry, Registry};
use chrono::{DateTime, DurationRound, Utc};
use parking_lot::RwLock;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace, warn};

/// Interval of the liveness loop
pub const PING_INTERVAL: Duration = Duration::from_secs(5);

/// Lifecycle of a reporter. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReporterState {
    Created = 0,
    Running = 1,
    Stopped = 2,
}

impl ReporterState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => ReporterState::Created,
            1 => ReporterState::Running,
            _ => ReporterState::Stopped,
        }
    }
}

struct ClientSlot {
    client: Arc<dyn DbClient>,
    /// Opened by the reporter itself, and therefore replaceable on ping failure
    owned: bool,
}

/// Flushes a registry to a time-series database.
pub struct Reporter {
    registry: Arc<Registry>,
    client: RwLock<Option<ClientSlot>>,
    connection: Option<ConnectionConfig>,
    database: String,
    interval: Duration,
    tags: Option<Tags>,
    align: bool,
    state: AtomicU8,
    shutdown: watch::Sender<bool>,
}

impl fmt::Debug for Reporter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reporter")
            .field("endpoint", &self.connection.as_ref().map(|c| c.url.as_str()))
            .field("database", &self.database)
            .field("interval", &self.interval)
            .field("tags", &self.tags)
            .field("align", &self.align)
            .field("state", &self.state())
            .field("metrics", &self.registry.len())
            .finish()
    }
}

impl Reporter {
    /// Start building a reporter for `endpoint` and `database`.
    pub fn builder(endpoint: impl Into<String>, database: impl Into<String>) -> ReporterBuilder {
        ReporterBuilder::from_config(ReporterConfig {
            endpoint: endpoint.into(),
            database: database.into(),
            ..ReporterConfig::default()
        })
    }

    /// Run the flush and liveness loops until [`Reporter::stop`] is called.
    ///
    /// Returns immediately, with a log line, when the reporter is already
    /// running or stopped, or when no database connection can be opened.
    pub async fn run(&self) {
        if let Err(current) = self.state.compare_exchange(
            ReporterState::Created as u8,
            ReporterState::Running as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            warn!(state = ?ReporterState::from_u8(current), "reporter is already running or stopped");
            return;
        }

        if let Err(e) = self.open() {
            error!(error = %e, "unable to connect to the metrics database");
            let _ = self.state.compare_exchange(
                ReporterState::Running as u8,
                ReporterState::Created as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            );
            return;
        }

        info!(
            database = %self.database,
            interval_ms = self.interval.as_millis() as u64,
            "metrics reporter started"
        );
        tokio::join!(
            self.flush_loop(self.shutdown.subscribe()),
            self.ping_loop(self.shutdown.subscribe()),
        );
        info!("metrics reporter stopped");
    }

    /// Signal both loops to exit. In-flight writes are not awaited.
    pub fn stop(&self) {
        let previous = self.state.swap(ReporterState::Stopped as u8, Ordering::AcqRel);
        debug!(previous = ?ReporterState::from_u8(previous), "stopping metrics reporter");
        self.shutdown.send_replace(true);
    }

    pub fn state(&self) -> ReporterState {
        ReporterState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Snapshot every registry entry into points.
    ///
    /// Bare statistics are wrapped in a throwaway adapter carrying the
    /// reporter tags. Opaque entries are skipped.
    pub fn collect_points(&self) -> Vec<Point> {
        let mut points = Vec::new();
        for (name, entry) in self.registry.entries() {
            match entry {
                Entry::Metric(metric) => metric.add_points(&mut points),
                Entry::Stat(stat) => wrap_stat(&name, stat, self.tags.as_ref()).add_points(&mut points),
                Entry::Opaque(_) => trace!(metric = %name, "skipping entry of unknown kind"),
            }
        }
        points
    }

    /// Register a custom metric under `name`.
    pub fn register(&self, name: impl Into<String>, metric: Arc<dyn Metric>) -> Result<()> {
        self.registry.register_metric(name, metric)
    }

    /// The metric registered under `name`, if it is a metric adapter.
    pub fn get(&self, name: &str) -> Option<Arc<dyn Metric>> {
        match self.registry.get(name)? {
            Entry::Metric(metric) => Some(metric),
            _ => None,
        }
    }

    /// Tags added to every metric registered through this reporter
    pub fn tags(&self) -> Option<&Tags> {
        self.tags.as_ref()
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn flush_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
                _ = ticker.tick() => self.flush().await,
            }
        }
        debug!("flush loop exited");
    }

    async fn ping_loop(&self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = interval_at(Instant::now() + PING_INTERVAL, PING_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                },
                _ = ticker.tick() => self.check_connection().await,
            }
        }
        debug!("liveness loop exited");
    }

    async fn flush(&self) {
        let points = self.collect_points();
        let count = points.len();
        match self.write(points).await {
            Ok(response) => debug!(points = count, status = response.status, "metrics flushed"),
            Err(e) => warn!(error = %e, category = e.category(), points = count, "unable to write points"),
        }
    }

    async fn write(&self, points: Vec<Point>) -> Result<WriteResponse> {
        let client = self
            .current_client()
            .ok_or_else(|| MetricsError::connection("no database client"))?;
        let batch = BatchPoints {
            points,
            database: self.database.clone(),
            time: self.batch_time(),
        };
        client.write(batch).await
    }

    /// Current time, truncated to a multiple of the interval when aligned
    fn batch_time(&self) -> DateTime<Utc> {
        let now = Utc::now();
        if !self.align {
            return now;
        }
        chrono::Duration::from_std(self.interval)
            .ok()
            .and_then(|step| now.duration_trunc(step).ok())
            .unwrap_or(now)
    }

    async fn check_connection(&self) {
        let Some(client) = self.current_client() else {
            self.reconnect();
            return;
        };
        match client.ping().await {
            Ok(pong) => trace!(
                latency_ms = pong.latency.as_millis() as u64,
                version = %pong.version,
                "metrics database is alive"
            ),
            Err(e) => {
                warn!(error = %e, "metrics database ping failed");
                self.reconnect();
            },
        }
    }

    /// Replace the client with a freshly opened one. Injected clients are kept.
    fn reconnect(&self) {
        let mut slot = self.client.write();
        if slot.as_ref().is_some_and(|s| !s.owned) {
            return;
        }
        match self.open_client() {
            Ok(client) => {
                *slot = Some(ClientSlot { client, owned: true });
                info!("reconnected to the metrics database");
            },
            Err(e) => error!(error = %e, "unable to reconnect to the metrics database"),
        }
    }

    /// Open a client unless one is already present.
    fn open(&self) -> Result<()> {
        let mut slot = self.client.write();
        if slot.is_some() {
            return Ok(());
        }
        let client = self.open_client()?;
        *slot = Some(ClientSlot { client, owned: true });
        Ok(())
    }

    fn open_client(&self) -> Result<Arc<dyn DbClient>> {
        let config = self
            .connection
            .clone()
            .ok_or_else(|| MetricsError::connection("no endpoint configured"))?;
        Ok(Arc::new(InfluxHttpClient::open(config)?))
    }

    fn current_client(&self) -> Option<Arc<dyn DbClient>> {
        self.client.read().as_ref().map(|slot| Arc::clone(&slot.client))
    }
}

/// Builder for [`Reporter`].
pub struct ReporterBuilder {
    config: ReporterConfig,
    registry: Option<Arc<Registry>>,
    client: Option<Arc<dyn DbClient>>,
}

impl ReporterBuilder {
    /// Start from a loaded configuration
    pub fn from_config(config: ReporterConfig) -> Self {
        Self {
            config,
            registry: None,
            client: None,
        }
    }

    /// Flush interval, 10 seconds by default
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Tags added to every metric of this reporter
    pub fn tags(mut self, tags: Tags) -> Self {
        self.config.tags = Some(tags);
        self
    }

    /// Use `registry` instead of the process-wide default registry
    pub fn registry(mut self, registry: &Arc<Registry>) -> Self {
        self.registry = Some(Arc::clone(registry));
        self
    }

    /// Truncate batch timestamps to a multiple of the interval
    pub fn align(mut self, align: bool) -> Self {
        self.config.align = align;
        self
    }

    pub fn auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self.config.password = Some(password.into());
        self
    }

    /// Use an already opened client. It is never replaced by the reporter.
    pub fn client(mut self, client: Arc<dyn DbClient>) -> Self {
        self.client = Some(client);
        self
    }

    /// Validate the configuration and create the reporter.
    pub fn build(self) -> Result<Arc<Reporter>> {
        let url = self
            .config
            .validate()
            .and_then(|()| self.config.endpoint_url())
            .map_err(|e| {
                error!(error = %e, endpoint = %self.config.endpoint, "invalid reporter configuration");
                e
            })?;

        let ReporterConfig {
            database,
            username,
            password,
            interval,
            tags,
            align,
            ..
        } = self.config;

        let connection = url.map(|url| ConnectionConfig {
            url,
            username,
            password,
        });
        let client = self.client.map(|client| ClientSlot {
            client,
            owned: false,
        });
        let (shutdown, _) = watch::channel(false);

        Ok(Arc::new(Reporter {
            registry: self.registry.unwrap_or_else(default_registry),
            client: RwLock::new(client),
            connection,
            database,
            interval,
            tags: tags.filter(|t| !t.is_empty()),
            align,
            state: AtomicU8::new(ReporterState::Created as u8),
            shutdown,
        }))
    }
}
