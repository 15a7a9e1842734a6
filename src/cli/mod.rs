//! Command-line interface for fluxmetrics.
//!
//! Runs a reporter against an InfluxDB endpoint until Ctrl-C, optionally
//! feeding it a randomly updated demo gauge.

use crate::core::config::ConfigBuilder;
use crate::core::{Config, LogLevel, MetricsError, Result};
use crate::metrics::{set_default_reporter, Gauge, MetricOptions};
use crate::reporter::{Reporter, ReporterBuilder};
use clap::Parser;
use rand::Rng;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Period between two demo gauge updates
const DEMO_UPDATE_PERIOD: Duration = Duration::from_millis(600);

/// Report application metrics to InfluxDB
#[derive(Parser, Debug)]
#[command(name = "fluxmetrics")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path (YAML)
    #[arg(short, long, env = "FLUXMETRICS_CONFIG")]
    pub config: Option<PathBuf>,

    /// InfluxDB endpoint, e.g. http://localhost:8086
    #[arg(long, env = "FLUXMETRICS_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Database to write to
    #[arg(long, env = "FLUXMETRICS_DATABASE")]
    pub database: Option<String>,

    /// Flush interval in seconds
    #[arg(long, env = "FLUXMETRICS_INTERVAL")]
    pub interval: Option<u64>,

    /// Enable debug logging
    #[arg(short, long, env = "FLUXMETRICS_DEBUG")]
    pub debug: bool,

    /// Feed a randomly updated gauge to the reporter
    #[arg(long)]
    pub demo: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration. Command-line arguments override the file.
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = &self.config {
            let content = tokio::fs::read_to_string(path).await.map_err(|e| {
                MetricsError::config(format!("Failed to read config file {:?}: {}", path, e))
            })?;
            builder = builder.from_yaml(&content)?;
            tracing::info!(path = ?path, "loaded configuration");
        }

        if let Some(endpoint) = &self.endpoint {
            builder = builder.endpoint(endpoint.clone());
        }
        if let Some(database) = &self.database {
            builder = builder.database(database.clone());
        }
        if let Some(secs) = self.interval {
            builder = builder.interval(Duration::from_secs(secs));
        }
        if self.debug {
            builder = builder.log_level(LogLevel::Debug);
        }

        builder.build()
    }
}

/// Initialize logging. `RUST_LOG` wins over the configured level.
pub fn init_logging(config: &Config) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    let (json_layer, compact_layer) = if config.logging.structured {
        let layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true);
        (Some(layer), None)
    } else {
        let layer = tracing_subscriber::fmt::layer().with_target(false).compact();
        (None, Some(layer))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(compact_layer)
        .try_init()
        .map_err(|e| MetricsError::config(format!("Failed to initialize logging: {}", e)))?;

    Ok(())
}

/// Execute the fluxmetrics command.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;

    if cli.check_config {
        config.validate()?;
        println!("Configuration is valid!");
        println!("  Endpoint: {}", config.reporter.endpoint);
        println!("  Database: {}", config.reporter.database);
        println!("  Interval: {:?}", config.reporter.interval);
        return Ok(());
    }

    init_logging(&config)?;

    let reporter = ReporterBuilder::from_config(config.reporter).build()?;
    set_default_reporter(Arc::clone(&reporter))?;

    let mut runner = tokio::spawn({
        let reporter = Arc::clone(&reporter);
        async move { reporter.run().await }
    });

    let demo = cli.demo.then(|| tokio::spawn(run_demo()));

    tracing::info!("fluxmetrics running, press Ctrl-C to stop");
    let waited = wait_for_shutdown(&mut runner, tokio::signal::ctrl_c()).await;
    if waited.is_ok() {
        tracing::info!("Received shutdown signal, stopping...");
    }

    shutdown(&reporter, runner, demo).await;
    waited
}

/// Wait for `signal`. Fails when the reporter task ends first.
async fn wait_for_shutdown(
    runner: &mut JoinHandle<()>,
    signal: impl Future<Output = std::io::Result<()>>,
) -> Result<()> {
    tokio::select! {
        received = signal => Ok(received?),
        finished = runner => {
            if let Err(e) = finished {
                tracing::error!(error = %e, "reporter task failed");
            }
            Err(MetricsError::connection("metrics reporter exited, see the log for details"))
        },
    }
}

async fn shutdown(reporter: &Arc<Reporter>, runner: JoinHandle<()>, demo: Option<JoinHandle<()>>) {
    if let Some(demo) = demo {
        demo.abort();
    }
    reporter.stop();
    if runner.is_finished() {
        return;
    }
    if let Err(e) = runner.await {
        tracing::error!(error = %e, "reporter task failed");
    }
}

/// Update a gauge on the default reporter with random values, forever.
async fn run_demo() {
    let gauge = Gauge::new("random", MetricOptions::new().measurement("measure"));
    let mut ticker = tokio::time::interval(DEMO_UPDATE_PERIOD);
    loop {
        ticker.tick().await;
        let value = rand::thread_rng().gen_range(0..100);
        gauge.update(value);
        tracing::debug!(value, "demo gauge updated");
    }
}
