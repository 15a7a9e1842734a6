//! InfluxDB 1.x HTTP client.

use super::client::{BatchPoints, ConnectionConfig, DbClient, Pong, WriteResponse};
use super::line_protocol::encode_batch;
use crate::core::{MetricsError, Result};
use reqwest::{Client, RequestBuilder, Url};
use std::time::{Duration, Instant};
use tracing::debug;

/// Per-request timeout
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client speaking the InfluxDB 1.x `/write` and `/ping` endpoints.
#[derive(Debug, Clone)]
pub struct InfluxHttpClient {
    client: Client,
    write_url: Url,
    ping_url: Url,
    username: Option<String>,
    password: Option<String>,
}

impl InfluxHttpClient {
    /// Build a client for `config`. No request is made.
    pub fn open(config: ConnectionConfig) -> Result<Self> {
        let mut base = config.url;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let write_url = base
            .join("write")
            .map_err(|e| MetricsError::connection(format!("invalid write url: {}", e)))?;
        let ping_url = base
            .join("ping")
            .map_err(|e| MetricsError::connection(format!("invalid ping url: {}", e)))?;

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MetricsError::connection(format!("unable to build http client: {}", e)))?;

        Ok(Self {
            client,
            write_url,
            ping_url,
            username: config.username,
            password: config.password,
        })
    }

    fn with_auth(&self, request: RequestBuilder) -> RequestBuilder {
        match (&self.username, &self.password) {
            (Some(u), Some(p)) => request.query(&[("u", u.as_str()), ("p", p.as_str())]),
            (Some(u), None) => request.query(&[("u", u.as_str())]),
            _ => request,
        }
    }
}

#[async_trait::async_trait]
impl DbClient for InfluxHttpClient {
    async fn write(&self, batch: BatchPoints) -> Result<WriteResponse> {
        let body = encode_batch(&batch);
        debug!(points = batch.points.len(), database = %batch.database, "writing batch");

        let request = self
            .client
            .post(self.write_url.clone())
            .query(&[("db", batch.database.as_str()), ("precision", "ns")]);
        let response = self.with_auth(request).body(body).send().await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(MetricsError::write(format!("server returned {}: {}", status, text.trim())));
        }

        Ok(WriteResponse {
            status: status.as_u16(),
            body: text,
        })
    }

    async fn ping(&self) -> Result<Pong> {
        let start = Instant::now();
        let response = self
            .with_auth(self.client.get(self.ping_url.clone()))
            .send()
            .await
            .map_err(|e| MetricsError::ping(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetricsError::ping(format!("server returned {}", status)));
        }

        let version = response
            .headers()
            .get("X-Influxdb-Version")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        Ok(Pong {
            latency: start.elapsed(),
            version,
        })
    }
}
