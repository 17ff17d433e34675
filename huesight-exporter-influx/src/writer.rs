//! HTTP writer for the InfluxDB `/write` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use huesight_common::{MetricRecord, MetricSink, SinkError};
use tracing::debug;

use crate::config::InfluxConfig;
use crate::mapping::encode_batch;

/// Metric sink backed by the InfluxDB 1.x HTTP API.
#[derive(Debug, Clone)]
pub struct InfluxWriter {
    config: InfluxConfig,
    client: reqwest::Client,
}

impl InfluxWriter {
    /// Create a writer for the configured server.
    pub fn new(config: InfluxConfig) -> Result<Self, SinkError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| SinkError::Transport {
                url: config.base_url(),
                detail: e.to_string(),
            })?;

        Ok(Self { config, client })
    }

    /// Full URL of the write endpoint (without query string).
    pub fn write_url(&self) -> String {
        format!("{}/write", self.config.base_url())
    }

    fn query(&self) -> Vec<(&str, &str)> {
        let mut query = vec![("db", self.config.database.as_str()), ("precision", "ms")];
        if let Some(username) = &self.config.username {
            query.push(("u", username.as_str()));
        }
        if let Some(password) = &self.config.password {
            query.push(("p", password.as_str()));
        }
        query
    }

    /// Check that the server answers `/ping`.
    pub async fn ping(&self) -> Result<(), SinkError> {
        let url = format!("{}/ping", self.config.base_url());
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SinkError::Transport {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(SinkError::Rejected {
                status: resp.status().as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        Ok(())
    }
}

#[async_trait]
impl MetricSink for InfluxWriter {
    async fn write_batch(&self, records: &[MetricRecord]) -> Result<(), SinkError> {
        if records.is_empty() {
            return Ok(());
        }

        let body = encode_batch(records)?;
        let url = self.write_url();

        let resp = self
            .client
            .post(&url)
            .query(&self.query())
            .body(body)
            .send()
            .await
            .map_err(|e| SinkError::Transport {
                url: url.clone(),
                detail: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        debug!(points = records.len(), url = %url, "Wrote points to InfluxDB");
        Ok(())
    }
}
