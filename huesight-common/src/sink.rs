//! Metric sink capability.
//!
//! Pollers hand [`MetricRecord`]s to a [`MetricSink`]; exporters implement it.

use async_trait::async_trait;
use thiserror::Error;

use crate::telemetry::MetricRecord;

/// Errors reported by a metric sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink could not be reached.
    #[error("Transport error talking to {url}: {detail}")]
    Transport { url: String, detail: String },

    /// The sink answered but refused the write.
    #[error("Write rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// A record does not match the declared schema.
    #[error("Schema mismatch: {0}")]
    Schema(String),
}

/// Destination for metric records.
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Durably write a batch of records.
    async fn write_batch(&self, records: &[MetricRecord]) -> Result<(), SinkError>;
}

#[async_trait]
impl<T: MetricSink + ?Sized> MetricSink for std::sync::Arc<T> {
    async fn write_batch(&self, records: &[MetricRecord]) -> Result<(), SinkError> {
        (**self).write_batch(records).await
    }
}
