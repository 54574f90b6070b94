//! Destinations for metric batches.
//!
//! A [`MetricSink`] is shared by every collection task, so implementations must accept
//! concurrent pushes, either because they are internally thread-safe or because they
//! serialize internally.
mod graphite;

pub use graphite::GraphiteSink;

use std::future::Future;

use crate::stats::Metric;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to connect to `{addr}`: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {count} metrics to `{addr}`: {source}")]
    Write {
        addr: String,
        count: usize,
        #[source]
        source: std::io::Error,
    },
}

/// Accepts ordered batches of metrics.
pub trait MetricSink: Send + Sync + 'static {
    /// Pushes one poll cycle's worth of metrics.
    ///
    /// A failed push is not retried by the caller; the batch is lost.
    fn push(&self, metrics: &[Metric]) -> impl Future<Output = Result<(), SinkError>> + Send;
}
