//! Converts rate records into the remote API's metric entries and submits
//! them in size-bounded chunks.
//!
//! Delivery is best effort. A chunk the sink rejects is logged and dropped;
//! it is never retried or put back in the buffer.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, error};

use crate::buffer::Batch;
use crate::stats::*;

mod http;
mod log;

pub use http::HttpSink;
pub use log::LogSink;

/// Dimension naming the host an entry came from.
pub const HOST_DIMENSION: &str = "InstanceId";

/// Dimension naming the interface an entry describes.
pub const INTERFACE_DIMENSION: &str = "Interface";

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid endpoint: {0}")]
    Endpoint(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("endpoint responded with status {status}")]
    Status { status: u16 },
    #[error("unable to encode metric data: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("{failed} of {chunks} chunks failed, {dropped} entries dropped")]
    ChunksDropped {
        failed: usize,
        chunks: usize,
        dropped: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Unit {
    #[serde(rename = "Bytes/Second")]
    BytesPerSecond,
    #[serde(rename = "Count/Second")]
    CountPerSecond,
    #[serde(rename = "Count")]
    Count,
}

impl Unit {
    /// Classify a metric by its name suffix.
    pub fn for_metric(name: &str) -> Self {
        if name.ends_with("_bytes_rate") {
            Self::BytesPerSecond
        } else if name.ends_with("_packets_rate") {
            Self::CountPerSecond
        } else {
            Self::Count
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

/// One value in the remote API's wire shape.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct MetricDatum {
    pub metric_name: String,
    pub value: f64,
    pub unit: Unit,
    pub timestamp: DateTime<Utc>,
    pub dimensions: Vec<Dimension>,
}

/// The remote metrics API. Each call carries at most one chunk.
pub trait MetricsSink {
    fn submit(&mut self, namespace: &str, entries: &[MetricDatum]) -> Result<(), Error>;
}

impl<T: MetricsSink + ?Sized> MetricsSink for Box<T> {
    fn submit(&mut self, namespace: &str, entries: &[MetricDatum]) -> Result<(), Error> {
        (**self).submit(namespace, entries)
    }
}

/// Flatten a batch into one entry per metric of every record.
pub fn metric_data(batch: &Batch, host_id: &str) -> Vec<MetricDatum> {
    let mut data = Vec::new();

    for record in batch.records() {
        for (metric, value) in &record.metrics {
            data.push(MetricDatum {
                metric_name: metric.name().to_string(),
                value: *value,
                unit: Unit::for_metric(metric.name()),
                timestamp: record.timestamp,
                dimensions: vec![
                    Dimension {
                        name: HOST_DIMENSION.to_string(),
                        value: host_id.to_string(),
                    },
                    Dimension {
                        name: INTERFACE_DIMENSION.to_string(),
                        value: record.interface.clone(),
                    },
                ],
            });
        }
    }

    data
}

pub struct Exporter<S> {
    sink: S,
    namespace: String,
    chunk_size: usize,
}

impl<S: MetricsSink> Exporter<S> {
    pub fn new(sink: S, namespace: impl Into<String>, chunk_size: usize) -> Self {
        Self {
            sink,
            namespace: namespace.into(),
            chunk_size: chunk_size.max(1),
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Submit every record in `batch`. Returns the number of entries the
    /// sink accepted, or an error describing what was dropped. Every chunk
    /// is attempted even after one fails.
    pub fn export(&mut self, batch: Batch, host_id: &str) -> Result<usize, Error> {
        if batch.is_empty() {
            return Ok(0);
        }

        let data = metric_data(&batch, host_id);

        let chunks = data.len().div_ceil(self.chunk_size);
        let mut sent = 0;
        let mut failed = 0;
        let mut dropped = 0;

        for (index, chunk) in data.chunks(self.chunk_size).enumerate() {
            match self.sink.submit(&self.namespace, chunk) {
                Ok(()) => {
                    debug!(chunk = index, entries = chunk.len(), "chunk submitted");
                    ENTRIES_EXPORTED.add(chunk.len() as u64);
                    sent += chunk.len();
                }
                Err(e) => {
                    error!(
                        chunk = index,
                        entries = chunk.len(),
                        namespace = %self.namespace,
                        "failed to submit metrics: {e}"
                    );
                    CHUNKS_FAILED.increment();
                    ENTRIES_DROPPED.add(chunk.len() as u64);
                    failed += 1;
                    dropped += chunk.len();
                }
            }
        }

        if failed > 0 {
            return Err(Error::ChunksDropped {
                failed,
                chunks,
                dropped,
            });
        }

        Ok(sent)
    }
}
