use super::*;

use tracing::info;

/// Writes chunks to the log. Used when no remote endpoint is configured.
#[derive(Default)]
pub struct LogSink;

impl MetricsSink for LogSink {
    fn submit(&mut self, namespace: &str, entries: &[MetricDatum]) -> Result<(), Error> {
        for entry in entries {
            let interface = entry
                .dimensions
                .iter()
                .find(|d| d.name == INTERFACE_DIMENSION)
                .map(|d| d.value.as_str())
                .unwrap_or_default();

            info!(
                namespace,
                interface,
                metric = %entry.metric_name,
                value = entry.value,
                unit = ?entry.unit,
                timestamp = %entry.timestamp,
                "metric"
            );
        }

        info!(namespace, entries = entries.len(), "sent metrics");

        Ok(())
    }
}
