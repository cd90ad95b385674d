//! Turns consecutive raw samples into per-interval rates.
//!
//! Each interface moves from "no prior sample" to "has prior sample" on its
//! first successful read and stays there for the life of the process.

use chrono::{DateTime, Utc};
use tracing::debug;

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::samplers::{Counter, RawSample};
use crate::stats::RECORDS;

/// Values carried by a [`RateRecord`], in export order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    RxBytesRate,
    TxBytesRate,
    RxPacketsRate,
    TxPacketsRate,
    RxErrors,
    TxDiscards,
}

impl Metric {
    /// Rate-bearing metrics and the counter each one is derived from.
    const RATES: [(Metric, Counter); 4] = [
        (Metric::RxBytesRate, Counter::RxBytes),
        (Metric::TxBytesRate, Counter::TxBytes),
        (Metric::RxPacketsRate, Counter::RxPackets),
        (Metric::TxPacketsRate, Counter::TxPackets),
    ];

    /// Cumulative counters that are reported as-is.
    const PASSTHROUGH: [(Metric, Counter); 2] = [
        (Metric::RxErrors, Counter::RxErrors),
        (Metric::TxDiscards, Counter::TxDiscards),
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RxBytesRate => "rx_bytes_rate",
            Self::TxBytesRate => "tx_bytes_rate",
            Self::RxPacketsRate => "rx_packets_rate",
            Self::TxPacketsRate => "tx_packets_rate",
            Self::RxErrors => "rx_errors",
            Self::TxDiscards => "tx_discards",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct RateRecord {
    pub timestamp: DateTime<Utc>,
    pub interface: String,
    pub metrics: BTreeMap<Metric, f64>,
}

impl RateRecord {
    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.metrics.get(&metric).copied()
    }

    /// Receive and transmit throughput in megabits per second.
    pub fn mbps(&self) -> (f64, f64) {
        let rx = self.get(Metric::RxBytesRate).unwrap_or(0.0);
        let tx = self.get(Metric::TxBytesRate).unwrap_or(0.0);

        (rx * 8.0 / 1_000_000.0, tx * 8.0 / 1_000_000.0)
    }
}

#[derive(Debug, Default)]
pub struct InterfaceState {
    last_sample: Option<RawSample>,
}

impl InterfaceState {
    #[cfg(test)]
    pub fn last_sample(&self) -> Option<&RawSample> {
        self.last_sample.as_ref()
    }
}

/// Per-interface counter state. Only touched from the sampling loop.
#[derive(Default)]
pub struct RateEngine {
    interfaces: HashMap<String, InterfaceState>,
}

impl RateEngine {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn state(&self, interface: &str) -> Option<&InterfaceState> {
        self.interfaces.get(interface)
    }

    /// Feed a new sample. Returns a record once two samples with increasing
    /// timestamps have been seen for the interface.
    pub fn update(&mut self, sample: RawSample) -> Option<RateRecord> {
        let state = self
            .interfaces
            .entry(sample.interface().to_string())
            .or_default();

        let previous = match state.last_sample {
            Some(ref previous) => previous,
            None => {
                debug!(interface = sample.interface(), "first sample stored");
                state.last_sample = Some(sample);
                return None;
            }
        };

        // never derive a rate across a zero or negative interval
        let seconds = match (sample.timestamp() - previous.timestamp()).to_std() {
            Ok(elapsed) if !elapsed.is_zero() => elapsed.as_secs_f64(),
            _ => {
                debug!(
                    interface = sample.interface(),
                    "non-positive elapsed time, sample ignored"
                );
                return None;
            }
        };

        let mut metrics = BTreeMap::new();

        for (metric, counter) in Metric::RATES {
            let current = sample.get(counter);
            let last = previous.get(counter);

            // a counter that went backwards was reset or wrapped
            let rate = if current >= last {
                (current - last) as f64 / seconds
            } else {
                0.0
            };

            metrics.insert(metric, rate);
        }

        for (metric, counter) in Metric::PASSTHROUGH {
            metrics.insert(metric, sample.get(counter) as f64);
        }

        let record = RateRecord {
            timestamp: sample.timestamp(),
            interface: sample.interface().to_string(),
            metrics,
        };

        state.last_sample = Some(sample);

        RECORDS.increment();

        Some(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeDelta;

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + seconds, 0).unwrap()
    }

    fn sample(seconds: i64, values: [u64; 6]) -> RawSample {
        RawSample::new("efa0", at(seconds), values)
    }

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn first_sample_produces_nothing() {
        let mut engine = RateEngine::new();

        assert!(engine.update(sample(0, [1, 2, 3, 4, 5, 6])).is_none());
        assert!(engine.state("efa0").unwrap().last_sample().is_some());
    }

    #[test]
    fn rates_are_delta_over_elapsed() {
        let mut engine = RateEngine::new();

        engine.update(sample(0, [1_000, 2_000, 10, 20, 3, 4]));
        let record = engine
            .update(sample(60, [61_000, 2_600, 130, 20, 7, 9]))
            .unwrap();

        assert_eq!(record.interface, "efa0");
        assert_eq!(record.timestamp, at(60));
        assert_close(record.get(Metric::RxBytesRate).unwrap(), 1_000.0);
        assert_close(record.get(Metric::TxBytesRate).unwrap(), 10.0);
        assert_close(record.get(Metric::RxPacketsRate).unwrap(), 2.0);
        assert_close(record.get(Metric::TxPacketsRate).unwrap(), 0.0);
        assert_eq!(record.metrics.len(), 6);
    }

    #[test]
    fn fractional_elapsed() {
        let mut engine = RateEngine::new();
        let start = at(0);

        engine.update(RawSample::new("efa0", start, [0; 6]));
        let record = engine
            .update(RawSample::new(
                "efa0",
                start + TimeDelta::milliseconds(2_500),
                [5, 0, 0, 0, 0, 0],
            ))
            .unwrap();

        assert_close(record.get(Metric::RxBytesRate).unwrap(), 2.0);
    }

    #[test]
    fn errors_pass_through_as_absolute_values() {
        let mut engine = RateEngine::new();

        engine.update(sample(0, [0, 0, 0, 0, 100, 200]));
        let record = engine.update(sample(10, [0, 0, 0, 0, 150, 201])).unwrap();

        assert_eq!(record.get(Metric::RxErrors), Some(150.0));
        assert_eq!(record.get(Metric::TxDiscards), Some(201.0));
    }

    #[test]
    fn reset_yields_zero() {
        let mut engine = RateEngine::new();

        engine.update(sample(0, [u64::MAX - 4, 500, 500, 500, 0, 0]));
        let record = engine.update(sample(10, [8, 100, 600, 0, 0, 0])).unwrap();

        assert_eq!(record.get(Metric::RxBytesRate), Some(0.0));
        assert_eq!(record.get(Metric::TxBytesRate), Some(0.0));
        assert_close(record.get(Metric::RxPacketsRate).unwrap(), 10.0);
        assert_eq!(record.get(Metric::TxPacketsRate), Some(0.0));

        // the reset sample becomes the new baseline
        let record = engine.update(sample(20, [108, 100, 600, 0, 0, 0])).unwrap();
        assert_close(record.get(Metric::RxBytesRate).unwrap(), 10.0);
    }

    #[test]
    fn non_positive_elapsed_is_ignored() {
        let mut engine = RateEngine::new();

        engine.update(sample(10, [100, 0, 0, 0, 0, 0]));

        // same instant, then earlier: both ignored
        assert!(engine.update(sample(10, [999, 0, 0, 0, 0, 0])).is_none());
        assert!(engine.update(sample(5, [999, 0, 0, 0, 0, 0])).is_none());

        let stored = engine.state("efa0").unwrap().last_sample().unwrap();
        assert_eq!(stored.timestamp(), at(10));
        assert_eq!(stored.get(Counter::RxBytes), 100);

        // the next valid pair uses the untouched baseline
        let record = engine.update(sample(20, [200, 0, 0, 0, 0, 0])).unwrap();
        assert_close(record.get(Metric::RxBytesRate).unwrap(), 10.0);
    }

    #[test]
    fn interfaces_are_independent() {
        let mut engine = RateEngine::new();

        engine.update(RawSample::new("efa0", at(0), [0; 6]));
        assert!(engine
            .update(RawSample::new("efa1", at(10), [50; 6]))
            .is_none());

        let record = engine
            .update(RawSample::new("efa0", at(10), [100, 0, 0, 0, 0, 0]))
            .unwrap();
        assert_eq!(record.interface, "efa0");
        assert_close(record.get(Metric::RxBytesRate).unwrap(), 10.0);
    }

    #[test]
    fn mbps() {
        let mut metrics = BTreeMap::new();
        metrics.insert(Metric::RxBytesRate, 1_250_000.0);
        metrics.insert(Metric::TxBytesRate, 125_000.0);

        let record = RateRecord {
            timestamp: at(0),
            interface: "efa0".into(),
            metrics,
        };

        let (rx, tx) = record.mbps();
        assert_close(rx, 10.0);
        assert_close(tx, 1.0);
    }
}
