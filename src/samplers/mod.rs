//! Reads the raw EFA port counters for one interface at one instant.
//!
//! A [`RawSample`] is all-or-nothing: if any of the six counters cannot be
//! read the whole sample fails and nothing is produced for that interface.

use chrono::{DateTime, Utc};
use thiserror::Error;

use std::fmt;
use std::path::PathBuf;

mod sysfs;

pub use sysfs::{monitored_interfaces, Sysfs};

use crate::stats::*;

/// The hardware counters sampled for each interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Counter {
    RxBytes,
    TxBytes,
    RxPackets,
    TxPackets,
    RxErrors,
    TxDiscards,
}

impl Counter {
    pub const COUNT: usize = 6;

    pub const ALL: [Counter; Self::COUNT] = [
        Counter::RxBytes,
        Counter::TxBytes,
        Counter::RxPackets,
        Counter::TxPackets,
        Counter::RxErrors,
        Counter::TxDiscards,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::RxBytes => "rx_bytes",
            Self::TxBytes => "tx_bytes",
            Self::RxPackets => "rx_packets",
            Self::TxPackets => "tx_packets",
            Self::RxErrors => "rx_errors",
            Self::TxDiscards => "tx_discards",
        }
    }

    /// Name of the file under `ports/<n>/counters` holding this counter.
    pub fn file(self) -> &'static str {
        match self {
            Self::RxBytes => "port_rcv_data",
            Self::TxBytes => "port_xmit_data",
            Self::RxPackets => "port_rcv_packets",
            Self::TxPackets => "port_xmit_packets",
            Self::RxErrors => "port_rcv_errors",
            Self::TxDiscards => "port_xmit_discards",
        }
    }

    /// The data counters count 4-byte words, everything else counts events.
    pub fn multiplier(self) -> u64 {
        match self {
            Self::RxBytes | Self::TxBytes => 4,
            _ => 1,
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("unable to read {counter} from {}: {source}", path.display())]
    Unreadable {
        counter: Counter,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unable to parse {counter} from {}: {value:?}", path.display())]
    Unparseable {
        counter: Counter,
        path: PathBuf,
        value: String,
    },
}

/// Something that can produce the raw value of one counter of one interface.
pub trait CounterSource {
    fn read_counter(&self, interface: &str, counter: Counter) -> Result<u64, Error>;
}

impl<T: CounterSource + ?Sized> CounterSource for &T {
    fn read_counter(&self, interface: &str, counter: Counter) -> Result<u64, Error> {
        (**self).read_counter(interface, counter)
    }
}

/// One complete reading of every [`Counter`] for an interface.
#[derive(Clone, Debug, PartialEq)]
pub struct RawSample {
    interface: String,
    timestamp: DateTime<Utc>,
    values: [u64; Counter::COUNT],
}

impl RawSample {
    pub fn new(
        interface: impl Into<String>,
        timestamp: DateTime<Utc>,
        values: [u64; Counter::COUNT],
    ) -> Self {
        Self {
            interface: interface.into(),
            timestamp,
            values,
        }
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn get(&self, counter: Counter) -> u64 {
        self.values[counter.index()]
    }
}

pub struct CounterReader<S> {
    source: S,
}

impl<S: CounterSource> CounterReader<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Read every counter for `interface`, stamped with the current time.
    #[cfg(test)]
    pub fn read(&self, interface: &str) -> Result<RawSample, Error> {
        self.read_at(interface, Utc::now())
    }

    pub fn read_at(&self, interface: &str, timestamp: DateTime<Utc>) -> Result<RawSample, Error> {
        let mut values = [0; Counter::COUNT];

        for counter in Counter::ALL {
            let raw = self.source.read_counter(interface, counter).inspect_err(|_| {
                READ_ERRORS.increment();
            })?;

            values[counter.index()] = raw.saturating_mul(counter.multiplier());
        }

        SAMPLES_READ.increment();

        Ok(RawSample::new(interface, timestamp, values))
    }
}
