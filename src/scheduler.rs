//! The sampling loop.
//!
//! Every tick reads each interface in turn, derives rates and buffers the
//! results. A failing interface is logged and skipped for that tick only.
//! Once the buffer reaches its threshold the whole batch is exported before
//! the loop sleeps again. An interrupt ends the wait early and triggers one
//! final export of whatever is still pending.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use crate::buffer::BatchBuffer;
use crate::exporter::{Exporter, MetricsSink};
use crate::rate::RateEngine;
use crate::samplers::{CounterReader, CounterSource};
use crate::stats::*;

pub struct SampleScheduler<C, S> {
    reader: CounterReader<C>,
    engine: RateEngine,
    buffer: BatchBuffer,
    exporter: Exporter<S>,
    interfaces: Vec<String>,
    host_id: String,
    interval: Duration,
}

impl<C: CounterSource, S: MetricsSink> SampleScheduler<C, S> {
    pub fn new(
        reader: CounterReader<C>,
        exporter: Exporter<S>,
        interfaces: Vec<String>,
        host_id: String,
        interval: Duration,
        batch_cycles: usize,
    ) -> Self {
        let buffer = BatchBuffer::new(batch_cycles, interfaces.len());

        Self {
            reader,
            engine: RateEngine::new(),
            buffer,
            exporter,
            interfaces,
            host_id,
            interval,
        }
    }

    /// Build a scheduler for `interfaces`. With nothing to monitor this
    /// returns `None` and `exporter` is never called, so no sink is created.
    pub fn build<E>(
        reader: CounterReader<C>,
        interfaces: Vec<String>,
        host_id: String,
        interval: Duration,
        batch_cycles: usize,
        exporter: impl FnOnce() -> Result<Exporter<S>, E>,
    ) -> Result<Option<Self>, E> {
        if interfaces.is_empty() {
            return Ok(None);
        }

        Ok(Some(Self::new(
            reader,
            exporter()?,
            interfaces,
            host_id,
            interval,
            batch_cycles,
        )))
    }

    #[cfg(test)]
    fn exporter(&self) -> &Exporter<S> {
        &self.exporter
    }

    #[cfg(test)]
    fn pending(&self) -> usize {
        self.buffer.len()
    }

    /// Sample every interface once. Returns the number of records buffered.
    pub fn tick(&mut self) -> usize {
        self.tick_at(Utc::now())
    }

    pub fn tick_at(&mut self, now: DateTime<Utc>) -> usize {
        TICKS.increment();

        let mut produced = 0;

        for interface in &self.interfaces {
            let sample = match self.reader.read_at(interface, now) {
                Ok(sample) => sample,
                Err(e) => {
                    error!(interface = %interface, "failed to read counters: {e}");
                    continue;
                }
            };

            if let Some(record) = self.engine.update(sample) {
                let (rx, tx) = record.mbps();
                info!(interface = %interface, "RX={rx:.2} Mbps, TX={tx:.2} Mbps");

                self.buffer.add(record);
                produced += 1;
            }
        }

        produced
    }

    /// Export the buffer if it has reached its threshold.
    pub fn flush_if_ready(&mut self) -> bool {
        if !self.buffer.should_flush() {
            return false;
        }

        self.flush();
        true
    }

    /// Export everything pending. Does nothing when the buffer is empty.
    pub fn flush(&mut self) {
        if self.buffer.is_empty() {
            return;
        }

        let batch = self.buffer.drain();
        let records = batch.len();

        match self.exporter.export(batch, &self.host_id) {
            Ok(sent) => info!(records, entries = sent, "exported batch"),
            Err(e) => error!(records, "batch export incomplete: {e}"),
        }
    }

    /// Sample on a fixed period until `shutdown` fires or its sender is
    /// dropped, then flush what remains.
    pub fn run(&mut self, shutdown: Receiver<()>) {
        info!(
            interfaces = ?self.interfaces,
            interval = %humantime::format_duration(self.interval),
            threshold = self.buffer.threshold(),
            "sampling started"
        );

        loop {
            self.tick();
            self.flush_if_ready();

            match shutdown.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => continue,
                Ok(()) => {
                    info!("shutting down");
                    break;
                }
                Err(RecvTimeoutError::Disconnected) => {
                    warn!("shutdown channel closed, stopping");
                    break;
                }
            }
        }

        self.shutdown();
    }

    /// Flush the last partial batch and log a summary.
    pub fn shutdown(&mut self) {
        self.flush();

        info!(
            ticks = TICKS.value(),
            samples = SAMPLES_READ.value(),
            read_errors = READ_ERRORS.value(),
            records = RECORDS.value(),
            exported = ENTRIES_EXPORTED.value(),
            failed_chunks = CHUNKS_FAILED.value(),
            dropped = ENTRIES_DROPPED.value(),
            "stopped"
        );
    }
}
