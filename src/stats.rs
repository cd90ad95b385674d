use metriken::{metric, Counter};

/*
 * sampling
 */

#[metric(
    name = "efa_monitor_ticks",
    description = "The number of sampling ticks that have run",
    metadata = { unit = "ticks" }
)]
pub static TICKS: Counter = Counter::new();

#[metric(
    name = "efa_monitor_samples_read",
    description = "Complete counter samples read from an interface",
    metadata = { unit = "samples" }
)]
pub static SAMPLES_READ: Counter = Counter::new();

#[metric(
    name = "efa_monitor_read_errors",
    description = "Counter reads that failed and caused an interface to be skipped for a tick",
    metadata = { unit = "errors" }
)]
pub static READ_ERRORS: Counter = Counter::new();

#[metric(
    name = "efa_monitor_records",
    description = "Rate records derived from consecutive samples",
    metadata = { unit = "records" }
)]
pub static RECORDS: Counter = Counter::new();

/*
 * export
 */

#[metric(
    name = "efa_monitor_entries_exported",
    description = "Metric entries accepted by the sink",
    metadata = { unit = "entries" }
)]
pub static ENTRIES_EXPORTED: Counter = Counter::new();

#[metric(
    name = "efa_monitor_chunks_failed",
    description = "Chunk submissions rejected by the sink",
    metadata = { unit = "chunks" }
)]
pub static CHUNKS_FAILED: Counter = Counter::new();

#[metric(
    name = "efa_monitor_entries_dropped",
    description = "Metric entries lost because their chunk failed to submit",
    metadata = { unit = "entries" }
)]
pub static ENTRIES_DROPPED: Counter = Counter::new();
