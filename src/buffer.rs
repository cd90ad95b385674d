use crate::rate::RateRecord;

/// Records drained from a [`BatchBuffer`] in the order they were added.
#[derive(Debug, Default)]
pub struct Batch {
    records: Vec<RateRecord>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[RateRecord] {
        &self.records
    }
}

impl From<Vec<RateRecord>> for Batch {
    fn from(records: Vec<RateRecord>) -> Self {
        Self { records }
    }
}

/// Pending records waiting for export.
pub struct BatchBuffer {
    pending: Vec<RateRecord>,
    threshold: usize,
}

impl BatchBuffer {
    /// The buffer asks to be flushed after `cycles` ticks worth of records
    /// for `interfaces` interfaces.
    pub fn new(cycles: usize, interfaces: usize) -> Self {
        let threshold = cycles.saturating_mul(interfaces).max(1);

        Self {
            pending: Vec::with_capacity(threshold),
            threshold,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn add(&mut self, record: RateRecord) {
        self.pending.push(record);
    }

    pub fn should_flush(&self) -> bool {
        self.pending.len() >= self.threshold
    }

    /// Take every pending record, leaving the buffer empty.
    pub fn drain(&mut self) -> Batch {
        let records = std::mem::replace(&mut self.pending, Vec::with_capacity(self.threshold));
        Batch::from(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::DateTime;
    use std::collections::BTreeMap;

    fn record(n: i64) -> RateRecord {
        RateRecord {
            timestamp: DateTime::from_timestamp(n, 0).unwrap(),
            interface: "efa0".into(),
            metrics: BTreeMap::new(),
        }
    }

    #[test]
    fn flushes_at_threshold() {
        let mut buffer = BatchBuffer::new(5, 2);
        assert_eq!(buffer.threshold(), 10);

        for n in 0..9 {
            buffer.add(record(n));
            assert!(!buffer.should_flush(), "flushed early at {}", n + 1);
        }

        buffer.add(record(9));
        assert!(buffer.should_flush());
    }

    #[test]
    fn drain_preserves_order_and_empties() {
        let mut buffer = BatchBuffer::new(1, 3);

        for n in 0..3 {
            buffer.add(record(n));
        }

        let batch = buffer.drain();
        assert_eq!(batch.len(), 3);
        assert!(buffer.is_empty());
        assert!(!buffer.should_flush());

        let seconds: Vec<i64> = batch
            .records()
            .iter()
            .map(|r| r.timestamp.timestamp())
            .collect();
        assert_eq!(seconds, vec![0, 1, 2]);
    }

    #[test]
    fn partial_drain() {
        let mut buffer = BatchBuffer::new(5, 2);
        buffer.add(record(0));
        buffer.add(record(1));

        assert!(!buffer.should_flush());
        assert_eq!(buffer.drain().len(), 2);
        assert!(buffer.drain().is_empty());
    }
}
