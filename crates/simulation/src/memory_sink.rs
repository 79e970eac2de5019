//! In-memory event sink.

use lamport_core::{EventSink, SinkError};
use lamport_types::{EventRecord, MachineId};
use parking_lot::Mutex;

/// Sink that keeps every record in memory, in arrival order.
///
/// Useful for tests and for inspecting short runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(MachineId, EventRecord)>>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// All records so far.
    pub fn records(&self) -> Vec<(MachineId, EventRecord)> {
        self.records.lock().clone()
    }

    /// Records emitted by one machine, in emission order.
    pub fn records_for(&self, machine: MachineId) -> Vec<EventRecord> {
        self.records
            .lock()
            .iter()
            .filter(|(m, _)| *m == machine)
            .map(|(_, r)| r.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }
}

impl EventSink for MemorySink {
    fn record(&self, machine: MachineId, event: &EventRecord) -> Result<(), SinkError> {
        self.records.lock().push((machine, event.clone()));
        Ok(())
    }
}
