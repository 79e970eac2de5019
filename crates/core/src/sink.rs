//! Sink implementations that need nothing beyond the core.

use crate::EventSink;
use lamport_types::{EventRecord, MachineId};
use std::sync::Arc;
use thiserror::Error;
use tracing::trace;

/// Errors reported by an [`EventSink`].
#[derive(Debug, Error)]
pub enum SinkError {
    /// Writing the record failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The sink has no destination for this machine.
    #[error("no output registered for machine {0}")]
    UnknownMachine(MachineId),

    /// The sink refused the record.
    #[error("record rejected: {0}")]
    Rejected(String),
}

/// Sink that discards every record.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn record(&self, _machine: MachineId, _event: &EventRecord) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Sink that mirrors records into `tracing` at trace level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn record(&self, machine: MachineId, event: &EventRecord) -> Result<(), SinkError> {
        trace!(
            machine = %machine,
            clock = event.logical_clock,
            delta = event.logical_clock_delta,
            pending = event.pending,
            "{}",
            event.kind
        );
        Ok(())
    }
}

/// Sink that forwards every record to several sinks.
///
/// Every inner sink sees every record even when an earlier one fails; the
/// first error is returned.
#[derive(Default, Clone)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    /// Create an empty fanout.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a sink.
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// Number of inner sinks.
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// Check if there are no inner sinks.
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for FanoutSink {
    fn record(&self, machine: MachineId, event: &EventRecord) -> Result<(), SinkError> {
        let mut first_error = None;
        for sink in &self.sinks {
            if let Err(e) = sink.record(machine, event) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamport_types::EventKind;
    use parking_lot::Mutex;
    use tracing_test::traced_test;

    #[derive(Default)]
    struct Collect(Mutex<Vec<MachineId>>);

    impl EventSink for Collect {
        fn record(&self, machine: MachineId, _event: &EventRecord) -> Result<(), SinkError> {
            self.0.lock().push(machine);
            Ok(())
        }
    }

    struct Reject;

    impl EventSink for Reject {
        fn record(&self, _machine: MachineId, _event: &EventRecord) -> Result<(), SinkError> {
            Err(SinkError::Rejected("full".to_string()))
        }
    }

    fn record() -> EventRecord {
        EventRecord::now(EventKind::Internal, 0, 1, 0)
    }

    #[test]
    fn test_fanout_reaches_all_sinks_after_failure() {
        let collect = Arc::new(Collect::default());
        let fanout = FanoutSink::new()
            .with(Arc::new(Reject))
            .with(collect.clone());

        let result = fanout.record(MachineId(3), &record());

        assert!(matches!(result, Err(SinkError::Rejected(_))));
        assert_eq!(*collect.0.lock(), vec![MachineId(3)]);
        assert_eq!(fanout.len(), 2);
    }

    #[test]
    fn test_empty_fanout_accepts() {
        let fanout = FanoutSink::new();
        assert!(fanout.is_empty());
        assert!(fanout.record(MachineId(0), &record()).is_ok());
        assert!(NullSink.record(MachineId(0), &record()).is_ok());
    }

    #[traced_test]
    #[test]
    fn test_tracing_sink_logs_description() {
        TracingSink
            .record(MachineId(1), &record())
            .expect("tracing sink never fails");
        assert!(logs_contain("Internal event"));
    }
}
