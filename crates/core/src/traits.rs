//! Core traits for event recording.

use crate::SinkError;
use lamport_types::{EventRecord, MachineId};
use std::sync::Arc;

/// A consumer of event records.
///
/// Machines hand every record they emit to a sink. The sink is shared by all
/// machine threads, so implementations must be thread-safe:
///
/// - **Shared**: `record` takes `&self`; any locking is the sink's business
/// - **Best-effort**: a returned error is logged by the machine and the loop
///   carries on
/// - **Non-blocking in spirit**: the call sits on the machine's tick path
///
/// # Example
///
/// ```ignore
/// struct CountingSink(AtomicUsize);
///
/// impl EventSink for CountingSink {
///     fn record(&self, _machine: MachineId, _event: &EventRecord) -> Result<(), SinkError> {
///         self.0.fetch_add(1, Ordering::Relaxed);
///         Ok(())
///     }
/// }
/// ```
pub trait EventSink: Send + Sync {
    /// Record one event emitted by `machine`.
    ///
    /// # Arguments
    ///
    /// * `machine` - The machine that emitted the event
    /// * `event` - Snapshot of the machine at emission time
    fn record(&self, machine: MachineId, event: &EventRecord) -> Result<(), SinkError>;
}

impl<S: EventSink + ?Sized> EventSink for Arc<S> {
    fn record(&self, machine: MachineId, event: &EventRecord) -> Result<(), SinkError> {
        (**self).record(machine, event)
    }
}

impl<S: EventSink + ?Sized> EventSink for Box<S> {
    fn record(&self, machine: MachineId, event: &EventRecord) -> Result<(), SinkError> {
        (**self).record(machine, event)
    }
}
