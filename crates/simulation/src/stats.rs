//! Run statistics.

use lamport_types::{EventKind, EventRecord, MachineId, TickRate};
use serde::Serialize;
use std::time::Duration;

/// Counters for one machine over a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MachineStats {
    /// The machine.
    pub machine: MachineId,
    /// Its tick rate.
    pub tick_rate: TickRate,
    /// Logical clock at the last emitted record.
    pub final_clock: u64,
    /// Records emitted, including the start-of-run announcement.
    pub events: u64,
    /// Internal events.
    pub internal_events: u64,
    /// Send events (a send-to-all counts once here).
    pub send_events: u64,
    /// Messages successfully enqueued into peer mailboxes.
    pub messages_sent: u64,
    /// Messages taken from this machine's mailbox.
    pub messages_received: u64,
    /// Largest clock delta between two consecutive records.
    ///
    /// Anything above 1 is a receive that pulled the clock forward to catch
    /// up with a faster peer.
    pub max_clock_jump: u64,
    /// Records the sink refused.
    pub sink_failures: u64,
    /// Sends that hit a closed mailbox during shutdown.
    pub dropped_sends: u64,
    /// Messages left in the mailbox after every worker stopped.
    pub final_pending: usize,
}

impl MachineStats {
    /// Create zeroed stats for a machine.
    pub fn new(machine: MachineId, tick_rate: TickRate) -> Self {
        Self {
            machine,
            tick_rate,
            final_clock: 0,
            events: 0,
            internal_events: 0,
            send_events: 0,
            messages_sent: 0,
            messages_received: 0,
            max_clock_jump: 0,
            sink_failures: 0,
            dropped_sends: 0,
            final_pending: 0,
        }
    }

    /// Account for an emitted record.
    pub(crate) fn observe(&mut self, record: &EventRecord) {
        self.events += 1;
        self.final_clock = record.logical_clock;
        self.max_clock_jump = self.max_clock_jump.max(record.logical_clock_delta);
        if record.kind.is_send() {
            self.send_events += 1;
        }
        match record.kind {
            EventKind::Internal => self.internal_events += 1,
            EventKind::Received { .. } => self.messages_received += 1,
            EventKind::Initialized { .. } | EventKind::Sent { .. } | EventKind::SentToAll => {}
        }
    }
}

/// Statistics for a whole run, ordered by machine id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SimulationStats {
    /// Per-machine counters.
    pub machines: Vec<MachineStats>,
    /// Wall-clock time between start and stop.
    pub elapsed: Duration,
}

impl SimulationStats {
    /// Get the stats for one machine.
    pub fn machine(&self, id: MachineId) -> Option<&MachineStats> {
        self.machines.iter().find(|m| m.machine == id)
    }

    /// Messages enqueued across all machines.
    pub fn total_messages_sent(&self) -> u64 {
        self.machines.iter().map(|m| m.messages_sent).sum()
    }

    /// Messages received across all machines.
    pub fn total_messages_received(&self) -> u64 {
        self.machines.iter().map(|m| m.messages_received).sum()
    }

    /// Messages still queued after the run.
    pub fn total_pending(&self) -> u64 {
        self.machines.iter().map(|m| m.final_pending as u64).sum()
    }

    /// Difference between the highest and lowest final clock.
    pub fn clock_spread(&self) -> u64 {
        let max = self.machines.iter().map(|m| m.final_clock).max();
        let min = self.machines.iter().map(|m| m.final_clock).min();
        match (max, min) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        }
    }
}
