//! Event records emitted by machines.

use crate::{MachineId, TickRate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// What happened on a machine.
///
/// The `Display` form is the human-readable description written to the
/// per-machine log and CSV files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    /// Machine announced itself at the start of a run.
    Initialized {
        /// The announcing machine.
        machine: MachineId,
        /// Its tick rate.
        tick_rate: TickRate,
    },

    /// Local clock tick with no communication.
    Internal,

    /// Message sent to a single peer.
    Sent {
        /// Recipient.
        to: MachineId,
    },

    /// Same message sent to every connected peer.
    SentToAll,

    /// Message taken from the mailbox.
    Received {
        /// Original sender.
        from: MachineId,
    },
}

impl EventKind {
    /// Check if this event put messages into other mailboxes.
    pub fn is_send(&self) -> bool {
        matches!(self, EventKind::Sent { .. } | EventKind::SentToAll)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventKind::Initialized { machine, tick_rate } => {
                write!(f, "Initialized machine {} with clock rate {}", machine, tick_rate)
            }
            EventKind::Internal => f.write_str("Internal event"),
            EventKind::Sent { to } => write!(f, "Sent message to {}", to),
            EventKind::SentToAll => f.write_str("Sent message to all recipients"),
            EventKind::Received { from } => write!(f, "Received message from {}", from),
        }
    }
}

/// Immutable snapshot of a machine at the moment it emitted an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Wall-clock time in seconds since the Unix epoch.
    pub wall_clock_time: f64,
    /// Messages still waiting in the machine's mailbox.
    pub pending: usize,
    /// Logical clock after the event.
    pub logical_clock: u64,
    /// Logical clock change since the machine's previous record.
    pub logical_clock_delta: u64,
    /// What happened.
    pub kind: EventKind,
}

impl EventRecord {
    /// Create a record stamped with the current wall-clock time.
    pub fn now(kind: EventKind, pending: usize, logical_clock: u64, previous_clock: u64) -> Self {
        Self {
            wall_clock_time: unix_time_secs(),
            pending,
            logical_clock,
            logical_clock_delta: logical_clock.saturating_sub(previous_clock),
            kind,
        }
    }

    /// Human-readable description of the event.
    pub fn description(&self) -> String {
        self.kind.to_string()
    }
}

/// Current wall-clock time as float seconds since the Unix epoch.
///
/// A clock set before the epoch reads as 0.
pub fn unix_time_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}
