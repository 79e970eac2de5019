//! Core types for the Lamport machine simulation.
//!
//! Everything here is plain data: identifiers, the logical clock, mailbox
//! messages and the event records machines emit. No threads, no I/O.

mod clock;
mod identifiers;
mod message;
mod record;

pub use clock::LogicalClock;
pub use identifiers::{MachineId, TickRate, TickRateError};
pub use message::{Message, Payload};
pub use record::{unix_time_secs, EventKind, EventRecord};
