//! Threaded Lamport clock simulation.
//!
//! A small set of machines, each on its own OS thread, exchanging messages
//! through per-machine mailboxes and keeping Lamport logical clocks. Given
//! the same seed, each machine draws the same sequence of random events;
//! interleaving between machines is up to the OS scheduler.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                  SimulationRunner                       │
//! │     one thread per machine, stop channel, join          │
//! │                                                         │
//! │  ┌──────────────┐   enqueue   ┌──────────────┐          │
//! │  │  Machine 0   │ ──────────▶ │  Mailbox 1   │          │
//! │  │  clock, rng  │             └──────┬───────┘          │
//! │  └──────┬───────┘                    │ try_dequeue      │
//! │         │ emit                       ▼                  │
//! │         │                     ┌──────────────┐          │
//! │         │                     │  Machine 1   │          │
//! │         │                     └──────┬───────┘          │
//! │         ▼                            ▼                  │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │     EventSink (shared, thread-safe)                │ │
//! │  └────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────┘
//! ```

mod machine;
mod mailbox;
mod memory_sink;
mod runner;
mod stats;
mod topology;

pub use machine::{Machine, MachineError, MIN_PEERS};
pub use mailbox::{Mailbox, MailboxError};
pub use memory_sink::MemorySink;
pub use runner::{SimulationError, SimulationRunner};
pub use stats::{MachineStats, SimulationStats};
pub use topology::{MachineSpec, Topology, TopologyError, MIN_MACHINES};
