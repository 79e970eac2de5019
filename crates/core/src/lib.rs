//! Core abstractions for the Lamport machine simulation.
//!
//! - [`EventSink`]: where machines send their event records
//! - [`RandomEvent`]: what an idle machine does on a tick
//!
//! The threaded machinery lives in `lamport-simulation`; this crate stays
//! free of threads so sinks can be written without depending on it.

mod event;
mod sink;
mod traits;

pub use event::{RandomEvent, DRAW_MAX, DRAW_MIN};
pub use sink::{FanoutSink, NullSink, SinkError, TracingSink};
pub use traits::EventSink;
