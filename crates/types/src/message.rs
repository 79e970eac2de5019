//! Messages exchanged between machines.

use crate::MachineId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Payload {
    /// Sender's logical clock at send time. This is what the random event
    /// loop sends.
    Clock(u64),

    /// Free-form text.
    Text(String),
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Clock(value) => write!(f, "{}", value),
            Payload::Text(text) => f.write_str(text),
        }
    }
}

impl From<&str> for Payload {
    fn from(text: &str) -> Self {
        Payload::Text(text.to_string())
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Payload::Text(text)
    }
}

/// A message sitting in a machine's mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message body.
    pub payload: Payload,
    /// Machine that sent the message.
    pub sender: MachineId,
    /// Sender's logical clock after the send tick.
    pub sender_clock: u64,
}

impl Message {
    /// Create a new message.
    pub fn new(payload: impl Into<Payload>, sender: MachineId, sender_clock: u64) -> Self {
        Self {
            payload: payload.into(),
            sender,
            sender_clock,
        }
    }
}
