//! Lamport logical clock.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A Lamport logical clock.
///
/// Owned by exactly one machine, so this is a plain counter rather than an
/// atomic. Every operation advances the value by at least one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogicalClock(u64);

impl LogicalClock {
    /// Create a clock starting at 0.
    pub const fn new() -> Self {
        Self(0)
    }

    /// Create a clock starting at a specific value.
    pub const fn with_initial(value: u64) -> Self {
        Self(value)
    }

    /// Current value without advancing.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// Advance for a local event (internal or send).
    ///
    /// Returns the new value.
    pub fn tick(&mut self) -> u64 {
        self.0 += 1;
        self.0
    }

    /// Combine with a clock value carried by a received message.
    ///
    /// Implements `max(local, remote) + 1`, so the result is strictly greater
    /// than both the previous local value and the remote value.
    pub fn merge(&mut self, remote: u64) -> u64 {
        self.0 = self.0.max(remote) + 1;
        self.0
    }
}

impl fmt::Display for LogicalClock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tick_increments_by_one() {
        let mut clock = LogicalClock::new();
        assert_eq!(clock.tick(), 1);
        assert_eq!(clock.tick(), 2);
        assert_eq!(clock.value(), 2);
    }

    #[test]
    fn test_merge_takes_remote_when_ahead() {
        let mut clock = LogicalClock::with_initial(3);
        assert_eq!(clock.merge(10), 11);
    }

    #[test]
    fn test_merge_keeps_local_when_ahead() {
        let mut clock = LogicalClock::with_initial(10);
        assert_eq!(clock.merge(3), 11);
    }

    #[test]
    fn test_merge_equal_values() {
        let mut clock = LogicalClock::with_initial(5);
        assert_eq!(clock.merge(5), 6);
    }

    #[test]
    fn test_merge_is_strictly_greater_than_both_inputs() {
        for local in 0..20u64 {
            for remote in 0..20u64 {
                let mut clock = LogicalClock::with_initial(local);
                let merged = clock.merge(remote);
                assert_eq!(merged, local.max(remote) + 1);
                assert!(merged > local && merged > remote);
            }
        }
    }
}
