//! Domain-specific identifier types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::time::Duration;

/// Machine identifier, unique within a topology.
///
/// Displays as the bare number so it reads naturally inside event
/// descriptions and output file names (`machine_0.log`).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MachineId(pub u64);

impl MachineId {
    /// Get the raw value.
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for MachineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MachineId {
    fn from(id: u64) -> Self {
        MachineId(id)
    }
}

/// Errors when constructing a [`TickRate`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TickRateError {
    /// Tick rates must be strictly positive.
    #[error("tick rate must be positive, got {0}")]
    Zero(u32),
}

/// Number of loop iterations a machine performs per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TickRate(NonZeroU32);

impl TickRate {
    /// Create a tick rate, rejecting zero.
    pub fn new(rate: u32) -> Result<Self, TickRateError> {
        NonZeroU32::new(rate)
            .map(TickRate)
            .ok_or(TickRateError::Zero(rate))
    }

    /// Get the raw value.
    pub fn get(&self) -> u32 {
        self.0.get()
    }

    /// Wall-clock time between two consecutive ticks.
    pub fn period(&self) -> Duration {
        Duration::from_secs(1) / self.0.get()
    }
}

impl TryFrom<u32> for TickRate {
    type Error = TickRateError;

    fn try_from(rate: u32) -> Result<Self, Self::Error> {
        TickRate::new(rate)
    }
}

impl fmt::Display for TickRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_machine_id_display_is_bare_number() {
        assert_eq!(MachineId(7).to_string(), "7");
        assert_eq!(MachineId::from(3).get(), 3);
    }

    #[test]
    fn test_tick_rate_rejects_zero() {
        assert_eq!(TickRate::new(0), Err(TickRateError::Zero(0)));
        assert_eq!(TickRate::new(6).map(|r| r.get()), Ok(6));
    }

    #[test]
    fn test_tick_rate_period() {
        let rate = TickRate::new(4).unwrap();
        assert_eq!(rate.period(), Duration::from_millis(250));

        let rate = TickRate::try_from(1).unwrap();
        assert_eq!(rate.period(), Duration::from_secs(1));
    }
}
