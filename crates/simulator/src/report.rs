//! Run reports.

use crate::SimulatorError;
use lamport_simulation::SimulationStats;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Outcome of a simulator run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Seed the machines drew from.
    pub seed: u64,
    /// Requested wall-clock budget.
    pub duration: Duration,
    /// Per-machine statistics.
    pub stats: SimulationStats,
}

impl SimulationReport {
    /// Messages that were enqueued but never received.
    pub fn unreceived(&self) -> u64 {
        self.stats.total_pending()
    }

    /// Print a summary table to stdout.
    pub fn print(&self) {
        println!();
        println!(
            "Lamport simulation: {} machines, seed {}, ran {:.2?}",
            self.stats.machines.len(),
            self.seed,
            self.stats.elapsed
        );
        println!(
            "{:>8} {:>5} {:>7} {:>7} {:>6} {:>6} {:>9} {:>9} {:>8}",
            "machine", "rate", "clock", "events", "sent", "recv", "max jump", "pending", "sink err"
        );
        for m in &self.stats.machines {
            println!(
                "{:>8} {:>5} {:>7} {:>7} {:>6} {:>6} {:>9} {:>9} {:>8}",
                m.machine.to_string(),
                m.tick_rate.get(),
                m.final_clock,
                m.events,
                m.messages_sent,
                m.messages_received,
                m.max_clock_jump,
                m.final_pending,
                m.sink_failures
            );
        }
        println!(
            "Messages: {} sent, {} received, {} still queued; clock spread {}",
            self.stats.total_messages_sent(),
            self.stats.total_messages_received(),
            self.unreceived(),
            self.stats.clock_spread()
        );
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> Result<String, SimulatorError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the JSON form to `path`.
    pub fn write_json(&self, path: &Path) -> Result<(), SimulatorError> {
        fs::write(path, self.to_json()?).map_err(|e| SimulatorError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamport_simulation::MachineStats;
    use lamport_types::{MachineId, TickRate};

    fn report() -> SimulationReport {
        let mut stats = MachineStats::new(MachineId(0), TickRate::new(4).unwrap());
        stats.final_clock = 31;
        stats.final_pending = 2;
        SimulationReport {
            seed: 5,
            duration: Duration::from_secs(1),
            stats: SimulationStats {
                machines: vec![stats],
                elapsed: Duration::from_millis(1002),
            },
        }
    }

    #[test]
    fn test_json_contains_machine_stats() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json().unwrap()).unwrap();

        assert_eq!(json["seed"], 5);
        assert_eq!(json["stats"]["machines"][0]["machine"], 0);
        assert_eq!(json["stats"]["machines"][0]["tick_rate"], 4);
        assert_eq!(json["stats"]["machines"][0]["final_clock"], 31);
    }

    #[test]
    fn test_unreceived() {
        assert_eq!(report().unreceived(), 2);
    }
}
