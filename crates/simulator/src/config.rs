//! Configuration types for the simulator.

use lamport_core::NullSink;
use lamport_simulation::{MachineSpec, Topology, TopologyError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for a simulation run.
#[derive(Clone, Debug)]
pub struct SimulatorConfig {
    /// Tick rate of each machine; machine `i` gets `tick_rates[i]`.
    pub tick_rates: Vec<u32>,

    /// Random seed for the per-machine event draws.
    pub seed: u64,

    /// Wall-clock budget before the workers are stopped.
    pub duration: Duration,

    /// Directory receiving the per-machine log and CSV files.
    pub output_dir: PathBuf,

    /// Whether to purge and write the per-machine files at all.
    pub write_files: bool,
}

impl SimulatorConfig {
    /// Create a configuration with one machine per tick rate.
    pub fn new(tick_rates: Vec<u32>) -> Self {
        Self {
            tick_rates,
            seed: 0,
            duration: Duration::from_secs(10),
            output_dir: PathBuf::from("."),
            write_files: true,
        }
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the run duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Set the output directory.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Disable the per-machine log and CSV files.
    pub fn without_files(mut self) -> Self {
        self.write_files = false;
        self
    }

    /// Number of machines.
    pub fn num_machines(&self) -> usize {
        self.tick_rates.len()
    }

    /// Machine specs with ids `0..n`.
    pub fn machine_specs(&self) -> Vec<MachineSpec> {
        self.tick_rates
            .iter()
            .enumerate()
            .map(|(i, &rate)| MachineSpec::new(i as u64, rate))
            .collect()
    }

    /// Check the machine set without touching the filesystem.
    pub fn validate(&self) -> Result<(), TopologyError> {
        Topology::new(&self.machine_specs(), self.seed, Arc::new(NullSink)).map(|_| ())
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self::new(vec![4, 5, 6])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamport_types::MachineId;

    #[test]
    fn test_default_matches_reference_run() {
        let config = SimulatorConfig::default();
        assert_eq!(config.tick_rates, vec![4, 5, 6]);
        assert_eq!(config.duration, Duration::from_secs(10));
        assert!(config.write_files);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_machine_specs() {
        let specs = SimulatorConfig::new(vec![2, 9]).machine_specs();
        assert_eq!(specs[1].id, MachineId(1));
        assert_eq!(specs[1].tick_rate, 9);
    }

    #[test]
    fn test_validate_rejects_bad_rates() {
        assert!(SimulatorConfig::new(vec![3]).validate().is_err());
        assert!(SimulatorConfig::new(vec![3, 0, 1]).validate().is_err());
    }

    #[test]
    fn test_builders() {
        let config = SimulatorConfig::default()
            .with_seed(9)
            .with_duration(Duration::from_millis(5))
            .with_output_dir("/tmp/out")
            .without_files();
        assert_eq!(config.seed, 9);
        assert_eq!(config.duration, Duration::from_millis(5));
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
        assert!(!config.write_files);
        assert_eq!(config.num_machines(), 3);
    }
}
