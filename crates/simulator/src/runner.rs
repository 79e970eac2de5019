//! Wall-clock simulator driver.

use crate::config::SimulatorConfig;
use crate::output::{purge_outputs, FileSink};
use crate::report::SimulationReport;
use crate::SimulatorError;
use lamport_core::{EventSink, FanoutSink, TracingSink};
use lamport_simulation::{SimulationRunner, Topology};
use lamport_types::MachineId;
use std::sync::Arc;
use tracing::info;

/// Drives one simulation run from a [`SimulatorConfig`].
///
/// A run validates the machine set, purges the previous run's files,
/// opens fresh ones, starts the machines, waits out the configured duration
/// and stops them.
pub struct Simulator {
    config: SimulatorConfig,
    extra_sinks: Vec<Arc<dyn EventSink>>,
}

impl Simulator {
    /// Create a simulator.
    pub fn new(config: SimulatorConfig) -> Self {
        Self {
            config,
            extra_sinks: Vec::new(),
        }
    }

    /// Also send every record to `sink`.
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.extra_sinks.push(sink);
        self
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run for the configured duration.
    pub fn run(&self) -> Result<SimulationReport, SimulatorError> {
        self.config.validate()?;

        let mut sink = FanoutSink::new().with(Arc::new(TracingSink));
        if self.config.write_files {
            let dir = &self.config.output_dir;
            purge_outputs(dir)?;
            let ids: Vec<MachineId> = self.config.machine_specs().iter().map(|s| s.id).collect();
            sink = sink.with(Arc::new(FileSink::create(dir, &ids)?));
        }
        for extra in &self.extra_sinks {
            sink = sink.with(extra.clone());
        }

        let topology = Topology::fully_connected(
            &self.config.machine_specs(),
            self.config.seed,
            Arc::new(sink),
        )?;

        info!(
            machines = self.config.num_machines(),
            tick_rates = ?self.config.tick_rates,
            seed = self.config.seed,
            duration = ?self.config.duration,
            "Running simulation"
        );
        let stats = SimulationRunner::run_for(topology, self.config.duration)?;

        Ok(SimulationReport {
            seed: self.config.seed,
            duration: self.config.duration,
            stats,
        })
    }
}
