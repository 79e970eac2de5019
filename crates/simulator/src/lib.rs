//! Lamport Simulator
//!
//! Wall-clock driver on top of `lamport-simulation`: runs a fully connected
//! set of machines for a fixed budget and records what they did.
//!
//! # Architecture
//!
//! - **Configuration**: tick rates, seed, duration, output directory
//! - **Output**: per-machine append-only log and CSV files, purged per run
//! - **Reports**: per-machine clocks, message counts and clock jumps
//!
//! # Example
//!
//! ```ignore
//! use lamport_simulator::{Simulator, SimulatorConfig};
//! use std::time::Duration;
//!
//! let config = SimulatorConfig::new(vec![4, 5, 6])
//!     .with_seed(0)
//!     .with_duration(Duration::from_secs(10));
//!
//! let report = Simulator::new(config).run()?;
//! report.print();
//! ```

pub mod config;
pub mod output;
pub mod report;
pub mod runner;

pub use config::SimulatorConfig;
pub use output::{purge_outputs, FileSink};
pub use report::SimulationReport;
pub use runner::Simulator;

use lamport_simulation::{SimulationError, TopologyError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from a simulator run.
#[derive(Debug, Error)]
pub enum SimulatorError {
    /// Invalid machine set.
    #[error("invalid configuration: {0}")]
    Topology(#[from] TopologyError),

    /// The threaded run failed.
    #[error(transparent)]
    Simulation(#[from] SimulationError),

    /// Filesystem access failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// File or directory involved.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Report serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SimulatorError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        SimulatorError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}
