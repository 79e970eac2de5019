//! Threaded simulation runner.
//!
//! Moves every machine onto its own OS thread and keeps the handles needed to
//! stop them. Stopping is forced rather than negotiated:
//!
//! 1. The stop channel's sender is dropped; every worker sees the disconnect
//!    at its next tick wait and leaves its loop.
//! 2. Every worker is joined. A worker finishes the step it is in, so every
//!    send it records has reached the peer's mailbox.
//! 3. Every mailbox is closed, which releases any receiver blocked in
//!    `dequeue()` outside the runner. Nothing touches a mailbox any more, so
//!    the pending counts read afterwards are final.

use crate::machine::{Machine, MIN_PEERS};
use crate::mailbox::Mailbox;
use crate::stats::{MachineStats, SimulationStats};
use crate::topology::{Topology, TopologyError};
use crossbeam::channel::{self, Sender};
use lamport_types::MachineId;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{error, info};

/// Errors from starting or stopping a run.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// The machine set could not be built.
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// A machine would be able to draw a send to a peer it does not have.
    #[error("machine {machine} has {peers} peers, at least 2 are required to run")]
    NotEnoughPeers {
        /// The under-connected machine.
        machine: MachineId,
        /// How many peers it has.
        peers: usize,
    },

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker for machine {machine}: {source}")]
    Spawn {
        /// The machine whose worker failed to start.
        machine: MachineId,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// A worker panicked; its statistics are lost.
    #[error("worker for machine {0} panicked")]
    WorkerPanicked(MachineId),
}

struct Worker {
    machine: MachineId,
    mailbox: Arc<Mailbox>,
    handle: Option<JoinHandle<MachineStats>>,
}

/// A running simulation.
///
/// Dropping the runner without calling [`SimulationRunner::stop`] performs
/// the same shutdown and discards the statistics.
pub struct SimulationRunner {
    workers: Vec<Worker>,
    stop: Option<Sender<()>>,
    started: Instant,
}

impl SimulationRunner {
    /// Announce every machine and start one worker thread per machine.
    pub fn start(topology: Topology) -> Result<Self, SimulationError> {
        for machine in topology.machines() {
            if machine.peer_count() < MIN_PEERS {
                return Err(SimulationError::NotEnoughPeers {
                    machine: machine.id(),
                    peers: machine.peer_count(),
                });
            }
        }

        let mut machines = topology.into_machines();
        info!(machines = machines.len(), "Starting simulation");

        // Announce before any worker runs so the announcement is each
        // machine's first record.
        for machine in machines.iter_mut() {
            machine.announce();
        }

        let (stop_tx, stop_rx) = channel::bounded::<()>(0);
        let mut runner = Self {
            workers: Vec::with_capacity(machines.len()),
            stop: Some(stop_tx),
            started: Instant::now(),
        };

        for machine in machines {
            let id = machine.id();
            let mailbox = machine.mailbox().clone();
            let stop = stop_rx.clone();
            let handle = spawn_worker(machine, stop).map_err(|source| SimulationError::Spawn {
                machine: id,
                source,
            })?;
            runner.workers.push(Worker {
                machine: id,
                mailbox,
                handle: Some(handle),
            });
        }

        Ok(runner)
    }

    /// Start a run, let it go for `duration`, then stop it.
    pub fn run_for(
        topology: Topology,
        duration: Duration,
    ) -> Result<SimulationStats, SimulationError> {
        let runner = Self::start(topology)?;
        thread::sleep(duration);
        runner.stop()
    }

    /// Stop every worker and collect the run statistics.
    ///
    /// All workers are joined even if one of them panicked; the first panic
    /// is then reported as the error.
    pub fn stop(mut self) -> Result<SimulationStats, SimulationError> {
        self.shutdown()
    }

    fn shutdown(&mut self) -> Result<SimulationStats, SimulationError> {
        drop(self.stop.take());

        let mut machines = Vec::with_capacity(self.workers.len());
        let mut first_panic = None;
        for worker in &mut self.workers {
            let Some(handle) = worker.handle.take() else {
                continue;
            };
            match handle.join() {
                Ok(stats) => machines.push(stats),
                Err(_) => {
                    error!(machine = %worker.machine, "Machine worker panicked");
                    first_panic.get_or_insert(worker.machine);
                }
            }
        }

        // Workers never block in `dequeue()`, so closing after the join only
        // releases outside receivers and refuses sends from outside the run.
        for worker in &self.workers {
            worker.mailbox.close();
        }

        for stats in &mut machines {
            if let Some(worker) = self.workers.iter().find(|w| w.machine == stats.machine) {
                stats.final_pending = worker.mailbox.len();
            }
        }
        machines.sort_by_key(|s| s.machine);

        let elapsed = self.started.elapsed();
        info!(
            machines = machines.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Simulation stopped"
        );

        match first_panic {
            Some(machine) => Err(SimulationError::WorkerPanicked(machine)),
            None => Ok(SimulationStats { machines, elapsed }),
        }
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        if self.stop.is_some() {
            let _ = self.shutdown();
        }
    }
}

fn spawn_worker(
    machine: Machine,
    stop: channel::Receiver<()>,
) -> std::io::Result<JoinHandle<MachineStats>> {
    thread::Builder::new()
        .name(format!("machine-{}", machine.id()))
        .spawn(move || machine.run(stop))
}
