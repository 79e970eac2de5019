//! Fully connected machine topology.

use crate::machine::Machine;
use lamport_core::EventSink;
use lamport_types::{MachineId, TickRate, TickRateError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeSet;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Minimum number of machines in a topology.
pub const MIN_MACHINES: usize = 2;

/// Errors that can occur when building or wiring a topology.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// Not enough machines to exchange messages.
    #[error("a topology needs at least 2 machines, got {0}")]
    TooFewMachines(usize),

    /// Two machines share an id.
    #[error("duplicate machine id {0}")]
    DuplicateMachine(MachineId),

    /// A machine was given a tick rate of zero.
    #[error("invalid tick rate for machine {machine}: {source}")]
    InvalidTickRate {
        /// The offending machine.
        machine: MachineId,
        /// Why the rate was rejected.
        #[source]
        source: TickRateError,
    },

    /// The id does not belong to this topology.
    #[error("machine {0} is not in the topology")]
    UnknownMachine(MachineId),

    /// A machine cannot be connected to itself.
    #[error("machine {0} cannot connect to itself")]
    SelfConnection(MachineId),
}

/// Identity and tick rate of one machine to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MachineSpec {
    pub id: MachineId,
    /// Iterations per second; must be positive.
    pub tick_rate: u32,
}

impl MachineSpec {
    pub fn new(id: u64, tick_rate: u32) -> Self {
        Self {
            id: MachineId(id),
            tick_rate,
        }
    }
}

/// The set of machines of a run and their connections.
///
/// Machines are kept in ascending id order.
#[derive(Debug)]
pub struct Topology {
    machines: Vec<Machine>,
}

impl Topology {
    /// Build machines without connecting them.
    ///
    /// Each machine gets its own random stream derived from `seed`, so its
    /// draw sequence is reproducible and independent of the other machines.
    pub fn new(
        specs: &[MachineSpec],
        seed: u64,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, TopologyError> {
        if specs.len() < MIN_MACHINES {
            return Err(TopologyError::TooFewMachines(specs.len()));
        }

        let mut seen = BTreeSet::new();
        let mut machines = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.id) {
                return Err(TopologyError::DuplicateMachine(spec.id));
            }
            let tick_rate =
                TickRate::new(spec.tick_rate).map_err(|source| TopologyError::InvalidTickRate {
                    machine: spec.id,
                    source,
                })?;
            machines.push(Machine::new(
                spec.id,
                tick_rate,
                machine_rng(seed, spec.id),
                sink.clone(),
            ));
        }
        machines.sort_by_key(|m| m.id());

        Ok(Self { machines })
    }

    /// Build machines and connect every pair in both directions.
    pub fn fully_connected(
        specs: &[MachineSpec],
        seed: u64,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, TopologyError> {
        let mut topology = Self::new(specs, seed, sink)?;
        topology.connect_all();
        Ok(topology)
    }

    /// Connect `a` and `b` in both directions.
    ///
    /// Returns false if they were already connected.
    pub fn connect(&mut self, a: MachineId, b: MachineId) -> Result<bool, TopologyError> {
        if a == b {
            return Err(TopologyError::SelfConnection(a));
        }
        let a_index = self.index_of(a)?;
        let b_index = self.index_of(b)?;
        Ok(self.connect_indices(a_index, b_index))
    }

    /// Connect every unordered pair. Existing connections are left alone.
    pub fn connect_all(&mut self) {
        let len = self.machines.len();
        for a in 0..len {
            for b in a + 1..len {
                self.connect_indices(a, b);
            }
        }
    }

    /// Connect the machines at two distinct positions in both directions.
    fn connect_indices(&mut self, a: usize, b: usize) -> bool {
        let a_id = self.machines[a].id();
        let b_id = self.machines[b].id();
        let a_mailbox = self.machines[a].mailbox().clone();
        let b_mailbox = self.machines[b].mailbox().clone();
        let a_added = self.machines[a].connect(b_id, b_mailbox);
        let b_added = self.machines[b].connect(a_id, a_mailbox);

        if a_added || b_added {
            debug!(a = %a_id, b = %b_id, "Connected machines");
        }
        a_added || b_added
    }

    /// Peers of `id` in ascending order.
    pub fn connections(&self, id: MachineId) -> Result<Vec<MachineId>, TopologyError> {
        Ok(self.machines[self.index_of(id)?].peers())
    }

    pub fn machine(&self, id: MachineId) -> Option<&Machine> {
        self.index_of(id).ok().map(|i| &self.machines[i])
    }

    pub fn machine_mut(&mut self, id: MachineId) -> Option<&mut Machine> {
        self.index_of(id).ok().map(move |i| &mut self.machines[i])
    }

    pub fn machines(&self) -> impl Iterator<Item = &Machine> {
        self.machines.iter()
    }

    pub fn len(&self) -> usize {
        self.machines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machines.is_empty()
    }

    /// Hand the machines over, e.g. to move them onto worker threads.
    pub fn into_machines(self) -> Vec<Machine> {
        self.machines
    }

    fn index_of(&self, id: MachineId) -> Result<usize, TopologyError> {
        self.machines
            .binary_search_by_key(&id, |m| m.id())
            .map_err(|_| TopologyError::UnknownMachine(id))
    }
}

/// Per-machine random stream: the run seed, with the machine id as the
/// ChaCha stream number.
fn machine_rng(seed: u64, id: MachineId) -> ChaCha8Rng {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    rng.set_stream(id.0);
    rng
}

#[cfg(test)]
mod tests {
    use super::*;
    use lamport_core::NullSink;
    use lamport_types::EventKind;

    fn specs(rates: &[u32]) -> Vec<MachineSpec> {
        rates
            .iter()
            .enumerate()
            .map(|(i, &rate)| MachineSpec::new(i as u64, rate))
            .collect()
    }

    fn build(rates: &[u32], seed: u64) -> Topology {
        Topology::fully_connected(&specs(rates), seed, Arc::new(NullSink)).unwrap()
    }

    #[test]
    fn test_fully_connected() {
        let topology = build(&[4, 5, 6], 0);

        assert_eq!(topology.len(), 3);
        assert_eq!(
            topology.connections(MachineId(0)).unwrap(),
            vec![MachineId(1), MachineId(2)]
        );
        assert_eq!(
            topology.connections(MachineId(1)).unwrap(),
            vec![MachineId(0), MachineId(2)]
        );
        assert_eq!(
            topology.connections(MachineId(2)).unwrap(),
            vec![MachineId(0), MachineId(1)]
        );
    }

    #[test]
    fn test_connect_is_idempotent() {
        let mut topology = Topology::new(&specs(&[1, 1, 1]), 0, Arc::new(NullSink)).unwrap();
        assert!(topology.connections(MachineId(0)).unwrap().is_empty());

        assert_eq!(topology.connect(MachineId(0), MachineId(1)), Ok(true));
        assert_eq!(topology.connect(MachineId(1), MachineId(0)), Ok(false));
        assert_eq!(topology.connect(MachineId(0), MachineId(1)), Ok(false));

        assert_eq!(topology.connections(MachineId(0)).unwrap(), vec![MachineId(1)]);
        assert_eq!(topology.connections(MachineId(1)).unwrap(), vec![MachineId(0)]);

        topology.connect_all();
        topology.connect_all();
        assert_eq!(topology.connections(MachineId(2)).unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_self_and_unknown_connections() {
        let mut topology = build(&[1, 1], 0);
        assert_eq!(
            topology.connect(MachineId(1), MachineId(1)),
            Err(TopologyError::SelfConnection(MachineId(1)))
        );
        assert_eq!(
            topology.connect(MachineId(0), MachineId(9)),
            Err(TopologyError::UnknownMachine(MachineId(9)))
        );
        assert!(!topology
            .machine(MachineId(0))
            .unwrap()
            .peers()
            .contains(&MachineId(0)));
    }

    #[test]
    fn test_configuration_errors() {
        let sink: Arc<dyn EventSink> = Arc::new(NullSink);

        assert_eq!(
            Topology::new(&specs(&[3]), 0, sink.clone()).unwrap_err(),
            TopologyError::TooFewMachines(1)
        );
        assert_eq!(
            Topology::new(&[MachineSpec::new(1, 2), MachineSpec::new(1, 3)], 0, sink.clone())
                .unwrap_err(),
            TopologyError::DuplicateMachine(MachineId(1))
        );
        assert!(matches!(
            Topology::new(&specs(&[2, 0]), 0, sink).unwrap_err(),
            TopologyError::InvalidTickRate {
                machine: MachineId(1),
                ..
            }
        ));
    }

    #[test]
    fn test_machines_sorted_by_id() {
        let topology = Topology::fully_connected(
            &[MachineSpec::new(7, 1), MachineSpec::new(2, 1), MachineSpec::new(5, 1)],
            0,
            Arc::new(NullSink),
        )
        .unwrap();
        let ids: Vec<_> = topology.machines().map(|m| m.id()).collect();
        assert_eq!(ids, vec![MachineId(2), MachineId(5), MachineId(7)]);
        assert_eq!(
            topology.connections(MachineId(7)).unwrap(),
            vec![MachineId(2), MachineId(5)]
        );
    }

    #[test]
    fn test_two_machines_hello_scenario() {
        let mut topology = build(&[1, 1], 0);
        let a = MachineId(0);
        let b = MachineId(1);

        topology
            .machine_mut(a)
            .unwrap()
            .send_message("hello", b)
            .unwrap();

        let receiver = topology.machine_mut(b).unwrap();
        let record = receiver.receive_blocking().unwrap();
        assert_eq!(record.kind, EventKind::Received { from: a });
        assert_eq!(receiver.clock(), 2);
    }

    #[test]
    fn test_ten_random_events_are_reproducible() {
        let trace = |seed: u64| {
            let mut topology = build(&[4, 5, 6], seed);
            let machine = topology.machine_mut(MachineId(0)).unwrap();
            let kinds: Vec<_> = (0..10)
                .map(|_| machine.handle_random_event().kind)
                .collect();
            let clock = machine.clock();
            let delivered: Vec<_> = [MachineId(1), MachineId(2)]
                .iter()
                .map(|id| topology.machine(*id).unwrap().pending())
                .collect();
            (kinds, clock, delivered)
        };

        // Seed 0 on machine 0 draws 7, 8, 8, 6, 6, 1, 6, 5, 9, 9.
        let mut expected = vec![EventKind::Internal; 10];
        expected[5] = EventKind::Sent { to: MachineId(1) };

        let (kinds, clock, delivered) = trace(0);
        assert_eq!(kinds, expected);
        // Nothing was received, so every event ticked exactly once.
        assert_eq!(clock, 10);
        assert_eq!(delivered, vec![1, 0]);

        assert_eq!(trace(0), (kinds, clock, delivered));
    }

    #[test]
    fn test_machines_draw_independent_streams() {
        let mut topology = build(&[1, 1, 1], 11);
        let draws = |m: &mut Machine| -> Vec<EventKind> {
            (0..40).map(|_| m.handle_random_event().kind).collect()
        };
        let first = draws(topology.machine_mut(MachineId(0)).unwrap());
        let second = draws(topology.machine_mut(MachineId(1)).unwrap());

        let is_internal = |kinds: &[EventKind]| -> Vec<bool> {
            kinds.iter().map(|k| *k == EventKind::Internal).collect()
        };
        assert_ne!(is_internal(&first), is_internal(&second));
    }
}
