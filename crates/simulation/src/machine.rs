//! A single simulated machine and its execution loop.
//!
//! Each iteration either drains one message from the mailbox (merging its
//! clock) or, when the mailbox is empty, performs a random event: a send to
//! peer #0, a send to peer #1, a send to every peer, or an internal tick.
//! Every iteration emits exactly one [`EventRecord`].
//!
//! Peers are kept in ascending id order, so "peer #0" and "peer #1" are the
//! two lowest ids among the machine's connections.

use crate::mailbox::{Mailbox, MailboxError};
use crate::stats::MachineStats;
use crossbeam::channel::{Receiver, RecvTimeoutError};
use lamport_core::{EventSink, RandomEvent};
use lamport_types::{
    EventKind, EventRecord, LogicalClock, MachineId, Message, Payload, TickRate,
};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

/// Minimum number of peers a machine needs before its loop may run.
///
/// The random event draw can address peer #1 directly.
pub const MIN_PEERS: usize = 2;

/// Errors from direct machine operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// The recipient is not connected to this machine.
    #[error("machine {machine} has no connection to {peer}")]
    UnknownPeer {
        /// Sending machine.
        machine: MachineId,
        /// Requested recipient.
        peer: MachineId,
    },

    /// Delivery failed.
    #[error(transparent)]
    Mailbox(#[from] MailboxError),
}

/// A simulated machine.
///
/// Owns its logical clock and its inbound mailbox. Other machines only ever
/// touch the mailbox, through the `Arc` they were given at connection time.
pub struct Machine {
    id: MachineId,
    tick_rate: TickRate,
    clock: LogicalClock,
    /// Clock value of the previous record, for delta reporting.
    previous_clock: u64,
    mailbox: Arc<Mailbox>,
    peers: BTreeMap<MachineId, Arc<Mailbox>>,
    rng: ChaCha8Rng,
    sink: Arc<dyn EventSink>,
    stats: MachineStats,
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Machine")
            .field("id", &self.id)
            .field("tick_rate", &self.tick_rate)
            .field("clock", &self.clock)
            .field("pending", &self.mailbox.len())
            .field("peers", &self.peers.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Machine {
    /// Create an unconnected machine with a clock at 0.
    ///
    /// `rng` drives the random event draws; pass a seeded generator for a
    /// reproducible sequence.
    pub fn new(
        id: MachineId,
        tick_rate: TickRate,
        rng: ChaCha8Rng,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            id,
            tick_rate,
            clock: LogicalClock::new(),
            previous_clock: 0,
            mailbox: Arc::new(Mailbox::new(id)),
            peers: BTreeMap::new(),
            rng,
            sink,
            stats: MachineStats::new(id, tick_rate),
        }
    }

    pub fn id(&self) -> MachineId {
        self.id
    }

    pub fn tick_rate(&self) -> TickRate {
        self.tick_rate
    }

    /// Current logical clock value.
    pub fn clock(&self) -> u64 {
        self.clock.value()
    }

    /// Messages waiting in this machine's mailbox.
    pub fn pending(&self) -> usize {
        self.mailbox.len()
    }

    /// This machine's inbound mailbox.
    pub fn mailbox(&self) -> &Arc<Mailbox> {
        &self.mailbox
    }

    /// Connected peers in ascending id order.
    pub fn peers(&self) -> Vec<MachineId> {
        self.peers.keys().copied().collect()
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }

    /// Counters accumulated so far.
    pub fn stats(&self) -> &MachineStats {
        &self.stats
    }

    /// Register an outbound handle to `peer`'s mailbox.
    ///
    /// Returns false if the peer was already connected or is this machine.
    pub(crate) fn connect(&mut self, peer: MachineId, mailbox: Arc<Mailbox>) -> bool {
        if peer == self.id || self.peers.contains_key(&peer) {
            return false;
        }
        self.peers.insert(peer, mailbox);
        true
    }

    /// Emit the start-of-run announcement. The clock does not move.
    pub fn announce(&mut self) -> EventRecord {
        self.emit(EventKind::Initialized {
            machine: self.id,
            tick_rate: self.tick_rate,
        })
    }

    /// Tick the clock and send `payload` to `to`.
    ///
    /// Returns the clock value carried by the message. No record is emitted;
    /// the random event loop records its own sends.
    pub fn send_message(
        &mut self,
        payload: impl Into<Payload>,
        to: MachineId,
    ) -> Result<u64, MachineError> {
        if !self.peers.contains_key(&to) {
            return Err(MachineError::UnknownPeer {
                machine: self.id,
                peer: to,
            });
        }
        let clock = self.clock.tick();
        self.deliver(to, Message::new(payload, self.id, clock))?;
        Ok(clock)
    }

    /// Tick the clock once and send the same message to every peer.
    ///
    /// Every peer is attempted; the first delivery error is returned.
    pub fn broadcast(&mut self, payload: impl Into<Payload>) -> Result<u64, MachineError> {
        let clock = self.clock.tick();
        let message = Message::new(payload, self.id, clock);
        let mut first_error = None;
        for peer in self.peers() {
            if let Err(e) = self.deliver(peer, message.clone()) {
                first_error.get_or_insert(e);
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(clock),
        }
    }

    /// Process one message if the mailbox has any.
    pub fn receive(&mut self) -> Option<EventRecord> {
        let message = self.mailbox.try_dequeue()?;
        Some(self.process(message))
    }

    /// Wait for a message and process it.
    ///
    /// Returns `None` if the mailbox is closed while waiting.
    pub fn receive_blocking(&mut self) -> Option<EventRecord> {
        let message = self.mailbox.dequeue()?;
        Some(self.process(message))
    }

    /// Draw a random event and perform it.
    pub fn handle_random_event(&mut self) -> EventRecord {
        let event = RandomEvent::draw(&mut self.rng);
        self.perform(event)
    }

    /// Perform a specific random event.
    ///
    /// A send addressed to a peer position this machine does not have is
    /// downgraded to an internal event with a warning. Machines started by
    /// the runner always have at least [`MIN_PEERS`] peers.
    pub fn perform(&mut self, event: RandomEvent) -> EventRecord {
        let kind = match event {
            RandomEvent::SendToPeer(index) => match self.peers.keys().nth(index).copied() {
                Some(to) => {
                    let clock = self.clock.tick();
                    self.deliver_logged(to, Message::new(Payload::Clock(clock), self.id, clock));
                    EventKind::Sent { to }
                }
                None => {
                    warn!(
                        machine = %self.id,
                        peer_index = index,
                        peers = self.peers.len(),
                        "No peer at index, performing internal event instead"
                    );
                    self.clock.tick();
                    EventKind::Internal
                }
            },
            RandomEvent::SendToAll => {
                let clock = self.clock.tick();
                let message = Message::new(Payload::Clock(clock), self.id, clock);
                for peer in self.peers() {
                    self.deliver_logged(peer, message.clone());
                }
                EventKind::SentToAll
            }
            RandomEvent::Internal => {
                self.clock.tick();
                EventKind::Internal
            }
        };
        self.emit(kind)
    }

    /// One loop iteration, without the wait for the next tick.
    pub fn step(&mut self) -> EventRecord {
        match self.receive() {
            Some(record) => record,
            None => self.handle_random_event(),
        }
    }

    /// Run the loop until `stop` disconnects.
    ///
    /// Iterations are scheduled on fixed tick boundaries. An iteration that
    /// overruns its slot reschedules from now rather than bursting to catch up.
    pub(crate) fn run(mut self, stop: Receiver<()>) -> MachineStats {
        let period = self.tick_rate.period();
        debug!(machine = %self.id, tick_rate = %self.tick_rate, "Machine loop started");

        let mut next_tick = Instant::now();
        loop {
            self.step();

            next_tick += period;
            let now = Instant::now();
            if next_tick < now {
                next_tick = now;
            }
            match stop.recv_timeout(next_tick - now) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        }

        debug!(
            machine = %self.id,
            clock = self.clock.value(),
            events = self.stats.events,
            "Machine loop stopped"
        );
        self.stats
    }

    fn process(&mut self, message: Message) -> EventRecord {
        self.clock.merge(message.sender_clock);
        self.emit(EventKind::Received {
            from: message.sender,
        })
    }

    fn deliver(&mut self, to: MachineId, message: Message) -> Result<(), MachineError> {
        let mailbox = self.peers.get(&to).ok_or(MachineError::UnknownPeer {
            machine: self.id,
            peer: to,
        })?;
        match mailbox.enqueue(message) {
            Ok(()) => {
                self.stats.messages_sent += 1;
                Ok(())
            }
            Err(e) => {
                self.stats.dropped_sends += 1;
                Err(e.into())
            }
        }
    }

    fn deliver_logged(&mut self, to: MachineId, message: Message) {
        if let Err(e) = self.deliver(to, message) {
            debug!(machine = %self.id, peer = %to, error = %e, "Message dropped");
        }
    }

    fn emit(&mut self, kind: EventKind) -> EventRecord {
        let record = EventRecord::now(
            kind,
            self.mailbox.len(),
            self.clock.value(),
            self.previous_clock,
        );
        self.previous_clock = record.logical_clock;
        self.stats.observe(&record);

        if let Err(e) = self.sink.record(self.id, &record) {
            self.stats.sink_failures += 1;
            warn!(machine = %self.id, error = %e, "Failed to record event");
        }
        record
    }
}
