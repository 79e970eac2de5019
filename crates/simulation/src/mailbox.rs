//! Per-machine inbound message queue.
//!
//! The queue and its pending count live under one lock: the count *is* the
//! queue length, so the two can never be observed out of phase. The machine
//! loop uses [`Mailbox::try_dequeue`], which checks and removes in a single
//! critical section.

use lamport_types::{MachineId, Message};
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use thiserror::Error;

/// Errors when delivering into a mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    /// The mailbox was closed at shutdown.
    #[error("mailbox of machine {0} is closed")]
    Closed(MachineId),
}

#[derive(Debug, Default)]
struct MailboxState {
    queue: VecDeque<Message>,
    closed: bool,
}

/// Unbounded FIFO mailbox owned by one receiving machine.
///
/// Any number of threads may enqueue; messages come out in the order the
/// lock serialized the enqueues, regardless of sender.
#[derive(Debug)]
pub struct Mailbox {
    owner: MachineId,
    state: Mutex<MailboxState>,
    available: Condvar,
}

impl Mailbox {
    /// Create an empty, open mailbox for `owner`.
    pub fn new(owner: MachineId) -> Self {
        Self {
            owner,
            state: Mutex::new(MailboxState::default()),
            available: Condvar::new(),
        }
    }

    /// The machine this mailbox delivers to.
    pub fn owner(&self) -> MachineId {
        self.owner
    }

    /// Append a message at the tail.
    pub fn enqueue(&self, message: Message) -> Result<(), MailboxError> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(MailboxError::Closed(self.owner));
        }
        state.queue.push_back(message);
        drop(state);
        self.available.notify_one();
        Ok(())
    }

    /// Remove the head message if there is one.
    ///
    /// Messages already queued stay retrievable after [`Mailbox::close`].
    pub fn try_dequeue(&self) -> Option<Message> {
        self.state.lock().queue.pop_front()
    }

    /// Block until a message is available and remove it.
    ///
    /// Returns `None` once the mailbox is closed and drained.
    pub fn dequeue(&self) -> Option<Message> {
        let mut state = self.state.lock();
        loop {
            if let Some(message) = state.queue.pop_front() {
                return Some(message);
            }
            if state.closed {
                return None;
            }
            self.available.wait(&mut state);
        }
    }

    /// Number of messages waiting.
    pub fn len(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Check if no messages are waiting.
    pub fn is_empty(&self) -> bool {
        self.state.lock().queue.is_empty()
    }

    /// Refuse further enqueues and wake every blocked receiver.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.available.notify_all();
    }

    /// Check if the mailbox has been closed.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }
}
