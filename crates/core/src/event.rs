//! Random event selection for an idle machine.

/// Smallest value of the per-tick draw.
pub const DRAW_MIN: u32 = 1;

/// Largest value of the per-tick draw.
pub const DRAW_MAX: u32 = 10;

/// What an idle machine does on a tick.
///
/// A machine with an empty mailbox draws a uniform integer in
/// `DRAW_MIN..=DRAW_MAX` and maps it through [`RandomEvent::from_draw`].
/// With the default range that gives a 10% chance for each of the three send
/// variants and 70% for an internal event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RandomEvent {
    /// Send to a single peer, by position in the machine's ascending peer list.
    SendToPeer(usize),

    /// Send the same message to every peer.
    SendToAll,

    /// Tick the clock without communicating.
    Internal,
}

impl RandomEvent {
    /// Map a draw onto an event.
    pub fn from_draw(draw: u32) -> Self {
        match draw {
            1 => RandomEvent::SendToPeer(0),
            2 => RandomEvent::SendToPeer(1),
            3 => RandomEvent::SendToAll,
            _ => RandomEvent::Internal,
        }
    }

    /// Draw an event from `rng`.
    pub fn draw(rng: &mut impl rand::Rng) -> Self {
        Self::from_draw(rng.gen_range(DRAW_MIN..=DRAW_MAX))
    }
}
