//! Generation counters for discarding stale async completions
//!
//! Every async load takes a [`Ticket`] before awaiting. When it resolves,
//! the result is applied only if no newer load started and nobody called
//! [`Generation::invalidate`] in the meantime.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Default)]
pub struct Generation {
    current: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

impl Generation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new load; all earlier tickets become stale
    pub fn begin(&self) -> Ticket {
        Ticket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Make every outstanding ticket stale
    pub fn invalidate(&self) {
        self.current.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}
