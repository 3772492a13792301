//! Innovation number tracking for connection genes.
//!
//! Every connection gene is stamped with an innovation number the moment it is
//! constructed. Numbers come from an [`InnovationCounter`] that the population
//! manager owns and lends to seeding and mutation, so two independent
//! populations never share hidden state and tests can rewind a counter
//! between runs.
//!
//! The counter is backed by an atomic so that fitness evaluation can be
//! spread across threads without coordinating on innovation draws.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonically increasing source of innovation numbers.
///
/// Values are handed out in creation order, starting from the counter's
/// initial value, and are never reused for the lifetime of the counter
/// (unless [`reset`](Self::reset) is called explicitly).
#[derive(Debug, Default)]
pub struct InnovationCounter {
    next: AtomicU64,
}

impl InnovationCounter {
    /// Create a counter whose first innovation number is `0`.
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create a counter whose first innovation number is `start`.
    #[must_use]
    pub fn starting_at(start: u64) -> Self {
        Self {
            next: AtomicU64::new(start),
        }
    }

    /// Draw the next innovation number.
    #[inline]
    pub fn next_innovation(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }

    /// The number the next call to [`next_innovation`](Self::next_innovation) will return.
    #[inline]
    #[must_use]
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }

    /// Rewind the counter to `0`.
    pub fn reset(&self) {
        self.next.store(0, Ordering::Relaxed);
    }
}

impl Clone for InnovationCounter {
    fn clone(&self) -> Self {
        Self::starting_at(self.peek())
    }
}
