//! Advisory progress and cancellation for long Monte Carlo batches.
//!
//! Purely a side channel: the numeric results never depend on it. The batch
//! driver checks [Progress::is_cancelled] between chunks, so cancellation
//! lands between runs and never interrupts a run mid-attempt.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct Progress {
    total: usize,
    completed: AtomicUsize,
    cancelled: AtomicBool,
}

impl Progress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: AtomicUsize::new(0),
            cancelled: AtomicBool::new(false),
        }
    }

    /// Record `n` more finished runs.
    pub fn advance(&self, n: usize) {
        self.completed.fetch_add(n, Ordering::Relaxed);
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        self.completed() as f64 / self.total as f64 * 100.0
    }

    /// Ask the batch driver to stop after the current chunk.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}
