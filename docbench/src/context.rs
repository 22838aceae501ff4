//! Cross-worker counters for a single benchmark run.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Aggregation state shared by the workers and the reporter of one run.
///
/// The context is constructed per run and owns all counters, so several
/// experiments can run in one process without stepping on each other.
#[derive(Debug)]
pub struct RunContext {
    operations: AtomicU64,
    pending_workers: AtomicUsize,
    units: Box<[AtomicU64]>,
}

impl RunContext {
    /// Creates the context for a run with the given number of workers.
    ///
    /// The pending-worker count starts at `workers` and reaches zero exactly
    /// once, when the last worker finishes.
    pub fn new(workers: usize) -> Self {
        Self {
            operations: AtomicU64::new(0),
            pending_workers: AtomicUsize::new(workers),
            units: (0..workers).map(|_| AtomicU64::new(0f64.to_bits())).collect(),
        }
    }

    /// Counts one completed operation.
    pub fn increment_operations(&self) {
        self.operations.fetch_add(1, Ordering::Relaxed);
    }

    /// The number of completed operations so far.
    pub fn operations(&self) -> u64 {
        self.operations.load(Ordering::Relaxed)
    }

    /// Adds consumed capacity units to the given worker's cell.
    ///
    /// Each cell has a single writer, the worker that owns it, so the plain
    /// load/store read-modify-write cannot lose updates.
    pub fn add_units(&self, worker_id: usize, units: f64) {
        let cell = &self.units[worker_id];
        let current = f64::from_bits(cell.load(Ordering::Relaxed));
        cell.store((current + units).to_bits(), Ordering::Relaxed);
    }

    /// Sums the capacity units consumed across all workers.
    pub fn total_units(&self) -> f64 {
        self.units
            .iter()
            .map(|cell| f64::from_bits(cell.load(Ordering::Relaxed)))
            .sum()
    }

    /// Marks one worker as finished.
    pub fn finish_worker(&self) {
        self.pending_workers.fetch_sub(1, Ordering::Release);
    }

    /// The number of workers that have not finished yet.
    pub fn pending_workers(&self) -> usize {
        self.pending_workers.load(Ordering::Acquire)
    }
}
