//! The experiment engine.
//!
//! The orchestrator derives the worker count, partitions the total operation
//! count across the workers, pre-populates record pools for write runs, and
//! then runs all workers plus the reporter concurrently until every task has
//! finished. Workers execute their assigned share of operations strictly
//! sequentially; all cross-worker state lives in the run's
//! [`RunContext`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use docbench_client::{CollectionRef, SharedStore};

use crate::config::ExperimentConfig;
use crate::context::RunContext;
use crate::operation::Category;
use crate::records::Pools;
use crate::report;

/// Each worker is assumed to sustain roughly this many capacity units per
/// second when the worker count is derived from a throughput hint.
const UNITS_PER_WORKER: u32 = 333;

/// Cap on the derived worker count, protecting the client connection pool.
const MAX_DERIVED_WORKERS: u32 = 250;

/// State shared by the workers and the reporter of one run.
#[derive(Debug)]
pub(crate) struct RunState {
    pub(crate) store: SharedStore,
    pub(crate) collection: CollectionRef,
    pub(crate) config: ExperimentConfig,
    pub(crate) pools: Pools,
    pub(crate) context: RunContext,
}

/// What a finished run amounted to.
#[derive(Debug, Clone, Copy)]
pub struct RunSummary {
    /// Operations that completed (including denied calls).
    pub operations: u64,
    /// Capacity units consumed across all workers.
    pub units: f64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
}

/// Runs the configured total number of operations against the given
/// collection, spread across the derived number of workers.
///
/// Returns only after every worker and the reporter have stopped.
pub async fn run(
    store: SharedStore,
    collection: CollectionRef,
    config: ExperimentConfig,
) -> Result<RunSummary> {
    let workers = worker_count(&config)?;

    let pools = match config.operation.category() {
        Category::Write => {
            println!("Setting up experiment...");
            Pools::allocate(config.operations)
        }
        _ => Pools::empty(),
    };

    println!("Starting experiment with {workers} workers");
    let shares = partition(config.operations, workers);
    if config.verbose {
        println!("Operations per worker: {shares:?}");
    }

    let state = Arc::new(RunState {
        store,
        collection,
        config,
        pools,
        context: RunContext::new(workers),
    });
    let started = Instant::now();

    let mut tasks = Vec::with_capacity(workers + 1);
    tasks.push(tokio::spawn(report::report(Arc::clone(&state), started)));
    for (worker_id, share) in shares.into_iter().enumerate() {
        let state = Arc::clone(&state);
        tasks.push(tokio::spawn(run_worker(state, worker_id, share)));
    }
    futures::future::join_all(tasks).await;

    Ok(RunSummary {
        operations: state.context.operations(),
        units: state.context.total_units(),
        elapsed: started.elapsed(),
    })
}

/// The number of workers for this run: the explicit parallelism when one is
/// set, otherwise derived from the throughput hint.
fn worker_count(config: &ExperimentConfig) -> Result<usize> {
    match config.parallelism {
        Some(0) => bail!("parallelism must be at least 1"),
        Some(workers) => Ok(workers),
        None => Ok((config.throughput / UNITS_PER_WORKER).clamp(1, MAX_DERIVED_WORKERS) as usize),
    }
}

/// Splits `total` operations across `workers`, assigning the remainder to the
/// last worker. The shares always sum to `total` exactly; with more workers
/// than operations, all but the last worker get zero.
fn partition(total: u64, workers: usize) -> Vec<u64> {
    let base = total / workers as u64;
    let remainder = total - base * workers as u64;

    let mut shares = vec![base; workers];
    if let Some(last) = shares.last_mut() {
        *last += remainder;
    }
    shares
}

/// Executes the assigned share of operations sequentially, then signals
/// completion. Per-operation failures are handled by the operation itself and
/// never abort the remaining iterations.
async fn run_worker(state: Arc<RunState>, worker_id: usize, operations: u64) {
    for _ in 0..operations {
        state.config.operation.execute(&state, worker_id).await;
    }
    state.context.finish_worker();
}

#[cfg(test)]
mod tests {
    use crate::operation::Operation;

    use super::*;

    fn config(parallelism: Option<usize>, throughput: u32) -> ExperimentConfig {
        ExperimentConfig {
            operations: 10,
            parallelism,
            throughput,
            operation: Operation::Insert,
            verbose: false,
            record: false,
        }
    }

    #[test]
    fn partition_always_sums_to_total() {
        for total in [0, 1, 7, 100, 101, 9999] {
            for workers in [1, 2, 3, 4, 17, 250] {
                let shares = partition(total, workers);
                assert_eq!(shares.len(), workers);
                assert_eq!(shares.iter().sum::<u64>(), total);
            }
        }
    }

    #[test]
    fn partition_assigns_remainder_to_last_worker() {
        assert_eq!(partition(100, 4), vec![25, 25, 25, 25]);
        assert_eq!(partition(101, 4), vec![25, 25, 25, 26]);
        assert_eq!(partition(10, 3), vec![3, 3, 4]);
    }

    #[test]
    fn more_workers_than_operations_assigns_all_to_last() {
        let shares = partition(3, 8);
        assert_eq!(&shares[..7], &[0; 7]);
        assert_eq!(shares[7], 3);
    }

    #[test]
    fn explicit_parallelism_wins() {
        assert_eq!(worker_count(&config(Some(7), 100_000)).unwrap(), 7);
        assert!(worker_count(&config(Some(0), 1000)).is_err());
    }

    #[test]
    fn derived_worker_count_is_clamped() {
        assert_eq!(worker_count(&config(None, 1000)).unwrap(), 3);
        assert_eq!(worker_count(&config(None, 0)).unwrap(), 1);
        assert_eq!(worker_count(&config(None, 100)).unwrap(), 1);
        assert_eq!(worker_count(&config(None, 1_000_000)).unwrap(), 250);
    }
}
