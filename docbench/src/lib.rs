//! A throughput-benchmarking harness for remote document databases.
//!
//! The harness partitions a fixed total operation count across a pool of
//! concurrent workers, dispatches each operation through a pluggable
//! [`Operation`](operation::Operation) strategy, and accumulates per-worker
//! capacity-unit counters without contention. A reporter prints a throughput
//! snapshot once per second while workers are running, and a final summary
//! when they finish.
//!
//! Four operations can be benchmarked: inserting freshly generated orders,
//! point-reading a single document, reading collection metadata, and running
//! a paged query. Write runs draw their synthetic customers and catalog items
//! from pre-populated [`records`] pools, so the same customer places several
//! orders and the same item is ordered multiple times.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

pub mod config;
mod context;
pub mod experiment;
pub mod operation;
pub mod provision;
pub mod records;
mod report;
