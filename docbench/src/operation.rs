//! The operation strategies a run can benchmark.
//!
//! Operations are a closed set resolved at startup: unknown names are rejected
//! when arguments are parsed, and per-kind settings (query string, document
//! link, partition key) are validated before any worker starts. At run time an
//! operation executes one instance of itself against the store and reports
//! into the run's counters; failures are logged and never reach the worker.

use std::fmt;
use std::str::FromStr;

use docbench_client::{DocumentStore, StoreError};
use serde::{Deserialize, Serialize};

use crate::experiment::RunState;
use crate::records::Order;

/// The kind of operation to benchmark, as named on the command line or in the
/// configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OperationKind {
    /// Insert a freshly generated order.
    Insert,
    /// Read a single document by its link.
    PointRead,
    /// Read collection metadata.
    CollectionRead,
    /// Run a query and page through its results.
    Query,
}

impl OperationKind {
    /// The name this kind is selected by.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::PointRead => "point-read",
            Self::CollectionRead => "collection-read",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The operation-kind parse error.
#[derive(Clone, Debug)]
pub struct KindParseError(String);

impl fmt::Display for KindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            r#"error parsing "{}" as operation: expected one of "insert", "point-read", "collection-read", "query""#,
            self.0
        )
    }
}

impl std::error::Error for KindParseError {}

impl FromStr for OperationKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s {
            "insert" => Self::Insert,
            "point-read" => Self::PointRead,
            "collection-read" => Self::CollectionRead,
            "query" => Self::Query,
            other => return Err(KindParseError(other.into())),
        };

        Ok(kind)
    }
}

/// Broad category of an operation.
///
/// The category decides whether record pools are pre-populated before the run
/// starts, and labels the reporter's output lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Operations that write documents.
    Write,
    /// Operations that read documents or metadata.
    Read,
    /// Operations that run queries.
    Query,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Write => "Write",
            Self::Read => "Read",
            Self::Query => "Query",
        })
    }
}

/// A fully resolved operation, carrying the settings its kind requires.
#[derive(Debug, Clone)]
pub enum Operation {
    /// Insert a freshly generated order.
    Insert,
    /// Read the document at `link` within the `partition_key` partition.
    PointRead {
        /// Link of the document to read.
        link: String,
        /// Value of the partition key to access.
        partition_key: String,
    },
    /// Read collection metadata.
    CollectionRead,
    /// Run `query` and page through its results.
    Query {
        /// The query string to run.
        query: String,
    },
}

impl Operation {
    /// Resolves an operation from its kind and the optional settings, failing
    /// fast when a required setting is missing.
    pub fn resolve(
        kind: OperationKind,
        query: Option<String>,
        link: Option<String>,
        partition_key: Option<String>,
    ) -> anyhow::Result<Self> {
        use anyhow::Context;

        let operation = match kind {
            OperationKind::Insert => Self::Insert,
            OperationKind::CollectionRead => Self::CollectionRead,
            OperationKind::PointRead => Self::PointRead {
                link: link.context("point-read requires a document link (--link)")?,
                partition_key: partition_key
                    .context("point-read requires a partition key (--key)")?,
            },
            OperationKind::Query => Self::Query {
                query: query.context("query requires a query string (--query)")?,
            },
        };

        Ok(operation)
    }

    /// The kind this operation was resolved from.
    pub fn kind(&self) -> OperationKind {
        match self {
            Self::Insert => OperationKind::Insert,
            Self::PointRead { .. } => OperationKind::PointRead,
            Self::CollectionRead => OperationKind::CollectionRead,
            Self::Query { .. } => OperationKind::Query,
        }
    }

    /// The broad category of this operation.
    pub fn category(&self) -> Category {
        match self {
            Self::Insert => Category::Write,
            Self::PointRead { .. } | Self::CollectionRead => Category::Read,
            Self::Query { .. } => Category::Query,
        }
    }

    /// Executes one instance of this operation against the run's store.
    pub(crate) async fn execute(&self, state: &RunState, worker_id: usize) {
        match self {
            Self::Insert => insert(state, worker_id).await,
            Self::PointRead {
                link,
                partition_key,
            } => point_read(state, link, partition_key, worker_id).await,
            Self::CollectionRead => read_collection(state, worker_id).await,
            Self::Query { query } => query_collection(state, query, worker_id).await,
        }
    }
}

async fn insert(state: &RunState, worker_id: usize) {
    let order = Order::generate(&state.pools, &mut rand::rng());
    let document = match serde_json::to_value(&order) {
        Ok(document) => document,
        Err(err) => {
            tracing::error!("failed to serialize order: {err}");
            return;
        }
    };

    match state.store.create_document(&state.collection, &document).await {
        Ok(response) => {
            if state.config.record {
                println!("Order: {document}");
            }
            state.context.increment_operations();
            state.context.add_units(worker_id, response.charge);
        }
        Err(err) => record_failure(state, &err, "write document"),
    }
}

async fn point_read(state: &RunState, link: &str, partition_key: &str, worker_id: usize) {
    match state.store.read_document(link, partition_key).await {
        Ok(response) => {
            state.context.increment_operations();
            state.context.add_units(worker_id, response.charge);
            if state.config.record {
                println!("Order: {}", response.document);
            }
        }
        Err(err) => record_failure(state, &err, "read document"),
    }
}

async fn read_collection(state: &RunState, worker_id: usize) {
    match state.store.read_collection(&state.collection).await {
        Ok(response) => {
            state.context.increment_operations();
            state.context.add_units(worker_id, response.charge);
        }
        Err(err) => record_failure(state, &err, "read collection"),
    }
}

async fn query_collection(state: &RunState, query: &str, worker_id: usize) {
    // Charges accumulate across all pages and land as a single update.
    let mut charge = 0.0;
    let mut continuation: Option<String> = None;

    loop {
        let page = state
            .store
            .query_page(&state.collection, query, continuation.as_deref())
            .await;
        match page {
            Ok(page) => {
                charge += page.charge;
                if state.config.record {
                    for document in &page.documents {
                        println!("Order: {document}");
                    }
                }
                match page.continuation {
                    Some(token) => continuation = Some(token),
                    None => break,
                }
            }
            Err(err) => {
                record_failure(state, &err, "query collection");
                return;
            }
        }
    }

    state.context.increment_operations();
    state.context.add_units(worker_id, charge);
}

fn record_failure(state: &RunState, err: &StoreError, action: &str) {
    tracing::error!("failed to {action}: {err}");

    // A denied call still counts as accounted for: the store is saturated and
    // further calls would fail identically, so they are not worth retrying.
    if err.is_access_denied() {
        state.context.increment_operations();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use docbench_client::{CollectionRef, MemoryStore};

    use crate::config::ExperimentConfig;
    use crate::context::RunContext;
    use crate::records::Pools;

    use super::*;

    fn state(store: MemoryStore, operation: Operation) -> RunState {
        RunState {
            store: Arc::new(store),
            collection: CollectionRef::new("benchmarkdb", "orders"),
            config: ExperimentConfig {
                operations: 1,
                parallelism: Some(1),
                throughput: 1000,
                operation,
                verbose: false,
                record: false,
            },
            pools: Pools::allocate(10),
            context: RunContext::new(1),
        }
    }

    #[test]
    fn unknown_kinds_fail_to_parse() {
        assert_eq!("insert".parse::<OperationKind>().unwrap(), OperationKind::Insert);
        assert_eq!(
            "collection-read".parse::<OperationKind>().unwrap(),
            OperationKind::CollectionRead
        );
        assert!("drop-table".parse::<OperationKind>().is_err());
    }

    #[test]
    fn resolve_requires_per_kind_settings() {
        let err = Operation::resolve(OperationKind::Query, None, None, None).unwrap_err();
        assert!(err.to_string().contains("query string"));

        let err = Operation::resolve(OperationKind::PointRead, None, None, None).unwrap_err();
        assert!(err.to_string().contains("document link"));

        let operation = Operation::resolve(
            OperationKind::PointRead,
            None,
            Some("dbs/d/colls/c/docs/abc".into()),
            Some("NY".into()),
        )
        .unwrap();
        assert_eq!(operation.kind(), OperationKind::PointRead);
    }

    #[test]
    fn categories() {
        assert_eq!(Operation::Insert.category(), Category::Write);
        assert_eq!(Operation::CollectionRead.category(), Category::Read);
        assert_eq!(
            Operation::Query { query: "q".into() }.category(),
            Category::Query
        );
    }

    #[tokio::test]
    async fn successful_insert_counts_and_charges() {
        let state = state(MemoryStore::new(), Operation::Insert);
        state.config.operation.execute(&state, 0).await;

        assert_eq!(state.context.operations(), 1);
        assert_eq!(state.context.total_units(), MemoryStore::CREATE_CHARGE);
    }

    #[tokio::test]
    async fn denied_calls_count_without_units() {
        let state = state(MemoryStore::deny_all(), Operation::Insert);
        state.config.operation.execute(&state, 0).await;

        assert_eq!(state.context.operations(), 1);
        assert_eq!(state.context.total_units(), 0.0);
    }

    #[tokio::test]
    async fn other_failures_count_nothing() {
        let state = state(MemoryStore::failing(), Operation::CollectionRead);
        state.config.operation.execute(&state, 0).await;

        assert_eq!(state.context.operations(), 0);
        assert_eq!(state.context.total_units(), 0.0);
    }

    #[tokio::test]
    async fn query_reports_one_aggregate_update() {
        let store = MemoryStore::new();
        for i in 0..150 {
            store.seed(
                format!("doc-{i:03}"),
                serde_json::json!({ "id": format!("doc-{i:03}") }),
            );
        }

        let state = state(store, Operation::Query { query: "select * from orders".into() });
        state.config.operation.execute(&state, 0).await;

        assert_eq!(state.context.operations(), 1);
        let expected = 2.0 * MemoryStore::QUERY_PAGE_CHARGE;
        assert!((state.context.total_units() - expected).abs() < 1e-9);
    }
}
