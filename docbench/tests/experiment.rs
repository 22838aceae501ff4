//! End-to-end experiment runs against the in-memory store.

use std::sync::Arc;

use docbench::config::ExperimentConfig;
use docbench::experiment;
use docbench::operation::Operation;
use docbench_client::{CollectionRef, MemoryStore};

fn collection() -> CollectionRef {
    CollectionRef::new("benchmarkdb", "orders")
}

fn config(operations: u64, parallelism: Option<usize>, operation: Operation) -> ExperimentConfig {
    ExperimentConfig {
        operations,
        parallelism,
        throughput: 1000,
        operation,
        verbose: false,
        record: false,
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn insert_run_completes_every_operation() {
    let store = MemoryStore::new();
    let summary = experiment::run(
        Arc::new(store.clone()),
        collection(),
        config(100, Some(4), Operation::Insert),
    )
    .await
    .unwrap();

    assert_eq!(summary.operations, 100);
    assert_eq!(store.len(), 100);
    assert!((summary.units - 100.0 * MemoryStore::CREATE_CHARGE).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread")]
async fn derived_worker_count_still_runs_every_operation() {
    let store = MemoryStore::new();
    // throughput 1000 derives 3 workers; shares are [3, 3, 4]
    let summary = experiment::run(
        Arc::new(store.clone()),
        collection(),
        config(10, None, Operation::Insert),
    )
    .await
    .unwrap();

    assert_eq!(summary.operations, 10);
    assert_eq!(store.len(), 10);
}

#[tokio::test(flavor = "multi_thread")]
async fn more_workers_than_operations_terminates() {
    let store = MemoryStore::new();
    let summary = experiment::run(
        Arc::new(store),
        collection(),
        config(3, Some(8), Operation::CollectionRead),
    )
    .await
    .unwrap();

    assert_eq!(summary.operations, 3);
    assert!((summary.units - 3.0 * MemoryStore::COLLECTION_CHARGE).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread")]
async fn point_read_run_reads_the_seeded_document() {
    let store = MemoryStore::new();
    store.seed("abc", serde_json::json!({ "id": "abc", "status": "NEW" }));

    let operation = Operation::PointRead {
        link: collection().document_link("abc"),
        partition_key: "NY".into(),
    };
    let summary = experiment::run(Arc::new(store), collection(), config(10, Some(2), operation))
        .await
        .unwrap();

    assert_eq!(summary.operations, 10);
    assert!((summary.units - 10.0 * MemoryStore::READ_CHARGE).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread")]
async fn query_run_pages_through_all_results() {
    let store = MemoryStore::new();
    for i in 0..250 {
        store.seed(
            format!("doc-{i:03}"),
            serde_json::json!({ "id": format!("doc-{i:03}") }),
        );
    }

    let operation = Operation::Query {
        query: "select * from orders".into(),
    };
    let summary = experiment::run(Arc::new(store), collection(), config(4, Some(2), operation))
        .await
        .unwrap();

    // Four queries, three pages each, one aggregate update per query.
    assert_eq!(summary.operations, 4);
    assert!((summary.units - 12.0 * MemoryStore::QUERY_PAGE_CHARGE).abs() < 1e-9);
}

#[tokio::test(flavor = "multi_thread")]
async fn denied_calls_count_as_completed_without_units() {
    let store = MemoryStore::deny_all();
    let summary = experiment::run(
        Arc::new(store.clone()),
        collection(),
        config(50, Some(4), Operation::Insert),
    )
    .await
    .unwrap();

    assert_eq!(summary.operations, 50);
    assert_eq!(summary.units, 0.0);
    assert!(store.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn other_failures_undercount_completed_operations() {
    let store = MemoryStore::failing();
    let summary = experiment::run(
        Arc::new(store),
        collection(),
        config(20, Some(2), Operation::CollectionRead),
    )
    .await
    .unwrap();

    assert_eq!(summary.operations, 0);
    assert_eq!(summary.units, 0.0);
}

#[tokio::test(flavor = "multi_thread")]
async fn zero_parallelism_is_rejected() {
    let store = MemoryStore::new();
    let err = experiment::run(
        Arc::new(store),
        collection(),
        config(10, Some(0), Operation::Insert),
    )
    .await
    .unwrap_err();

    assert!(err.to_string().contains("parallelism"));
}
