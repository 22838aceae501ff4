//! Command-line entry point of the docbench harness.
//!
//! Repeatedly runs an operation against a remote document database collection
//! to gauge sustained throughput and consumed capacity units. Settings come
//! from a YAML configuration file and `DOCBENCH__`-prefixed environment
//! variables; command-line options take precedence over both.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use argh::FromArgs;
use tracing_subscriber::EnvFilter;

use docbench::config::{Config, ExperimentConfig};
use docbench::experiment;
use docbench::operation::{Operation, OperationKind};
use docbench::provision;
use docbench_client::HttpStore;

/// Exercise a remote document database with a configurable operation workload.
#[derive(Debug, FromArgs)]
struct Args {
    /// path to the YAML configuration file
    #[argh(option)]
    config: Option<PathBuf>,

    /// the database to exercise
    #[argh(option, short = 'd')]
    database: Option<String>,

    /// the collection to exercise
    #[argh(option, short = 'c')]
    collection: Option<String>,

    /// throughput of the collection, in capacity units per second
    #[argh(option, short = 't')]
    throughput: Option<u32>,

    /// operation to run: insert, point-read, collection-read or query
    #[argh(option, short = 'o')]
    operation: Option<OperationKind>,

    /// total number of operations to run
    #[argh(option, short = 'n')]
    number: Option<u64>,

    /// number of concurrent workers (derived from throughput when omitted)
    #[argh(option, short = 'p')]
    parallelism: Option<usize>,

    /// the query string to run (query operation)
    #[argh(option, short = 'q')]
    query: Option<String>,

    /// the partition key value to access (point-read operation)
    #[argh(option, short = 'k')]
    key: Option<String>,

    /// the document link to access (point-read operation)
    #[argh(option, short = 'l')]
    link: Option<String>,

    /// log configuration and results (with reduced performance)
    #[argh(switch, short = 'v')]
    verbose: bool,

    /// print records as they are read and written
    #[argh(switch, short = 'r')]
    record: bool,
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(database) = &args.database {
        config.database = database.clone();
    }
    if let Some(collection) = &args.collection {
        config.collection = collection.clone();
    }
    if let Some(throughput) = args.throughput {
        config.throughput = throughput;
    }
    if let Some(operation) = args.operation {
        config.operation = operation;
    }
    if let Some(number) = args.number {
        config.number = number;
    }
    if let Some(parallelism) = args.parallelism {
        config.parallelism = Some(parallelism);
    }
    if let Some(query) = &args.query {
        config.query = Some(query.clone());
    }
    if let Some(key) = &args.key {
        config.partition_key = key.clone();
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = argh::from_env();

    let mut config = Config::load(args.config.as_deref()).context("failed to load configuration")?;
    apply_overrides(&mut config, &args);

    init_tracing();
    tracing::debug!(?config);

    let endpoint = config
        .endpoint
        .clone()
        .context("the store endpoint must be set, via DOCBENCH__ENDPOINT or the config file")?;
    let key = config
        .key
        .clone()
        .context("the access key must be set, via DOCBENCH__KEY or the config file")?;

    let store = Arc::new(HttpStore::builder(endpoint.clone(), key.as_str()).build()?);

    let provisioned = provision::ensure_collection(&store, &config, args.verbose).await?;

    if args.verbose {
        println!("Summary:");
        println!("{}", "-".repeat(69));
        println!("Endpoint: {endpoint}");
        println!(
            "Collection: {} at {} CU/s with partition key {}",
            provisioned.collection, provisioned.throughput, config.partition_key
        );
        println!("Operations: {} {}", config.number, config.operation);
        match config.parallelism {
            Some(parallelism) => println!("Degree of parallelism: {parallelism}"),
            None => println!("Degree of parallelism: derived from throughput"),
        }
        println!("{}", "-".repeat(69));
        println!();
    }

    let operation = Operation::resolve(
        config.operation,
        config.query.clone(),
        args.link.clone(),
        Some(config.partition_key.clone()),
    )?;

    let experiment = ExperimentConfig {
        operations: config.number,
        parallelism: config.parallelism,
        throughput: config.throughput,
        operation,
        verbose: args.verbose,
        record: args.record,
    };

    experiment::run(store.clone(), provisioned.collection, experiment).await?;

    if config.cleanup_on_finish {
        println!("Deleting database {}", config.database);
        store
            .delete_database(&config.database)
            .await
            .context("failed to delete the database")?;
    }

    println!("Document store experiment complete");
    Ok(())
}
