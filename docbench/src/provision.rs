//! Get-or-create provisioning of the target database and collection.
//!
//! This runs exactly once before the experiment engine starts and is the only
//! place that talks to the store's provisioning surface.

use anyhow::{Context, Result};
use docbench_client::{CollectionRef, HttpStore};

use crate::config::Config;

/// The provisioned target of a run.
#[derive(Debug, Clone)]
pub struct ProvisionedCollection {
    /// Reference to the collection all operations address.
    pub collection: CollectionRef,
    /// Throughput currently provisioned, in capacity units per second.
    pub throughput: u32,
}

/// Ensures the configured database and collection exist and returns a stable
/// reference plus the throughput the collection is actually provisioned with.
///
/// With `cleanup_on_start` set, an existing database is deleted and recreated
/// from scratch first.
pub async fn ensure_collection(
    store: &HttpStore,
    config: &Config,
    verbose: bool,
) -> Result<ProvisionedCollection> {
    let database = &config.database;
    let exists = store
        .database_exists(database)
        .await
        .context("failed to check for the database")?;

    if config.cleanup_on_start && exists {
        println!("Deleting database {database}");
        store
            .delete_database(database)
            .await
            .context("failed to delete the database")?;
    }

    if config.cleanup_on_start || !exists {
        println!("Creating database {database}");
        store
            .create_database(database)
            .await
            .context("failed to create the database")?;
    }

    let collection = CollectionRef::new(database.clone(), config.collection.clone());
    let exists = store
        .collection_exists(&collection)
        .await
        .context("failed to check for the collection")?;

    if !exists {
        println!(
            "Creating collection {collection} with {} CU/s",
            config.throughput
        );
        if verbose {
            // Rough price tag, so nobody leaves an oversized collection behind.
            let per_month = 0.06 * config.throughput as f64;
            let per_hour = per_month / (24.0 * 30.0);
            println!(
                "The collection will cost an estimated ${per_hour:.2} per hour (${per_month:.2} per month)"
            );
        }
        store
            .create_collection(&collection, &config.partition_key, config.throughput)
            .await
            .context("failed to create the collection")?;
    }

    let throughput = store
        .read_throughput(&collection)
        .await
        .context("failed to read the provisioned throughput")?;

    Ok(ProvisionedCollection {
        collection,
        throughput,
    })
}
