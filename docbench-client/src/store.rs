//! The abstract contract between the benchmarking harness and the remote
//! document store.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreResult;

/// A type-erased, shareable [`DocumentStore`] instance.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Reference to a collection within a database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    /// Name of the database.
    pub database: String,
    /// Name of the collection.
    pub collection: String,
}

impl CollectionRef {
    /// Creates a reference to the given database/collection pair.
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }

    /// The resource path of the collection itself.
    pub fn path(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.collection)
    }

    /// The resource path of the collection's document feed.
    pub fn docs_path(&self) -> String {
        format!("{}/docs", self.path())
    }

    /// The link addressing a single document in this collection.
    pub fn document_link(&self, id: &str) -> String {
        format!("{}/docs/{id}", self.path())
    }
}

impl fmt::Display for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// The outcome of a successful [`create_document`](DocumentStore::create_document) call.
#[derive(Debug, Clone, Copy)]
pub struct CreateResponse {
    /// Capacity units charged for the write.
    pub charge: f64,
}

/// The outcome of a successful [`read_document`](DocumentStore::read_document) call.
#[derive(Debug, Clone)]
pub struct ReadResponse {
    /// The document that was read.
    pub document: Value,
    /// Capacity units charged for the read.
    pub charge: f64,
}

/// The outcome of a successful [`read_collection`](DocumentStore::read_collection) call.
#[derive(Debug, Clone, Copy)]
pub struct CollectionResponse {
    /// Capacity units charged for the metadata read.
    pub charge: f64,
}

/// One page of a paged query result.
#[derive(Debug, Clone)]
pub struct QueryPage {
    /// The documents on this page.
    pub documents: Vec<Value>,
    /// Capacity units charged for this page.
    pub charge: f64,
    /// Token to request the next page, if there is one.
    pub continuation: Option<String>,
}

/// The calls the remote document store answers.
///
/// The harness only ever talks to the store through this trait; the HTTP
/// implementation lives in [`HttpStore`](crate::HttpStore), and tests use the
/// [`MemoryStore`](crate::MemoryStore).
#[async_trait::async_trait]
pub trait DocumentStore: fmt::Debug + Send + Sync + 'static {
    /// Creates a document in the given collection.
    async fn create_document(
        &self,
        collection: &CollectionRef,
        document: &Value,
    ) -> StoreResult<CreateResponse>;

    /// Reads a single document by its link, within the given partition.
    async fn read_document(&self, link: &str, partition_key: &str) -> StoreResult<ReadResponse>;

    /// Reads the metadata of the given collection.
    async fn read_collection(&self, collection: &CollectionRef) -> StoreResult<CollectionResponse>;

    /// Runs a query against the given collection and returns one page of
    /// results, starting at the given continuation token.
    async fn query_page(
        &self,
        collection: &CollectionRef,
        query: &str,
        continuation: Option<&str>,
    ) -> StoreResult<QueryPage>;
}
