//! Client library for the document store exercised by the `docbench` harness.
//!
//! The harness only depends on the [`DocumentStore`] trait, which exposes the
//! four calls a benchmark run performs: creating a document, reading a single
//! document, reading collection metadata, and running a paged query. Every
//! call reports the capacity units the store charged for it.
//!
//! [`HttpStore`] implements the trait over HTTP and additionally carries the
//! provisioning surface (get-or-create of databases and collections) that runs
//! once before a benchmark starts. [`MemoryStore`] implements the trait in
//! memory with deterministic charges and is what the harness tests run
//! against.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod error;
mod http;
mod memory;
mod store;

pub use crate::error::{StoreError, StoreResult};
pub use crate::http::{
    HEADER_CONTINUATION, HEADER_PARTITION_KEY, HEADER_REQUEST_CHARGE, HttpStore, HttpStoreBuilder,
};
pub use crate::memory::MemoryStore;
pub use crate::store::{
    CollectionRef, CollectionResponse, CreateResponse, DocumentStore, QueryPage, ReadResponse,
    SharedStore,
};
