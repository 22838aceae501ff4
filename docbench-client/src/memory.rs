//! In-memory document store for tests.
//!
//! This provides a [`DocumentStore`] backed by a `BTreeMap`, removing the need
//! for a running database in unit tests. The store is [`Clone`] so tests can
//! hold a handle for direct inspection while the harness owns a shared copy.
//! Charges are fixed constants so tests can assert exact capacity-unit totals.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use reqwest::StatusCode;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};
use crate::store::{
    CollectionRef, CollectionResponse, CreateResponse, DocumentStore, QueryPage, ReadResponse,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    /// Every call is rejected with a forbidden status, as a saturated store
    /// would reject it.
    DenyAll,
    /// Every call fails with a server error.
    FailAll,
}

/// An in-memory [`DocumentStore`].
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    documents: Arc<Mutex<BTreeMap<String, Value>>>,
    mode: Mode,
}

impl MemoryStore {
    /// Capacity units charged per created document.
    pub const CREATE_CHARGE: f64 = 5.5;
    /// Capacity units charged per point read.
    pub const READ_CHARGE: f64 = 1.0;
    /// Capacity units charged per collection metadata read.
    pub const COLLECTION_CHARGE: f64 = 2.0;
    /// Capacity units charged per query page.
    pub const QUERY_PAGE_CHARGE: f64 = 2.79;
    /// Maximum number of documents returned per query page.
    pub const QUERY_PAGE_SIZE: usize = 100;

    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that rejects every call with a forbidden status.
    pub fn deny_all() -> Self {
        Self {
            mode: Mode::DenyAll,
            ..Self::default()
        }
    }

    /// Creates a store that fails every call with a server error.
    pub fn failing() -> Self {
        Self {
            mode: Mode::FailAll,
            ..Self::default()
        }
    }

    /// Puts a document directly, bypassing the [`DocumentStore`] contract.
    pub fn seed(&self, id: impl Into<String>, document: Value) {
        self.documents.lock().unwrap().insert(id.into(), document);
    }

    /// The number of stored documents.
    pub fn len(&self) -> usize {
        self.documents.lock().unwrap().len()
    }

    /// Whether the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.lock().unwrap().is_empty()
    }

    fn check_mode(&self) -> StoreResult<()> {
        match self.mode {
            Mode::Normal => Ok(()),
            Mode::DenyAll => Err(StoreError::Rejected {
                status: StatusCode::FORBIDDEN,
                message: "request rate is large".into(),
            }),
            Mode::FailAll => Err(StoreError::Rejected {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                message: "injected failure".into(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn create_document(
        &self,
        _collection: &CollectionRef,
        document: &Value,
    ) -> StoreResult<CreateResponse> {
        self.check_mode()?;

        let mut documents = self.documents.lock().unwrap();
        let id = match document.get("id").and_then(Value::as_str) {
            Some(id) => id.to_owned(),
            None => format!("doc-{}", documents.len()),
        };
        documents.insert(id, document.clone());

        Ok(CreateResponse {
            charge: Self::CREATE_CHARGE,
        })
    }

    async fn read_document(&self, link: &str, _partition_key: &str) -> StoreResult<ReadResponse> {
        self.check_mode()?;

        let id = link.rsplit('/').next().unwrap_or(link);
        let document = self.documents.lock().unwrap().get(id).cloned();
        match document {
            Some(document) => Ok(ReadResponse {
                document,
                charge: Self::READ_CHARGE,
            }),
            None => Err(StoreError::Rejected {
                status: StatusCode::NOT_FOUND,
                message: format!("no document at {link}"),
            }),
        }
    }

    async fn read_collection(&self, _collection: &CollectionRef) -> StoreResult<CollectionResponse> {
        self.check_mode()?;
        Ok(CollectionResponse {
            charge: Self::COLLECTION_CHARGE,
        })
    }

    async fn query_page(
        &self,
        _collection: &CollectionRef,
        _query: &str,
        continuation: Option<&str>,
    ) -> StoreResult<QueryPage> {
        self.check_mode()?;

        let documents = self.documents.lock().unwrap();
        let offset: usize = continuation
            .map(str::parse)
            .transpose()
            .map_err(|_| StoreError::Rejected {
                status: StatusCode::BAD_REQUEST,
                message: "malformed continuation token".into(),
            })?
            .unwrap_or(0);

        let page: Vec<_> = documents
            .values()
            .skip(offset)
            .take(Self::QUERY_PAGE_SIZE)
            .cloned()
            .collect();
        let end = offset + page.len();
        let continuation = (end < documents.len()).then(|| end.to_string());

        Ok(QueryPage {
            documents: page,
            charge: Self::QUERY_PAGE_CHARGE,
            continuation,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn collection() -> CollectionRef {
        CollectionRef::new("benchmarkdb", "orders")
    }

    #[tokio::test]
    async fn create_then_point_read() {
        let store = MemoryStore::new();
        let document = json!({ "id": "abc", "status": "NEW" });

        let response = store.create_document(&collection(), &document).await.unwrap();
        assert_eq!(response.charge, MemoryStore::CREATE_CHARGE);

        let link = collection().document_link("abc");
        let read = store.read_document(&link, "NEW").await.unwrap();
        assert_eq!(read.document, document);
        assert_eq!(read.charge, MemoryStore::READ_CHARGE);
    }

    #[tokio::test]
    async fn missing_document_is_not_found() {
        let store = MemoryStore::new();
        let link = collection().document_link("nope");
        let err = store.read_document(&link, "NEW").await.unwrap_err();
        assert!(matches!(
            err,
            StoreError::Rejected {
                status: StatusCode::NOT_FOUND,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn query_pages_through_all_documents() {
        let store = MemoryStore::new();
        for i in 0..250 {
            store.seed(format!("doc-{i:03}"), json!({ "id": format!("doc-{i:03}") }));
        }

        let mut seen = 0;
        let mut pages = 0;
        let mut continuation: Option<String> = None;
        loop {
            let page = store
                .query_page(&collection(), "select * from orders", continuation.as_deref())
                .await
                .unwrap();
            seen += page.documents.len();
            pages += 1;
            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        assert_eq!(seen, 250);
        assert_eq!(pages, 3);
    }

    #[tokio::test]
    async fn deny_all_rejects_with_forbidden() {
        let store = MemoryStore::deny_all();
        let err = store
            .create_document(&collection(), &json!({ "id": "abc" }))
            .await
            .unwrap_err();
        assert!(err.is_access_denied());
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn failing_rejects_without_access_denied() {
        let store = MemoryStore::failing();
        let err = store.read_collection(&collection()).await.unwrap_err();
        assert!(!err.is_access_denied());
    }
}
