//! HTTP implementation of the [`DocumentStore`] contract, plus the
//! provisioning surface used before a run starts.

use std::fmt;
use std::time::Duration;

use reqwest::{RequestBuilder, Response, StatusCode, header};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::error::{StoreError, StoreResult};
use crate::store::{
    CollectionRef, CollectionResponse, CreateResponse, DocumentStore, QueryPage, ReadResponse,
};

/// Response header carrying the capacity-unit charge of a call.
pub const HEADER_REQUEST_CHARGE: &str = "x-docbench-request-charge";

/// Header carrying the continuation token of a paged query.
pub const HEADER_CONTINUATION: &str = "x-docbench-continuation";

/// Request header selecting the partition to serve a point read from.
pub const HEADER_PARTITION_KEY: &str = "x-docbench-partition-key";

/// Every remote call is bounded by this timeout unless overridden on the
/// builder. Run cancellation is not a concern of the client.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(2500);

/// A builder for [`HttpStore`] instances.
pub struct HttpStoreBuilder {
    endpoint: String,
    key: String,
    timeout: Duration,
}

impl fmt::Debug for HttpStoreBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStoreBuilder")
            .field("endpoint", &self.endpoint)
            .field("key", &format_args!("[redacted]"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpStoreBuilder {
    /// Overrides the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Creates the store instance.
    pub fn build(self) -> StoreResult<HttpStore> {
        let mut auth = header::HeaderValue::from_str(&self.key)
            .map_err(|_| StoreError::Configuration("access key is not a valid header".into()))?;
        auth.set_sensitive(true);

        let mut headers = header::HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        Ok(HttpStore {
            http,
            endpoint: self.endpoint.trim_end_matches('/').to_owned(),
        })
    }
}

/// A [`DocumentStore`] talking to a remote database over HTTP.
pub struct HttpStore {
    http: reqwest::Client,
    endpoint: String,
}

impl fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStore")
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl HttpStore {
    /// Creates a builder targeting the given endpoint, authenticating with the
    /// given access key.
    pub fn builder(endpoint: impl Into<String>, key: impl Into<String>) -> HttpStoreBuilder {
        HttpStoreBuilder {
            endpoint: endpoint.into(),
            key: key.into(),
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.endpoint)
    }

    async fn send(&self, request: RequestBuilder) -> StoreResult<Response> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected { status, message })
    }

    /// Sends a GET and maps a not-found status to `false`.
    async fn exists(&self, path: &str) -> StoreResult<bool> {
        let response = self.http.get(self.url(path)).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(true);
        }
        if status == StatusCode::NOT_FOUND {
            return Ok(false);
        }

        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Rejected { status, message })
    }

    fn charge(response: &Response) -> f64 {
        response
            .headers()
            .get(HEADER_REQUEST_CHARGE)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    fn continuation(response: &Response) -> Option<String> {
        let token = response.headers().get(HEADER_CONTINUATION)?;
        Some(token.to_str().ok()?.to_owned())
    }
}

/// Provisioning calls, invoked once before a benchmark run.
impl HttpStore {
    /// Whether the given database exists.
    pub async fn database_exists(&self, database: &str) -> StoreResult<bool> {
        self.exists(&format!("dbs/{database}")).await
    }

    /// Creates the given database.
    pub async fn create_database(&self, database: &str) -> StoreResult<()> {
        self.send(self.http.post(self.url("dbs")).json(&json!({ "id": database })))
            .await
            .map(drop)
    }

    /// Deletes the given database and everything in it.
    pub async fn delete_database(&self, database: &str) -> StoreResult<()> {
        self.send(self.http.delete(self.url(&format!("dbs/{database}"))))
            .await
            .map(drop)
    }

    /// Whether the given collection exists.
    pub async fn collection_exists(&self, collection: &CollectionRef) -> StoreResult<bool> {
        self.exists(&collection.path()).await
    }

    /// Creates a collection partitioned on `partition_key`, provisioned with
    /// `throughput` capacity units per second.
    pub async fn create_collection(
        &self,
        collection: &CollectionRef,
        partition_key: &str,
        throughput: u32,
    ) -> StoreResult<()> {
        let body = json!({
            "id": collection.collection,
            "partition_key": partition_key,
            "throughput": throughput,
        });
        let path = format!("dbs/{}/colls", collection.database);
        self.send(self.http.post(self.url(&path)).json(&body))
            .await
            .map(drop)
    }

    /// Reads back the throughput currently provisioned for the collection.
    pub async fn read_throughput(&self, collection: &CollectionRef) -> StoreResult<u32> {
        #[derive(Debug, Deserialize)]
        struct ThroughputBody {
            throughput: u32,
        }

        let path = format!("{}/throughput", collection.path());
        let response = self.send(self.http.get(self.url(&path))).await?;
        let body: ThroughputBody = response.json().await?;
        Ok(body.throughput)
    }
}

#[async_trait::async_trait]
impl DocumentStore for HttpStore {
    async fn create_document(
        &self,
        collection: &CollectionRef,
        document: &Value,
    ) -> StoreResult<CreateResponse> {
        let request = self.http.post(self.url(&collection.docs_path())).json(document);
        let response = self.send(request).await?;
        Ok(CreateResponse {
            charge: Self::charge(&response),
        })
    }

    async fn read_document(&self, link: &str, partition_key: &str) -> StoreResult<ReadResponse> {
        let request = self
            .http
            .get(self.url(link))
            .header(HEADER_PARTITION_KEY, partition_key);
        let response = self.send(request).await?;

        let charge = Self::charge(&response);
        let document = response.json().await?;
        Ok(ReadResponse { document, charge })
    }

    async fn read_collection(&self, collection: &CollectionRef) -> StoreResult<CollectionResponse> {
        let response = self.send(self.http.get(self.url(&collection.path()))).await?;
        Ok(CollectionResponse {
            charge: Self::charge(&response),
        })
    }

    async fn query_page(
        &self,
        collection: &CollectionRef,
        query: &str,
        continuation: Option<&str>,
    ) -> StoreResult<QueryPage> {
        #[derive(Debug, Deserialize)]
        struct QueryBody {
            documents: Vec<Value>,
        }

        let path = format!("{}/query", collection.path());
        let mut request = self.http.post(self.url(&path)).json(&json!({ "query": query }));
        if let Some(token) = continuation {
            request = request.header(HEADER_CONTINUATION, token);
        }

        let response = self.send(request).await?;
        let charge = Self::charge(&response);
        let continuation = Self::continuation(&response);

        let body: QueryBody = response.json().await?;
        Ok(QueryPage {
            documents: body.documents,
            charge,
            continuation,
        })
    }
}
