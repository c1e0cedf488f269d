//! Pinecone vector store backend over the Pinecone REST data plane.
//!
//! Provides [`PineconeVectorStore`], which implements [`VectorStore`] by
//! calling the index's `/query` endpoint, and [`PineconeControlPlane`], which
//! resolves an index name to its data-plane host at startup.
//!
//! # Example
//!
//! ```rust,ignore
//! use medchat_rag::pinecone::{PineconeControlPlane, PineconeVectorStore};
//!
//! let index = PineconeControlPlane::new("pc-key")?.describe_index("medical").await?;
//! let store = PineconeVectorStore::new("pc-key", &index.host)?;
//! let matches = store.search(&query_embedding, 5).await?;
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::document::SearchMatch;
use crate::error::{RagError, Result};
use crate::http::{normalize_base_url, post_json, send_json};
use crate::vectorstore::VectorStore;

/// The Pinecone control plane used to look up index hosts.
pub const PINECONE_CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// API version pinned on every request.
pub const PINECONE_API_VERSION: &str = "2024-07";

const BACKEND: &str = "Pinecone";

fn require_key(api_key: String) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(RagError::ConfigError("Pinecone API key must not be empty".into()));
    }
    Ok(api_key)
}

/// Index hosts are reported without a scheme; local emulators use plain http.
fn host_url(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        normalize_base_url(host)
    } else {
        normalize_base_url(format!("https://{host}"))
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryRequest<'a> {
    vector: &'a [f32],
    top_k: usize,
    include_metadata: bool,
    include_values: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    namespace: Option<&'a str>,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<SearchMatch>,
}

/// The parts of an index description the service cares about.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct IndexDescription {
    /// The index name.
    pub name: String,
    /// The data-plane host, without scheme.
    pub host: String,
    /// The vector dimensionality the index was created with.
    pub dimension: Option<usize>,
}

// ── Control plane ──────────────────────────────────────────────────

/// Resolves index names through the Pinecone control plane.
pub struct PineconeControlPlane {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl PineconeControlPlane {
    /// Create a control-plane client for the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into())?,
            base_url: PINECONE_CONTROL_PLANE_URL.into(),
        })
    }

    /// Use a preconfigured HTTP client (timeouts, connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Point the client at a different control plane.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    /// Look up an index by name.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::VectorStoreError`] if the index does not exist or
    /// the control plane cannot be reached.
    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription> {
        let url = format!("{}/indexes/{name}", self.base_url);
        let description: IndexDescription = send_json(
            self.client
                .get(&url)
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", PINECONE_API_VERSION),
        )
        .await
        .map_err(|failure| {
            error!(backend = BACKEND, index = name, kind = %failure.kind, "describe index failed");
            failure.into_vector_store(BACKEND)
        })?;

        info!(
            backend = BACKEND,
            index = %description.name,
            host = %description.host,
            dimension = description.dimension,
            "resolved pinecone index"
        );
        Ok(description)
    }
}

// ── Data plane ─────────────────────────────────────────────────────

/// A [`VectorStore`] backed by a [Pinecone](https://www.pinecone.io/) index.
///
/// Queries always request metadata and never request stored values.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    host: String,
    namespace: Option<String>,
}

impl PineconeVectorStore {
    /// Create a store for the index served at `host`.
    pub fn new(api_key: impl Into<String>, host: &str) -> Result<Self> {
        if host.trim().is_empty() {
            return Err(RagError::ConfigError("Pinecone index host must not be empty".into()));
        }
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into())?,
            host: host_url(host.trim()),
            namespace: None,
        })
    }

    /// Use a preconfigured HTTP client (timeouts, connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Query a namespace other than the default one.
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// The resolved data-plane URL.
    pub fn host(&self) -> &str {
        &self.host
    }
}

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchMatch>> {
        debug!(backend = BACKEND, dimensions = embedding.len(), top_k, "querying index");

        let body = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: self.namespace.as_deref(),
        };

        let response: QueryResponse = post_json(
            self.client
                .post(format!("{}/query", self.host))
                .header("Api-Key", &self.api_key)
                .header("X-Pinecone-API-Version", PINECONE_API_VERSION),
            &body,
        )
        .await
        .map_err(|failure| {
            error!(backend = BACKEND, kind = %failure.kind, "query failed");
            failure.into_vector_store(BACKEND)
        })?;

        debug!(backend = BACKEND, match_count = response.matches.len(), "query completed");
        Ok(response.matches)
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Json, Router,
        extract::Path,
        http::{HeaderMap, StatusCode},
        routing::{get, post},
    };
    use serde_json::{Value, json};

    use super::*;
    use crate::error::ProviderErrorKind;
    use crate::test_support::spawn_provider;

    const DIM: usize = 4;

    async fn query_stub(headers: HeaderMap, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
        if headers.get("api-key").and_then(|v| v.to_str().ok()) != Some("pc-key") {
            return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"code": "UNAUTHENTICATED"}})));
        }
        let vector = body["vector"].as_array().cloned().unwrap_or_default();
        if vector.len() != DIM {
            let message = format!("Vector dimension {} does not match the dimension of the index {DIM}", vector.len());
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"code": 3, "message": message, "details": []})),
            );
        }
        if body["includeMetadata"] != json!(true) || body["topK"] != json!(2) {
            return (StatusCode::BAD_REQUEST, Json(json!({"message": "unexpected query shape"})));
        }
        (
            StatusCode::OK,
            Json(json!({
                "matches": [
                    {"id": "p10", "score": 0.92, "values": [], "metadata": {"text": "T1", "page": 10.0}},
                    {"id": "p12", "score": 0.88, "metadata": {"text": "T2", "page": 12.0, "source": "Manual ch. 2"}}
                ],
                "namespace": body["namespace"].as_str().unwrap_or(""),
            })),
        )
    }

    #[tokio::test]
    async fn search_returns_matches_with_metadata() {
        let app = Router::new().route("/query", post(query_stub));
        let (base, handle) = spawn_provider(app).await;
        let store = PineconeVectorStore::new("pc-key", &base).unwrap();

        let matches = store.search(&[0.1; DIM], 2).await.unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "p10");
        assert_eq!(matches[0].text(), Some("T1"));
        assert_eq!(matches[0].page().as_deref(), Some("10"));
        assert_eq!(matches[1].source(), Some("Manual ch. 2"));
        handle.abort();
    }

    #[tokio::test]
    async fn dimension_mismatch_surfaces_as_store_error() {
        let app = Router::new().route("/query", post(query_stub));
        let (base, handle) = spawn_provider(app).await;
        let store = PineconeVectorStore::new("pc-key", &base).unwrap();

        let err = store.search(&[0.1; 3], 2).await.unwrap_err();
        match err {
            RagError::VectorStoreError { kind, message, .. } => {
                assert_eq!(kind, ProviderErrorKind::InvalidRequest);
                assert!(message.contains("does not match the dimension"), "{message}");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        handle.abort();
    }

    #[tokio::test]
    async fn bad_credentials_are_unauthorized() {
        let app = Router::new().route("/query", post(query_stub));
        let (base, handle) = spawn_provider(app).await;
        let store = PineconeVectorStore::new("nope", &base).unwrap();

        let err = store.search(&[0.1; DIM], 2).await.unwrap_err();
        assert_eq!(err.kind(), Some(ProviderErrorKind::Unauthorized));
        handle.abort();
    }

    async fn describe_stub(Path(name): Path<String>) -> (StatusCode, Json<Value>) {
        if name != "medical" {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": {"code": "NOT_FOUND", "message": format!("Resource {name} not found")}})),
            );
        }
        (
            StatusCode::OK,
            Json(json!({
                "name": "medical",
                "dimension": 768,
                "metric": "cosine",
                "host": "medical-abc123.svc.aped-4627-b74a.pinecone.io",
                "status": {"ready": true, "state": "Ready"}
            })),
        )
    }

    #[tokio::test]
    async fn describe_index_resolves_host_and_dimension() {
        let app = Router::new().route("/indexes/{name}", get(describe_stub));
        let (base, handle) = spawn_provider(app).await;
        let control = PineconeControlPlane::new("pc-key").unwrap().with_base_url(base);

        let index = control.describe_index("medical").await.unwrap();
        assert_eq!(index.dimension, Some(768));
        assert_eq!(index.host, "medical-abc123.svc.aped-4627-b74a.pinecone.io");

        let err = control.describe_index("missing").await.unwrap_err();
        assert_eq!(err.kind(), Some(ProviderErrorKind::NotFound));
        handle.abort();
    }

    #[test]
    fn bare_hosts_get_https() {
        let store = PineconeVectorStore::new("pc-key", "medical-abc.svc.pinecone.io").unwrap();
        assert_eq!(store.host(), "https://medical-abc.svc.pinecone.io");

        let store = PineconeVectorStore::new("pc-key", "http://localhost:5080/").unwrap();
        assert_eq!(store.host(), "http://localhost:5080");
    }

    #[test]
    fn empty_host_is_rejected() {
        assert!(matches!(PineconeVectorStore::new("pc-key", " "), Err(RagError::ConfigError(_))));
    }
}
