//! Shared plumbing for the HTTP provider adapters.
//!
//! Every adapter sends JSON, checks the status, and turns failures into a
//! [`RemoteFailure`] whose kind comes from the status code and the
//! provider's structured error payload.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::error::{ProviderErrorKind, RagError};

/// A failed remote call, before it is attributed to a pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RemoteFailure {
    pub kind: ProviderErrorKind,
    pub message: String,
}

impl RemoteFailure {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Self { kind: ProviderErrorKind::MalformedResponse, message: message.into() }
    }

    fn transport(e: &reqwest::Error) -> Self {
        Self { kind: ProviderErrorKind::Transport, message: format!("request failed: {e}") }
    }

    pub(crate) fn into_embedding(self, provider: &str) -> RagError {
        RagError::EmbeddingError { provider: provider.into(), kind: self.kind, message: self.message }
    }

    pub(crate) fn into_vector_store(self, backend: &str) -> RagError {
        RagError::VectorStoreError {
            backend: backend.into(),
            kind: self.kind,
            message: self.message,
        }
    }

    pub(crate) fn into_generation(self, provider: &str) -> RagError {
        RagError::GenerationError { provider: provider.into(), kind: self.kind, message: self.message }
    }
}

/// Classify a non-2xx response.
///
/// A structured provider status (`error.status` for Google, `error.code`
/// for Pinecone) wins over the HTTP status when it is recognised.
pub(crate) fn classify(status: u16, body: &str) -> ProviderErrorKind {
    let structured = serde_json::from_str::<Value>(body).ok().and_then(|payload| {
        let error = payload.get("error")?;
        ["status", "code"]
            .iter()
            .filter_map(|field| error.get(*field).and_then(Value::as_str))
            .find_map(ProviderErrorKind::from_provider_status)
    });
    structured.unwrap_or_else(|| ProviderErrorKind::from_status(status))
}

/// Send a request and decode a JSON body, classifying every failure.
///
/// Error payloads are kept verbatim in the failure message.
pub(crate) async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, RemoteFailure> {
    let response = request.send().await.map_err(|e| RemoteFailure::transport(&e))?;
    let status = response.status();
    let body = response.text().await.map_err(|e| RemoteFailure::transport(&e))?;
    debug!(status = status.as_u16(), body_len = body.len(), "provider response received");

    if !status.is_success() {
        return Err(RemoteFailure {
            kind: classify(status.as_u16(), &body),
            message: format!("API returned {status}: {body}"),
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        RemoteFailure::malformed(format!("failed to parse response: {e}; body: {body}"))
    })
}

/// Convenience for POSTing a JSON body.
pub(crate) async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    body: &B,
) -> Result<T, RemoteFailure> {
    send_json(request.json(body)).await
}

/// Trim a trailing slash so `format!("{base}/path")` never doubles it.
pub(crate) fn normalize_base_url(url: impl Into<String>) -> String {
    let url = url.into();
    url.trim_end_matches('/').to_string()
}
