//! Wire types of the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub use medchat_rag::ChatAnswer as ChatResponse;

use crate::error::ApiError;

/// Body of `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatRequest {
    pub message: String,
}

impl ChatRequest {
    /// Parse a raw request body.
    ///
    /// Syntactically broken JSON is [`ApiError::InvalidJson`]. Well-formed
    /// JSON without a non-blank string `message` is [`ApiError::MissingMessage`].
    /// An empty body counts as an empty object.
    pub fn parse(body: &[u8]) -> Result<Self, ApiError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(ApiError::MissingMessage);
        }

        let value: Value = serde_json::from_slice(body).map_err(|_| ApiError::InvalidJson)?;
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(ApiError::MissingMessage)?;

        Ok(Self { message: message.to_string() })
    }
}

/// Body of every 4xx/5xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}
