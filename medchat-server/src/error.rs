//! Error types for the chat API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medchat_rag::{ChatStage, PipelineError, RagError};
use thiserror::Error;
use tracing::error;

use crate::protocol::ErrorBody;

pub const INVALID_JSON_MESSAGE: &str = "Invalid JSON format. Please check your request body.";
pub const MISSING_MESSAGE: &str = "Message is required";
pub const PAYLOAD_TOO_LARGE_MESSAGE: &str = "Request body is too large.";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{}", INVALID_JSON_MESSAGE)]
    InvalidJson,

    #[error("{}", MISSING_MESSAGE)]
    MissingMessage,

    #[error("{}", PAYLOAD_TOO_LARGE_MESSAGE)]
    PayloadTooLarge,

    /// A downstream call failed. `details` is the provider's message when
    /// the deployment allows exposing it.
    #[error("{error}")]
    Downstream { error: &'static str, details: Option<String> },
}

impl ApiError {
    /// Map a failed pipeline run onto the client-facing error.
    pub fn from_pipeline(failure: PipelineError, expose_details: bool) -> Self {
        let PipelineError { stage, source } = failure;
        if matches!(source, RagError::ValidationError(_)) {
            return Self::MissingMessage;
        }

        let message = match (&source, stage) {
            (RagError::RateLimitExhausted { .. }, _) => {
                "The embedding service is busy. Please try again in a moment."
            }
            (_, ChatStage::Embedding) => "Failed to process your question.",
            (_, ChatStage::Searching) => "Failed to search the medical records.",
            (_, ChatStage::Generating) => "Failed to generate an answer.",
            _ => "Internal server error",
        };

        error!(stage = %stage, error = %source, "chat request failed");
        Self::Downstream { error: message, details: expose_details.then(|| source.to_string()) }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidJson | Self::MissingMessage => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Downstream { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Downstream { error, details } => ErrorBody { error: error.to_string(), details },
            other => ErrorBody { error: other.to_string(), details: None },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use medchat_rag::ProviderErrorKind;

    use super::*;

    fn failed(stage: ChatStage, source: RagError) -> PipelineError {
        PipelineError { stage, source }
    }

    #[test]
    fn client_errors_are_4xx() {
        assert_eq!(ApiError::InvalidJson.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::MissingMessage.to_string(), "Message is required");
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[test]
    fn downstream_failures_carry_details_when_allowed() {
        let source = RagError::VectorStoreError {
            backend: "Pinecone".into(),
            kind: ProviderErrorKind::InvalidRequest,
            message: "API returned 400 Bad Request: dimension mismatch".into(),
        };
        let err = ApiError::from_pipeline(failed(ChatStage::Searching, source), true);
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        match err {
            ApiError::Downstream { error, details } => {
                assert_eq!(error, "Failed to search the medical records.");
                assert!(details.unwrap().contains("dimension mismatch"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn details_are_withheld_when_disabled() {
        let source = RagError::GenerationError {
            provider: "Gemini".into(),
            kind: ProviderErrorKind::Unauthorized,
            message: "API key not valid".into(),
        };
        let err = ApiError::from_pipeline(failed(ChatStage::Generating, source), false);
        assert!(matches!(err, ApiError::Downstream { details: None, .. }));
    }

    #[test]
    fn exhausted_rate_limit_has_its_own_message() {
        let source = RagError::RateLimitExhausted {
            provider: "Gemini".into(),
            attempts: 3,
            message: "quota".into(),
        };
        let err = ApiError::from_pipeline(failed(ChatStage::Embedding, source), true);
        assert!(err.to_string().contains("busy"));
    }

    #[test]
    fn validation_failures_stay_client_errors() {
        let source = RagError::ValidationError("Message is required".into());
        let err = ApiError::from_pipeline(failed(ChatStage::Validating, source), true);
        assert!(matches!(err, ApiError::MissingMessage));
    }
}
