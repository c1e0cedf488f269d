//! Error types for the `medchat-rag` crate.

use std::fmt;

use thiserror::Error;

/// The closed set of failure classes a remote provider call can produce.
///
/// Kinds are derived from the HTTP status code and, when the provider sends
/// one, its structured error status. They are never inferred from message
/// text, so retry decisions stay stable when providers reword their errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    /// The provider asked us to slow down (HTTP 429, `RESOURCE_EXHAUSTED`).
    RateLimited,
    /// The credentials were rejected.
    Unauthorized,
    /// The provider rejected the request shape or its values.
    InvalidRequest,
    /// The addressed model, index or route does not exist.
    NotFound,
    /// The provider failed on its side (5xx and unknown statuses).
    Server,
    /// The request never produced an HTTP response (DNS, TLS, timeout).
    Transport,
    /// The provider answered 2xx but the body was not what we expected.
    MalformedResponse,
}

impl ProviderErrorKind {
    /// Classify an HTTP status code.
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => Self::RateLimited,
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400 | 405..=428 | 430..=499 => Self::InvalidRequest,
            _ => Self::Server,
        }
    }

    /// Classify a provider's structured status string, as sent by Google
    /// (`error.status`) and Pinecone (`error.code`).
    ///
    /// Returns `None` for statuses that carry no more information than the
    /// HTTP status code itself.
    pub fn from_provider_status(status: &str) -> Option<Self> {
        match status {
            "RESOURCE_EXHAUSTED" | "QUOTA_EXCEEDED" | "TOO_MANY_REQUESTS" => Some(Self::RateLimited),
            "UNAUTHENTICATED" | "PERMISSION_DENIED" => Some(Self::Unauthorized),
            "INVALID_ARGUMENT" | "FAILED_PRECONDITION" | "OUT_OF_RANGE" => {
                Some(Self::InvalidRequest)
            }
            "NOT_FOUND" => Some(Self::NotFound),
            "INTERNAL" | "UNAVAILABLE" | "DEADLINE_EXCEEDED" | "UNKNOWN" => Some(Self::Server),
            _ => None,
        }
    }

    /// Whether a request that failed this way may succeed if sent again later.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::RateLimited)
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::RateLimited => "rate limited",
            Self::Unauthorized => "unauthorized",
            Self::InvalidRequest => "invalid request",
            Self::NotFound => "not found",
            Self::Server => "server error",
            Self::Transport => "transport error",
            Self::MalformedResponse => "malformed response",
        };
        f.write_str(label)
    }
}

/// Errors that can occur while answering a question.
#[derive(Debug, Error)]
pub enum RagError {
    /// The question was rejected before any remote call was made.
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}, {kind}): {message}")]
    EmbeddingError {
        /// The embedding provider that produced the error.
        provider: String,
        /// The classified failure.
        kind: ProviderErrorKind,
        /// A description of the failure, including the remote payload.
        message: String,
    },

    /// The embedding provider kept rate limiting us until the retry budget ran out.
    #[error("Rate limit exhausted ({provider}) after {attempts} attempts: {message}")]
    RateLimitExhausted {
        /// The embedding provider that produced the error.
        provider: String,
        /// How many attempts were made in total.
        attempts: u32,
        /// The message of the last rate-limit error.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}, {kind}): {message}")]
    VectorStoreError {
        /// The vector store backend that produced the error.
        backend: String,
        /// The classified failure.
        kind: ProviderErrorKind,
        /// A description of the failure, including the remote payload.
        message: String,
    },

    /// An error occurred in the text-generation provider.
    #[error("Generation error ({provider}, {kind}): {message}")]
    GenerationError {
        /// The generation provider that produced the error.
        provider: String,
        /// The classified failure.
        kind: ProviderErrorKind,
        /// A description of the failure, including the remote payload.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl RagError {
    /// The classified provider failure, if this error came from a remote call.
    pub fn kind(&self) -> Option<ProviderErrorKind> {
        match self {
            Self::EmbeddingError { kind, .. }
            | Self::VectorStoreError { kind, .. }
            | Self::GenerationError { kind, .. } => Some(*kind),
            Self::RateLimitExhausted { .. } => Some(ProviderErrorKind::RateLimited),
            Self::ValidationError(_) | Self::ConfigError(_) => None,
        }
    }
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(ProviderErrorKind::from_status(429), ProviderErrorKind::RateLimited);
        assert_eq!(ProviderErrorKind::from_status(401), ProviderErrorKind::Unauthorized);
        assert_eq!(ProviderErrorKind::from_status(403), ProviderErrorKind::Unauthorized);
        assert_eq!(ProviderErrorKind::from_status(404), ProviderErrorKind::NotFound);
        assert_eq!(ProviderErrorKind::from_status(400), ProviderErrorKind::InvalidRequest);
        assert_eq!(ProviderErrorKind::from_status(422), ProviderErrorKind::InvalidRequest);
        assert_eq!(ProviderErrorKind::from_status(500), ProviderErrorKind::Server);
        assert_eq!(ProviderErrorKind::from_status(503), ProviderErrorKind::Server);
    }

    #[test]
    fn provider_statuses_override_generic_codes() {
        assert_eq!(
            ProviderErrorKind::from_provider_status("RESOURCE_EXHAUSTED"),
            Some(ProviderErrorKind::RateLimited)
        );
        assert_eq!(
            ProviderErrorKind::from_provider_status("INVALID_ARGUMENT"),
            Some(ProviderErrorKind::InvalidRequest)
        );
        assert_eq!(ProviderErrorKind::from_provider_status("SOMETHING_NEW"), None);
    }

    #[test]
    fn exhausted_retries_report_rate_limit_kind() {
        let err = RagError::RateLimitExhausted {
            provider: "Gemini".into(),
            attempts: 3,
            message: "quota".into(),
        };
        assert_eq!(err.kind(), Some(ProviderErrorKind::RateLimited));
        assert!(err.to_string().contains("after 3 attempts"));
    }
}
