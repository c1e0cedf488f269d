//! Cohere generation adapter using the Cohere chat API.
//!
//! This module is only available when the `cohere` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::context::AssembledContext;
use crate::error::{RagError, Result};
use crate::generation::{AnswerGenerator, SYSTEM_INSTRUCTION};
use crate::http::{RemoteFailure, normalize_base_url, post_json};

/// The default Cohere API root.
pub const COHERE_BASE_URL: &str = "https://api.cohere.ai";

/// The default chat model.
pub const DEFAULT_MODEL: &str = "command-r-plus";

const PROVIDER: &str = "Cohere";

/// An [`AnswerGenerator`] backed by the Cohere `/v1/chat` endpoint.
///
/// Passages are sent as Cohere `documents` rather than inlined into the
/// message, so the model grounds against them natively. The fixed system
/// instruction is sent as the `preamble`.
///
/// # Example
///
/// ```rust,ignore
/// use medchat_rag::cohere::CohereGenerator;
///
/// let generator = CohereGenerator::new("co-...")?;
/// let answer = generator.generate("What is hypertension?", &context).await?;
/// ```
pub struct CohereGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl CohereGenerator {
    /// Create a new generator with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError("Cohere API key must not be empty".into()));
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: COHERE_BASE_URL.into(),
            model: DEFAULT_MODEL.into(),
        })
    }

    /// Use a preconfigured HTTP client (timeouts, connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Point the generator at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

// ── Cohere API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    message: &'a str,
    preamble: &'a str,
    documents: Vec<ChatDocument<'a>>,
}

#[derive(Serialize)]
struct ChatDocument<'a> {
    id: &'a str,
    title: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    text: Option<String>,
}

// ── AnswerGenerator implementation ─────────────────────────────────

#[async_trait]
impl AnswerGenerator for CohereGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, question: &str, context: &AssembledContext) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            documents = context.len(),
            "generating answer"
        );

        let body = ChatRequest {
            model: &self.model,
            message: question,
            preamble: SYSTEM_INSTRUCTION,
            documents: context
                .passages()
                .iter()
                .map(|p| ChatDocument { id: &p.id, title: &p.citation, text: &p.text })
                .collect(),
        };

        let response: ChatResponse = post_json(
            self.client.post(format!("{}/v1/chat", self.base_url)).bearer_auth(&self.api_key),
            &body,
        )
        .await
        .map_err(|failure| {
            error!(provider = PROVIDER, kind = %failure.kind, "chat request failed");
            failure.into_generation(PROVIDER)
        })?;

        response.text.filter(|t| !t.is_empty()).ok_or_else(|| {
            RemoteFailure::malformed("response did not contain text").into_generation(PROVIDER)
        })
    }
}
