//! Gemini embedding and generation adapters over the Generative Language REST API.
//!
//! This module is only available when the `gemini` feature is enabled.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::DEFAULT_DIMENSIONS;
use crate::context::AssembledContext;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{AnswerGenerator, SYSTEM_INSTRUCTION, render_prompt};
use crate::http::{RemoteFailure, normalize_base_url, post_json};

/// The default Generative Language API base URL.
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-004";

/// The default generation model.
pub const DEFAULT_GENERATION_MODEL: &str = "gemini-2.5-flash";

const PROVIDER: &str = "Gemini";

fn model_path(model: &str) -> String {
    if model.starts_with("models/") { model.to_string() } else { format!("models/{model}") }
}

fn require_key(api_key: String) -> Result<String> {
    if api_key.trim().is_empty() {
        return Err(RagError::ConfigError("Gemini API key must not be empty".into()));
    }
    Ok(api_key)
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

impl<'a> Content<'a> {
    fn text(role: Option<&'static str>, text: &'a str) -> Self {
        Self { role, parts: vec![Part { text }] }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'static str,
    output_dimensionality: usize,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// ── Embedding ──────────────────────────────────────────────────────

/// An [`EmbeddingProvider`] backed by the Gemini `embedContent` endpoint.
///
/// Every request asks for exactly [`dimensions`](EmbeddingProvider::dimensions)
/// output values so the vectors line up with the index, and responses of any
/// other length are rejected.
///
/// # Example
///
/// ```rust,ignore
/// use medchat_rag::gemini::GeminiEmbeddingProvider;
///
/// let provider = GeminiEmbeddingProvider::new("your-api-key")?.with_dimensions(768);
/// let embedding = provider.embed("What is hypertension?").await?;
/// ```
pub struct GeminiEmbeddingProvider {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
    dimensions: usize,
}

impl GeminiEmbeddingProvider {
    /// Create a new provider using the default model and dimensionality.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into())?,
            base_url: GEMINI_BASE_URL.into(),
            model: DEFAULT_EMBEDDING_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
        })
    }

    /// Use a preconfigured HTTP client (timeouts, connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the embedding model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the requested output dimensionality.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }

    /// Point the provider at a different API root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = PROVIDER, model = %self.model, text_len = text.len(), "embedding query");

        let model = model_path(&self.model);
        let url = format!("{}/{model}:embedContent", self.base_url);
        let body = EmbedContentRequest {
            model,
            content: Content::text(None, text),
            task_type: "RETRIEVAL_QUERY",
            output_dimensionality: self.dimensions,
        };

        let response: EmbedContentResponse = post_json(
            self.client.post(&url).header("x-goog-api-key", &self.api_key),
            &body,
        )
        .await
        .map_err(|failure| {
            error!(provider = PROVIDER, kind = %failure.kind, "embedding request failed");
            failure.into_embedding(PROVIDER)
        })?;

        let values = response.embedding.map(|e| e.values).unwrap_or_default();
        if values.is_empty() {
            return Err(RemoteFailure::malformed("response did not contain embedding values")
                .into_embedding(PROVIDER));
        }
        if values.len() != self.dimensions {
            return Err(RemoteFailure::malformed(format!(
                "expected {} embedding values, got {}",
                self.dimensions,
                values.len()
            ))
            .into_embedding(PROVIDER));
        }

        Ok(values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

// ── Generation ─────────────────────────────────────────────────────

/// An [`AnswerGenerator`] backed by the Gemini `generateContent` endpoint.
///
/// The context is inlined into a single user turn; the fixed instruction goes
/// in `systemInstruction`.
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiGenerator {
    /// Create a new generator using the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: reqwest::Client::new(),
            api_key: require_key(api_key.into())?,
            base_url: GEMINI_BASE_URL.into(),
            model: DEFAULT_GENERATION_MODEL.into(),
        })
    }

    /// Use a preconfigured HTTP client (timeouts, connection pool).
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// Set the generation model name.
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

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, question: &str, context: &AssembledContext) -> Result<String> {
        debug!(
            provider = PROVIDER,
            model = %self.model,
            passages = context.len(),
            "generating answer"
        );

        let prompt = render_prompt(question, context);
        let url = format!("{}/{}:generateContent", self.base_url, model_path(&self.model));
        let body = GenerateContentRequest {
            system_instruction: Content::text(None, SYSTEM_INSTRUCTION),
            contents: vec![Content::text(Some("user"), &prompt)],
        };

        let response: GenerateContentResponse = post_json(
            self.client.post(&url).header("x-goog-api-key", &self.api_key),
            &body,
        )
        .await
        .map_err(|failure| {
            error!(provider = PROVIDER, kind = %failure.kind, "generation request failed");
            failure.into_generation(PROVIDER)
        })?;

        let Some(candidate) = response.candidates.into_iter().next() else {
            let reason = response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no candidates returned".to_string());
            return Err(RemoteFailure::malformed(format!("no answer generated: {reason}"))
                .into_generation(PROVIDER));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(RemoteFailure::malformed("candidate contained no text")
                .into_generation(PROVIDER));
        }

        Ok(text)
    }
}
