//! RAG pipeline orchestrator.
//!
//! The [`RagPipeline`] answers one question by composing an
//! [`EmbeddingProvider`], a [`VectorStore`] and an [`AnswerGenerator`]:
//! embed → search → assemble → generate. Each call is independent; the
//! pipeline holds no per-request state and is shared behind an `Arc`.
//!
//! # Example
//!
//! ```rust,ignore
//! use medchat_rag::{RagConfig, RagPipeline};
//!
//! let pipeline = RagPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(store))
//!     .generator(Arc::new(generator))
//!     .build()?;
//!
//! let answer = pipeline.answer("What is hypertension?").await?;
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info};

use crate::config::RagConfig;
use crate::context::assemble;
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::AnswerGenerator;
use crate::vectorstore::VectorStore;

/// The steps a chat request moves through.
///
/// A request that fails leaves the flow at the stage recorded in its
/// [`PipelineError`]; no stage is retried once it has been left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatStage {
    Received,
    Validating,
    Embedding,
    Searching,
    Assembling,
    Generating,
    Responding,
}

impl fmt::Display for ChatStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Received => "received",
            Self::Validating => "validating",
            Self::Embedding => "embedding",
            Self::Searching => "searching",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
            Self::Responding => "responding",
        };
        f.write_str(name)
    }
}

/// A failed question, tagged with the stage it failed in.
#[derive(Debug, Error)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    /// Where the request stopped.
    pub stage: ChatStage,
    /// The underlying failure.
    #[source]
    pub source: RagError,
}

impl PipelineError {
    fn at(stage: ChatStage, source: RagError) -> Self {
        Self { stage, source }
    }
}

/// The answer returned to the client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatAnswer {
    /// The generated text, unmodified.
    pub answer: String,
    /// One citation per passage the answer was grounded on.
    pub citations: Vec<String>,
}

/// The RAG pipeline orchestrator. Construct one via [`RagPipeline::builder()`].
pub struct RagPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    generator: Arc<dyn AnswerGenerator>,
}

impl fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .field("generator", &self.generator.name())
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the answer generator.
    pub fn generator(&self) -> &Arc<dyn AnswerGenerator> {
        &self.generator
    }

    /// Answer a question: embed → search → assemble → generate.
    ///
    /// The question is validated first so that blank input never reaches a
    /// remote service. An empty search result is not an error: generation
    /// still runs and the model's fallback sentence comes back as a normal
    /// answer.
    ///
    /// # Errors
    ///
    /// Returns a [`PipelineError`] naming the stage that failed.
    pub async fn answer(&self, question: &str) -> std::result::Result<ChatAnswer, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::at(
                ChatStage::Validating,
                RagError::ValidationError("Message is required".to_string()),
            ));
        }

        // 1. Embed the question
        let embedding = self.embedding_provider.embed(question).await.map_err(|e| {
            error!(error = %e, "embedding failed");
            PipelineError::at(ChatStage::Embedding, e)
        })?;
        debug!(dimensions = embedding.len(), "question embedded");

        // 2. Search the vector store
        let matches =
            self.vector_store.search(&embedding, self.config.top_k).await.map_err(|e| {
                error!(error = %e, "vector store search failed");
                PipelineError::at(ChatStage::Searching, e)
            })?;

        // 3. Assemble context and citations
        let context = assemble(&matches);
        info!(
            match_count = matches.len(),
            passage_count = context.len(),
            "context assembled"
        );

        // 4. Generate the answer
        let answer = self.generator.generate(question, &context).await.map_err(|e| {
            error!(generator = self.generator.name(), error = %e, "generation failed");
            PipelineError::at(ChatStage::Generating, e)
        })?;

        info!(answer_len = answer.len(), citation_count = context.len(), "question answered");
        Ok(ChatAnswer { answer, citations: context.citations() })
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// All fields are required. Call [`build()`](RagPipelineBuilder::build) to
/// validate and produce the pipeline.
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the answer generator.
    pub fn generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RagPipeline`], validating that all required fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if any required field is missing, or
    /// if the embedding provider's dimensionality differs from the one the
    /// index expects.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::ConfigError("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::ConfigError("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::ConfigError("vector_store is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;

        if embedding_provider.dimensions() != config.dimensions {
            return Err(RagError::ConfigError(format!(
                "embedding provider produces {}-dimensional vectors but the index expects {}",
                embedding_provider.dimensions(),
                config.dimensions
            )));
        }

        Ok(RagPipeline { config, embedding_provider, vector_store, generator })
    }
}
