//! Retrieval-augmented question answering over a medical reference corpus.
//!
//! This crate provides:
//! - Provider traits for embedding, vector search and answer generation
//! - Gemini, Pinecone and Cohere adapters (feature-gated)
//! - Context assembly with per-passage citations
//! - Bounded retry for rate-limited embedding calls
//! - A [`RagPipeline`] that wires the stages together

pub mod config;
pub mod context;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod pipeline;
pub mod retry;
pub mod vectorstore;

#[cfg(feature = "cohere")]
pub mod cohere;
#[cfg(feature = "gemini")]
pub mod gemini;
#[cfg(feature = "pinecone")]
pub mod pinecone;

#[cfg(any(feature = "gemini", feature = "pinecone", feature = "cohere"))]
mod http;
#[cfg(test)]
mod test_support;

pub use config::{RagConfig, RagConfigBuilder};
pub use context::{AssembledContext, ContextPassage, assemble, format_citation};
pub use document::SearchMatch;
pub use embedding::EmbeddingProvider;
pub use error::{ProviderErrorKind, RagError, Result};
pub use generation::{AnswerGenerator, FALLBACK_ANSWER, SYSTEM_INSTRUCTION};
pub use pipeline::{ChatAnswer, ChatStage, PipelineError, RagPipeline, RagPipelineBuilder};
pub use retry::{RetryPolicy, RetryingEmbeddingProvider};
pub use vectorstore::VectorStore;

#[cfg(feature = "cohere")]
pub use cohere::CohereGenerator;
#[cfg(feature = "gemini")]
pub use gemini::{GeminiEmbeddingProvider, GeminiGenerator};
#[cfg(feature = "pinecone")]
pub use pinecone::{IndexDescription, PineconeControlPlane, PineconeVectorStore};
