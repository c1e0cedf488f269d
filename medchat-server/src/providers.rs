//! Startup wiring: concrete provider clients built from [`ServiceConfig`].

use std::sync::Arc;

use medchat_rag::{
    AnswerGenerator, CohereGenerator, EmbeddingProvider, GeminiEmbeddingProvider,
    GeminiGenerator, IndexDescription, PineconeControlPlane, PineconeVectorStore, RagConfig,
    RagError, RagPipeline, RetryPolicy, RetryingEmbeddingProvider,
};
use tracing::info;

use crate::config::{GenerationBackend, ServiceConfig};

/// Build the pipeline the server answers with.
///
/// Resolves the Pinecone host through the control plane when none is
/// configured, and refuses to start when the index was built for a
/// different vector length than the embedding model produces.
pub async fn build_pipeline(config: &ServiceConfig) -> Result<RagPipeline, RagError> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout)
        .build()
        .map_err(|e| RagError::ConfigError(format!("failed to build HTTP client: {e}")))?;

    let rag_config = RagConfig::builder().top_k(config.top_k).dimensions(config.dimensions).build()?;

    let gemini_embedder = GeminiEmbeddingProvider::new(config.gemini_api_key.expose())?
        .with_http_client(http.clone())
        .with_model(&config.embedding_model)
        .with_dimensions(config.dimensions);
    let policy = RetryPolicy::new(config.retry_attempts, config.retry_delay)?;
    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(RetryingEmbeddingProvider::new(Arc::new(gemini_embedder), policy));

    let host = match &config.pinecone_index_host {
        Some(host) => host.clone(),
        None => {
            let description = PineconeControlPlane::new(config.pinecone_api_key.expose())?
                .with_http_client(http.clone())
                .describe_index(&config.pinecone_index)
                .await?;
            check_index_dimension(&description, config.dimensions)?;
            description.host
        }
    };
    let mut store = PineconeVectorStore::new(config.pinecone_api_key.expose(), &host)?
        .with_http_client(http.clone());
    if let Some(namespace) = &config.pinecone_namespace {
        store = store.with_namespace(namespace);
    }

    let generator: Arc<dyn AnswerGenerator> = match &config.generation {
        GenerationBackend::Gemini { model } => Arc::new(
            GeminiGenerator::new(config.gemini_api_key.expose())?
                .with_http_client(http.clone())
                .with_model(model),
        ),
        GenerationBackend::Cohere { api_key, model } => Arc::new(
            CohereGenerator::new(api_key.expose())?.with_http_client(http).with_model(model),
        ),
    };

    info!(
        index = %config.pinecone_index,
        host = %store.host(),
        generator = generator.name(),
        top_k = config.top_k,
        dimensions = config.dimensions,
        retry_attempts = policy.max_attempts(),
        "providers configured"
    );

    RagPipeline::builder()
        .config(rag_config)
        .embedding_provider(embedder)
        .vector_store(Arc::new(store))
        .generator(generator)
        .build()
}

/// Fail when the index reports a dimensionality other than `expected`.
pub fn check_index_dimension(index: &IndexDescription, expected: usize) -> Result<(), RagError> {
    match index.dimension {
        Some(actual) if actual != expected => Err(RagError::ConfigError(format!(
            "index '{}' stores {actual}-dimensional vectors but EMBEDDING_DIMENSIONS is {expected}",
            index.name
        ))),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(dimension: Option<usize>) -> IndexDescription {
        IndexDescription {
            name: "medical".into(),
            host: "medical-abc.svc.pinecone.io".into(),
            dimension,
        }
    }

    #[test]
    fn matching_or_unknown_dimension_is_accepted() {
        assert!(check_index_dimension(&index(Some(768)), 768).is_ok());
        assert!(check_index_dimension(&index(None), 768).is_ok());
    }

    #[test]
    fn mismatched_dimension_is_a_config_error() {
        let err = check_index_dimension(&index(Some(1536)), 768).unwrap_err();
        assert!(matches!(err, RagError::ConfigError(ref m) if m.contains("1536")));
    }
}
