//! Configuration for the RAG pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Number of passages retrieved per question.
pub const DEFAULT_TOP_K: usize = 5;

/// Embedding dimensionality shared by the embedding model and the vector index.
pub const DEFAULT_DIMENSIONS: usize = 768;

/// Configuration parameters for the RAG pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RagConfig {
    /// Number of top results to request from vector search.
    pub top_k: usize,
    /// Dimensionality the vector index was built with. The embedding
    /// provider must produce vectors of exactly this length.
    pub dimensions: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self { top_k: DEFAULT_TOP_K, dimensions: DEFAULT_DIMENSIONS }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the number of top results to request from vector search.
    pub fn top_k(mut self, k: usize) -> Self {
        self.config.top_k = k;
        self
    }

    /// Set the embedding dimensionality expected by the vector index.
    pub fn dimensions(mut self, dimensions: usize) -> Self {
        self.config.dimensions = dimensions;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are usable.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `top_k == 0` or `dimensions == 0`.
    pub fn build(self) -> Result<RagConfig> {
        if self.config.top_k == 0 {
            return Err(RagError::ConfigError("top_k must be greater than zero".to_string()));
        }
        if self.config.dimensions == 0 {
            return Err(RagError::ConfigError("dimensions must be greater than zero".to_string()));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_deployed_index() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config.top_k, 5);
        assert_eq!(config.dimensions, 768);
    }

    #[test]
    fn rejects_zero_top_k() {
        let err = RagConfig::builder().top_k(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }

    #[test]
    fn rejects_zero_dimensions() {
        let err = RagConfig::builder().dimensions(0).build().unwrap_err();
        assert!(matches!(err, RagError::ConfigError(_)));
    }
}
