//! Vector store trait for nearest-neighbour passage lookup.

use async_trait::async_trait;

use crate::document::SearchMatch;
use crate::error::Result;

/// A read-only view of a vector index populated by the ingestion pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use medchat_rag::{PineconeVectorStore, VectorStore};
///
/// let store = PineconeVectorStore::new("pc-key", "medical-abc123.svc.pinecone.io")?;
/// let matches = store.search(&query_embedding, 5).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Search for the `top_k` most similar passages to the given embedding,
    /// with their metadata attached.
    ///
    /// Results follow the store's own ranking. Ties are ordered however the
    /// store orders them.
    async fn search(&self, embedding: &[f32], top_k: usize) -> Result<Vec<SearchMatch>>;
}
