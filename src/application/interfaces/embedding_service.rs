use async_trait::async_trait;

use crate::domain::{DomainError, EmbeddingConfig};

/// Generates vector embeddings from arbitrary text batches (chunk source,
/// summaries) and single queries (§6 Embedding service contract).
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    /// Encodes a batch of texts. Returns the embedding matrix (outer vec is
    /// N rows) and the total token count consumed.
    async fn encode(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, usize), DomainError>;

    /// Encodes a single query string for search. Returns the vector and the
    /// token count consumed.
    async fn encode_queries(&self, query: &str) -> Result<(Vec<f32>, usize), DomainError>;

    fn config(&self) -> &EmbeddingConfig;
}
