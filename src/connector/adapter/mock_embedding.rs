use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

/// Deterministic, hash-seeded embedding generator. Useful as the default
/// provider when no real embedding endpoint is configured: the same text
/// always yields the same vector, which keeps batch vectorization and
/// search idempotent in tests and local runs.
pub struct MockEmbedding {
    config: EmbeddingConfig,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), 384, 512),
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), dimensions, 512),
        }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut vector: Vec<f32> = (0..self.config.dimensions())
            .map(|_| rng.gen_range(-1.0..1.0))
            .collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }

    fn truncate<'a>(&self, text: &'a str) -> &'a str {
        let limit = self.config.max_sequence_length().saturating_sub(10).max(1);
        if text.len() <= limit {
            text
        } else {
            &text[..limit]
        }
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn encode(&self, texts: &[String]) -> Result<(Vec<Vec<f32>>, usize), DomainError> {
        let mut vectors = Vec::with_capacity(texts.len());
        let mut token_count = 0usize;

        for text in texts {
            let truncated = self.truncate(text);
            token_count += truncated.split_whitespace().count();
            vectors.push(self.generate_embedding(truncated));
        }

        debug!("Generated {} mock embeddings", vectors.len());
        Ok((vectors, token_count))
    }

    async fn encode_queries(&self, query: &str) -> Result<(Vec<f32>, usize), DomainError> {
        let truncated = self.truncate(query);
        let token_count = truncated.split_whitespace().count();
        Ok((self.generate_embedding(truncated), token_count))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedding_consistency() {
        let service = MockEmbedding::new();

        let (a, _) = service.encode_queries("hello world").await.unwrap();
        let (b, _) = service.encode_queries("hello world").await.unwrap();

        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_mock_embedding_dimensions() {
        let service = MockEmbedding::with_dimensions(128);

        let (vector, _) = service.encode_queries("test").await.unwrap();

        assert_eq!(vector.len(), 128);
    }

    #[tokio::test]
    async fn test_mock_embedding_normalized() {
        let service = MockEmbedding::new();

        let (vector, _) = service.encode_queries("test").await.unwrap();
        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

        assert!((magnitude - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_encode_batch_returns_one_vector_per_text() {
        let service = MockEmbedding::new();
        let texts = vec!["a".to_string(), "b".to_string(), "c".to_string()];

        let (vectors, _) = service.encode(&texts).await.unwrap();

        assert_eq!(vectors.len(), 3);
    }
}
