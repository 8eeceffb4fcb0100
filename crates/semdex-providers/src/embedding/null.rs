//! Null embedding provider for testing and development
//!
//! Produces deterministic, hash-based vectors with no external dependencies,
//! so the full pipeline runs offline. The same text always embeds to the same
//! vector.

use crate::constants::NULL_EMBEDDING_DIMENSION;
use async_trait::async_trait;
use semdex_domain::ports::EmbeddingProvider;
use semdex_domain::Result;

/// Deterministic offline embedding provider
#[derive(Debug, Default)]
pub struct NullEmbeddingProvider;

impl NullEmbeddingProvider {
    /// Create a new null embedding provider
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EmbeddingProvider for NullEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let embeddings = texts
            .iter()
            .map(|text| {
                let hash = text.chars().map(|c| c as u32).sum::<u32>();
                let base_value = (hash % 1000) as f32 / 1000.0;
                (0..NULL_EMBEDDING_DIMENSION)
                    .map(|position| {
                        let variation = (position as f32 * 0.01).sin();
                        (base_value + variation * 0.1).clamp(0.0, 1.0)
                    })
                    .collect()
            })
            .collect();
        Ok(embeddings)
    }

    fn provider_name(&self) -> &str {
        "null"
    }

    fn model_name(&self) -> &str {
        "null-test"
    }

    fn max_tokens_per_batch(&self) -> Option<usize> {
        Some(100_000)
    }

    fn max_documents_per_batch(&self) -> Option<usize> {
        Some(256)
    }

    fn recommended_concurrency(&self) -> Option<usize> {
        Some(4)
    }
}
