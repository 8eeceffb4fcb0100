//! Embedding provider port

use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Contract for services that turn code into dense vectors
///
/// `provider_name` and `model_name` are stable, case-sensitive identifiers:
/// together with the chunk id they form the embedding key in the store.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a batch of texts
    ///
    /// The result aligns with the input: `result[i]` is the embedding of
    /// `texts[i]`, and every inner vector is non-empty.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Stable provider identifier
    fn provider_name(&self) -> &str;

    /// Stable model identifier
    fn model_name(&self) -> &str;

    /// Advisory token budget per batch
    fn max_tokens_per_batch(&self) -> Option<usize> {
        None
    }

    /// Advisory document cap per batch
    fn max_documents_per_batch(&self) -> Option<usize> {
        None
    }

    /// Advisory concurrency cap for embed workers
    fn recommended_concurrency(&self) -> Option<usize> {
        None
    }
}

/// Shared embedding provider handle passed to embed workers
pub type SharedEmbeddingProvider = Arc<dyn EmbeddingProvider>;
