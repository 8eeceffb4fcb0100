//! Token-aware batch packing
//!
//! Groups chunks into batches that respect a provider's advisory limits:
//! 80 % of the token budget, the document cap, and a global chunk cap. A
//! single chunk whose estimate alone exceeds the safe limit still occupies a
//! batch by itself; bounding individual chunks is the split engine's job,
//! and the batcher never drops input.

use crate::constants::{FIXED_BATCH_SIZE, MAX_CHUNKS_PER_BATCH, SAFE_TOKEN_FRACTION};
use semdex_domain::content::estimate_tokens;
use semdex_domain::ports::EmbeddingProvider;
use semdex_domain::Chunk;

/// Advisory limits published by an embedding provider
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchLimits {
    /// Token budget per batch
    pub max_tokens_per_batch: Option<usize>,
    /// Document cap per batch
    pub max_documents_per_batch: Option<usize>,
}

impl BatchLimits {
    /// Read the limits a provider publishes
    pub fn from_provider(provider: &dyn EmbeddingProvider) -> Self {
        Self {
            max_tokens_per_batch: provider.max_tokens_per_batch(),
            max_documents_per_batch: provider.max_documents_per_batch(),
        }
    }

    /// Whether the provider published anything to pack against
    pub fn is_empty(&self) -> bool {
        self.max_tokens_per_batch.is_none() && self.max_documents_per_batch.is_none()
    }
}

/// Greedy batch packer
#[derive(Debug, Clone, Copy)]
pub struct TokenAwareBatcher {
    limits: BatchLimits,
}

impl TokenAwareBatcher {
    /// Create a batcher for the given provider limits
    ///
    /// Pass `None` when no provider is configured; packing then falls back to
    /// a fixed batch size.
    pub fn new(limits: Option<BatchLimits>) -> Self {
        Self {
            limits: limits.unwrap_or_default(),
        }
    }

    /// Pack chunks into provider-compliant batches, preserving order
    pub fn pack(&self, chunks: Vec<Chunk>) -> Vec<Vec<Chunk>> {
        if chunks.is_empty() {
            return Vec::new();
        }
        if self.limits.is_empty() {
            return chunks
                .chunks(FIXED_BATCH_SIZE)
                .map(<[Chunk]>::to_vec)
                .collect();
        }

        let safe_token_limit = self
            .limits
            .max_tokens_per_batch
            .map(|max| (max as f64 * SAFE_TOKEN_FRACTION) as usize);
        let document_cap = self
            .limits
            .max_documents_per_batch
            .unwrap_or(MAX_CHUNKS_PER_BATCH)
            .min(MAX_CHUNKS_PER_BATCH)
            .max(1);

        let mut batches = Vec::new();
        let mut current: Vec<Chunk> = Vec::new();
        let mut current_tokens = 0usize;

        for chunk in chunks {
            let chunk_tokens = estimate_tokens(&chunk.code);
            let over_tokens = safe_token_limit
                .is_some_and(|limit| current_tokens + chunk_tokens > limit);
            let over_documents = current.len() >= document_cap;

            if !current.is_empty() && (over_tokens || over_documents) {
                batches.push(std::mem::take(&mut current));
                current_tokens = 0;
            }
            current_tokens += chunk_tokens;
            current.push(chunk);
        }
        if !current.is_empty() {
            batches.push(current);
        }
        batches
    }
}
