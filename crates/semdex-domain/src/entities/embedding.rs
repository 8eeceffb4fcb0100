//! Embedding pairings and persisted rows

use crate::entities::Chunk;
use serde::{Deserialize, Serialize};

/// Outcome of embedding a chunk, as persisted
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// Embedding produced and stored
    Success,
    /// Embedding failed but may be retried in a later run
    Failed,
    /// Embedding failed permanently; do not retry
    PermanentFailure,
}

impl EmbeddingStatus {
    /// Canonical snake_case name
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingStatus::Success => "success",
            EmbeddingStatus::Failed => "failed",
            EmbeddingStatus::PermanentFailure => "permanent_failure",
        }
    }
}

/// A chunk paired with the embedding that was generated for it
///
/// Provider and model are captured per-embedding: the store distinguishes
/// embeddings by (chunk id, provider, model).
#[derive(Debug, Clone, PartialEq)]
pub struct EmbedChunk {
    /// The embedded chunk
    pub chunk: Chunk,
    /// Dense vector representation of the chunk's code
    pub embedding: Vec<f32>,
    /// Provider that produced the vector
    pub provider: String,
    /// Model that produced the vector
    pub model: String,
}

impl EmbedChunk {
    /// Pair a chunk with its embedding
    pub fn new<P: Into<String>, M: Into<String>>(
        chunk: Chunk,
        embedding: Vec<f32>,
        provider: P,
        model: M,
    ) -> Self {
        Self {
            chunk,
            embedding,
            provider: provider.into(),
            model: model.into(),
        }
    }

    /// Dimensionality of the embedding vector
    pub fn dimensions(&self) -> usize {
        self.embedding.len()
    }
}

/// The embedding row actually written to the store
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmbeddingData {
    /// Id of the chunk the vector belongs to
    pub chunk_id: i64,
    /// Provider that produced the vector
    pub provider: String,
    /// Model that produced the vector
    pub model: String,
    /// Dimensionality of the vector
    pub dimensions: usize,
    /// The vector values
    pub vector: Vec<f32>,
    /// Row status
    pub status: EmbeddingStatus,
}

impl EmbeddingData {
    /// Build a success row from an [`EmbedChunk`] and its assigned chunk id
    pub fn from_embed_chunk(chunk_id: i64, embedded: &EmbedChunk) -> Self {
        Self {
            chunk_id,
            provider: embedded.provider.clone(),
            model: embedded.model.clone(),
            dimensions: embedded.dimensions(),
            vector: embedded.embedding.clone(),
            status: EmbeddingStatus::Success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_objects::{ChunkType, Language};

    fn chunk() -> Chunk {
        Chunk::builder()
            .lines(1, 1)
            .code("x")
            .chunk_type(ChunkType::Unknown)
            .language(Language::Rust)
            .file_id(1)
            .build()
            .unwrap()
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&EmbeddingStatus::PermanentFailure).unwrap();
        assert_eq!(json, "\"permanent_failure\"");
    }

    #[test]
    fn row_built_from_embed_chunk_is_success() {
        let embedded = EmbedChunk::new(chunk(), vec![0.1, 0.2], "null", "null-test");
        let row = EmbeddingData::from_embed_chunk(42, &embedded);
        assert_eq!(row.chunk_id, 42);
        assert_eq!(row.dimensions, 2);
        assert_eq!(row.status, EmbeddingStatus::Success);
    }
}
