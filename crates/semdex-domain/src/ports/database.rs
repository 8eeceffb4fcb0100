//! Database provider port

use crate::entities::{Chunk, EmbedChunk, EmbeddingData, EmbeddingStatus, SourceFile};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// Vector store contract consumed by the pipeline
///
/// The interface is batch-only; there are no single-item operations. Every
/// method may fail with `Io`, `Transient`, or `Permanent` errors, and
/// implementations must be safe under the readers-writer discipline of the
/// pipeline: lookups take a shared lock internally, inserts and schema
/// operations an exclusive one.
#[async_trait]
pub trait DatabaseProvider: Send + Sync {
    /// Create or migrate the schema
    async fn initialize(&self) -> Result<()>;

    /// Insert or update a file row, unique by path; returns the file id
    async fn upsert_file(&self, file: &SourceFile) -> Result<i64>;

    /// Look up a file row by its repository-relative path
    async fn get_file_by_path(&self, relative_path: &str) -> Result<Option<SourceFile>>;

    /// All chunks belonging to a file path
    async fn get_chunks_by_file_path(&self, path: &str) -> Result<Vec<Chunk>>;

    /// Chunks by their store-assigned ids
    async fn get_chunks_by_ids(&self, ids: &[i64]) -> Result<Vec<Chunk>>;

    /// Insert chunks; the returned ids align with the input order and length
    async fn insert_chunks_batch(&self, chunks: &[Chunk]) -> Result<Vec<i64>>;

    /// Insert embeddings zipped with their chunk ids; both slices must have
    /// equal length. Returns the number of rows inserted.
    async fn insert_embeddings_batch(
        &self,
        chunk_ids: &[i64],
        embeddings: &[EmbedChunk],
    ) -> Result<usize>;

    /// Bulk upsert of embedding rows plus per-chunk status updates
    async fn upsert_embedding_rows(
        &self,
        rows: &[EmbeddingData],
        statuses: &HashMap<i64, EmbeddingStatus>,
    ) -> Result<()>;

    /// The subset of `chunk_ids` that already carry an embedding for this
    /// (provider, model) pair
    async fn filter_existing_embeddings(
        &self,
        chunk_ids: &[i64],
        provider: &str,
        model: &str,
    ) -> Result<Vec<i64>>;

    /// Drop embeddings for the given chunks and (provider, model) pair
    async fn delete_embeddings_for_chunks(
        &self,
        chunk_ids: &[i64],
        provider: &str,
        model: &str,
    ) -> Result<()>;

    /// Compact storage fragments; may be given an extended timeout
    async fn optimize_tables(&self) -> Result<()>;

    /// Remove every row from every table
    async fn clear_all_data(&self) -> Result<()>;
}

/// Shared database handle passed to the coordinator and store workers
pub type SharedDatabaseProvider = Arc<dyn DatabaseProvider>;
