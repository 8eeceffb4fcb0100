//! In-memory database provider
//!
//! Models the store's two logical tables (files unique by path, chunks with
//! embedding rows keyed by chunk id, provider, and model) in process memory.
//! Nothing is persisted; the provider exists for development and the test
//! suite.
//!
//! A single `tokio::sync::RwLock` enforces the readers-writer discipline:
//! lookups take the shared lock, inserts and schema operations the exclusive
//! one. Every write call is atomic with respect to readers.

use async_trait::async_trait;
use chrono::Utc;
use semdex_domain::ports::DatabaseProvider;
use semdex_domain::{
    Chunk, EmbedChunk, EmbeddingData, EmbeddingStatus, Error, Result, SourceFile,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Embedding rows are keyed by (chunk id, provider, model)
type EmbeddingKey = (i64, String, String);

#[derive(Default)]
struct Tables {
    files_by_path: HashMap<String, SourceFile>,
    chunks: BTreeMap<i64, Chunk>,
    embeddings: HashMap<EmbeddingKey, EmbeddingData>,
    next_file_id: i64,
    next_chunk_id: i64,
    initialized: bool,
}

/// In-memory [`DatabaseProvider`]
#[derive(Default)]
pub struct InMemoryDatabaseProvider {
    tables: RwLock<Tables>,
    optimize_calls: AtomicUsize,
}

impl InMemoryDatabaseProvider {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// How many times `optimize_tables` ran
    pub fn optimize_calls(&self) -> usize {
        self.optimize_calls.load(Ordering::SeqCst)
    }

    /// Number of stored file rows
    pub async fn file_count(&self) -> usize {
        self.tables.read().await.files_by_path.len()
    }

    /// Number of stored chunk rows
    pub async fn chunk_count(&self) -> usize {
        self.tables.read().await.chunks.len()
    }

    /// Number of stored embedding rows
    pub async fn embedding_count(&self) -> usize {
        self.tables.read().await.embeddings.len()
    }

    /// Embedding rows with the given status
    pub async fn embeddings_with_status(&self, status: EmbeddingStatus) -> usize {
        self.tables
            .read()
            .await
            .embeddings
            .values()
            .filter(|row| row.status == status)
            .count()
    }
}

#[async_trait]
impl DatabaseProvider for InMemoryDatabaseProvider {
    async fn initialize(&self) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.initialized = true;
        Ok(())
    }

    async fn upsert_file(&self, file: &SourceFile) -> Result<i64> {
        file.validate()?;
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.files_by_path.get_mut(&file.path) {
            existing.mtime = file.mtime;
            existing.size_bytes = file.size_bytes;
            existing.language = file.language;
            existing.content_hash = file.content_hash.clone();
            existing.updated_at = Some(Utc::now());
            return Ok(existing.id.unwrap_or_default());
        }
        tables.next_file_id += 1;
        let id = tables.next_file_id;
        let mut stored = file.clone();
        stored.id = Some(id);
        stored.created_at = Some(Utc::now());
        tables.files_by_path.insert(stored.path.clone(), stored);
        Ok(id)
    }

    async fn get_file_by_path(&self, relative_path: &str) -> Result<Option<SourceFile>> {
        let tables = self.tables.read().await;
        Ok(tables.files_by_path.get(relative_path).cloned())
    }

    async fn get_chunks_by_file_path(&self, path: &str) -> Result<Vec<Chunk>> {
        let tables = self.tables.read().await;
        let Some(file_id) = tables
            .files_by_path
            .get(path)
            .and_then(|file| file.id)
        else {
            return Ok(Vec::new());
        };
        Ok(tables
            .chunks
            .values()
            .filter(|chunk| chunk.file_id == file_id)
            .cloned()
            .collect())
    }

    async fn get_chunks_by_ids(&self, ids: &[i64]) -> Result<Vec<Chunk>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.chunks.get(id).cloned())
            .collect())
    }

    async fn insert_chunks_batch(&self, chunks: &[Chunk]) -> Result<Vec<i64>> {
        let mut tables = self.tables.write().await;
        let mut ids = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            chunk.validate()?;
            tables.next_chunk_id += 1;
            let id = tables.next_chunk_id;
            let mut stored = chunk.clone();
            stored.id = Some(id);
            stored.created_at = Some(Utc::now());
            tables.chunks.insert(id, stored);
            ids.push(id);
        }
        Ok(ids)
    }

    async fn insert_embeddings_batch(
        &self,
        chunk_ids: &[i64],
        embeddings: &[EmbedChunk],
    ) -> Result<usize> {
        if chunk_ids.len() != embeddings.len() {
            return Err(Error::validation(format!(
                "{} chunk ids for {} embeddings",
                chunk_ids.len(),
                embeddings.len()
            )));
        }
        let mut tables = self.tables.write().await;
        for (chunk_id, embedded) in chunk_ids.iter().zip(embeddings) {
            if !tables.chunks.contains_key(chunk_id) {
                return Err(Error::not_found(format!("chunk {}", chunk_id)));
            }
            let row = EmbeddingData::from_embed_chunk(*chunk_id, embedded);
            let key = (*chunk_id, row.provider.clone(), row.model.clone());
            tables.embeddings.insert(key, row);
        }
        Ok(chunk_ids.len())
    }

    async fn upsert_embedding_rows(
        &self,
        rows: &[EmbeddingData],
        statuses: &HashMap<i64, EmbeddingStatus>,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        for row in rows {
            let key = (row.chunk_id, row.provider.clone(), row.model.clone());
            tables.embeddings.insert(key, row.clone());
        }
        for (chunk_id, status) in statuses {
            for (key, row) in tables.embeddings.iter_mut() {
                if key.0 == *chunk_id {
                    row.status = *status;
                }
            }
        }
        Ok(())
    }

    async fn filter_existing_embeddings(
        &self,
        chunk_ids: &[i64],
        provider: &str,
        model: &str,
    ) -> Result<Vec<i64>> {
        let tables = self.tables.read().await;
        Ok(chunk_ids
            .iter()
            .filter(|id| {
                tables
                    .embeddings
                    .get(&(**id, provider.to_string(), model.to_string()))
                    .is_some_and(|row| row.status == EmbeddingStatus::Success)
            })
            .copied()
            .collect())
    }

    async fn delete_embeddings_for_chunks(
        &self,
        chunk_ids: &[i64],
        provider: &str,
        model: &str,
    ) -> Result<()> {
        let mut tables = self.tables.write().await;
        for chunk_id in chunk_ids {
            tables
                .embeddings
                .remove(&(*chunk_id, provider.to_string(), model.to_string()));
        }
        Ok(())
    }

    async fn optimize_tables(&self) -> Result<()> {
        // No fragments to compact in memory; the call still counts for cadence tests
        self.optimize_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear_all_data(&self) -> Result<()> {
        let mut tables = self.tables.write().await;
        tables.files_by_path.clear();
        tables.chunks.clear();
        tables.embeddings.clear();
        tables.next_file_id = 0;
        tables.next_chunk_id = 0;
        tracing::info!("in-memory store cleared");
        Ok(())
    }
}
