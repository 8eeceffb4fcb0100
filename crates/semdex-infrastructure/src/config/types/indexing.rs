//! Pipeline sizing configuration

use semdex_application::constants::{
    CHUNK_CHANNEL_CAPACITY, DEFAULT_DATABASE_BATCH_SIZE, DEFAULT_EMBEDDING_BATCH_SIZE,
    DEFAULT_EMBED_WORKERS, DEFAULT_PARSE_WORKERS, DEFAULT_STORE_WORKERS, EMBED_CHANNEL_CAPACITY,
    FILE_CHANNEL_CAPACITY, OPTIMIZE_EVERY_BATCHES,
};
use semdex_application::PipelineConfig;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Worker pool, channel, and batch sizing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct IndexingConfig {
    /// Parse worker count
    #[serde(default = "default_parse_workers")]
    #[validate(range(min = 1))]
    pub parse_workers: usize,
    /// Embed worker count
    #[serde(default = "default_embed_workers")]
    #[validate(range(min = 1))]
    pub embed_workers: usize,
    /// Store worker count
    #[serde(default = "default_store_workers")]
    #[validate(range(min = 1))]
    pub store_workers: usize,
    /// Files queue capacity
    #[serde(default = "default_file_capacity")]
    #[validate(range(min = 1))]
    pub file_channel_capacity: usize,
    /// Chunks queue capacity
    #[serde(default = "default_chunk_capacity")]
    #[validate(range(min = 1))]
    pub chunk_channel_capacity: usize,
    /// Embedded-chunks queue capacity
    #[serde(default = "default_embed_capacity")]
    #[validate(range(min = 1))]
    pub embed_channel_capacity: usize,
    /// Chunks buffered per embedding call
    #[serde(default = "default_embedding_batch")]
    #[validate(range(min = 1))]
    pub embedding_batch_size: usize,
    /// Items buffered per store write
    #[serde(default = "default_database_batch")]
    #[validate(range(min = 1))]
    pub database_batch_size: usize,
    /// Store batches between optimization passes
    #[serde(default = "default_optimize_every")]
    pub optimize_every_batches: usize,
}

fn default_parse_workers() -> usize {
    DEFAULT_PARSE_WORKERS
}
fn default_embed_workers() -> usize {
    DEFAULT_EMBED_WORKERS
}
fn default_store_workers() -> usize {
    DEFAULT_STORE_WORKERS
}
fn default_file_capacity() -> usize {
    FILE_CHANNEL_CAPACITY
}
fn default_chunk_capacity() -> usize {
    CHUNK_CHANNEL_CAPACITY
}
fn default_embed_capacity() -> usize {
    EMBED_CHANNEL_CAPACITY
}
fn default_embedding_batch() -> usize {
    DEFAULT_EMBEDDING_BATCH_SIZE
}
fn default_database_batch() -> usize {
    DEFAULT_DATABASE_BATCH_SIZE
}
fn default_optimize_every() -> usize {
    OPTIMIZE_EVERY_BATCHES
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            parse_workers: default_parse_workers(),
            embed_workers: default_embed_workers(),
            store_workers: default_store_workers(),
            file_channel_capacity: default_file_capacity(),
            chunk_channel_capacity: default_chunk_capacity(),
            embed_channel_capacity: default_embed_capacity(),
            embedding_batch_size: default_embedding_batch(),
            database_batch_size: default_database_batch(),
            optimize_every_batches: default_optimize_every(),
        }
    }
}

impl From<&IndexingConfig> for PipelineConfig {
    fn from(config: &IndexingConfig) -> Self {
        Self {
            parse_workers: config.parse_workers,
            embed_workers: config.embed_workers,
            store_workers: config.store_workers,
            file_channel_capacity: config.file_channel_capacity,
            chunk_channel_capacity: config.chunk_channel_capacity,
            embed_channel_capacity: config.embed_channel_capacity,
            embedding_batch_size: config.embedding_batch_size,
            database_batch_size: config.database_batch_size,
            optimize_every_batches: config.optimize_every_batches,
        }
    }
}
