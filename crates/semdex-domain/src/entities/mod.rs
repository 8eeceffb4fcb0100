//! Core indexing entities

mod chunk;
mod diff;
mod embedding;
mod source_file;

pub use chunk::{Chunk, ChunkBuilder};
pub use diff::ChunkDiff;
pub use embedding::{EmbedChunk, EmbeddingData, EmbeddingStatus};
pub use source_file::SourceFile;
