//! Semdex domain layer
//!
//! Core entities of the indexing pipeline (chunks, files, embeddings), the
//! error taxonomy shared by every layer, content canonicalization, the
//! per-language chunking registry, and the ports concrete providers plug
//! into. This crate is pure: no I/O, no runtime.

pub mod content;
pub mod entities;
pub mod error;
pub mod ports;
pub mod registry;
pub mod value_objects;

pub use entities::{Chunk, ChunkBuilder, ChunkDiff, EmbedChunk, EmbeddingData, EmbeddingStatus, SourceFile};
pub use error::{Error, FailureKind, Result};
pub use value_objects::{ChunkType, Language};
