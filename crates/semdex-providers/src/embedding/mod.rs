//! Embedding provider implementations

mod null;

pub use null::NullEmbeddingProvider;
