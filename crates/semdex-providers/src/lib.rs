//! Semdex provider implementations
//!
//! Development and testing backends for the domain ports: a deterministic
//! offline embedding provider and an in-memory database. Network-backed
//! providers plug into the same ports from outside this workspace.

pub mod constants;
pub mod database;
pub mod embedding;

pub use database::InMemoryDatabaseProvider;
pub use embedding::NullEmbeddingProvider;
