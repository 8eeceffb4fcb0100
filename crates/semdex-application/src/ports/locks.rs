//! Per-file lock port
//!
//! Single-file indexing serializes on a lock keyed by the file's canonical
//! path. The registry implementation lives in infrastructure.

use async_trait::async_trait;
use semdex_domain::Result;
use std::sync::Arc;

/// Token returned when a lock is acquired
#[derive(Debug, Clone)]
pub struct LockGuard {
    /// Lock key (canonical path)
    pub key: String,
    /// Unique token for this acquisition
    pub token: String,
}

/// Exclusive lock provider keyed by canonical path
#[async_trait]
pub trait FileLockProvider: Send + Sync {
    /// Acquire the lock for a key, waiting if another task holds it
    async fn acquire_lock(&self, key: &str) -> Result<LockGuard>;

    /// Release a previously acquired lock
    async fn release_lock(&self, guard: LockGuard) -> Result<()>;
}

/// Shared lock provider handle
pub type SharedFileLockProvider = Arc<dyn FileLockProvider>;
