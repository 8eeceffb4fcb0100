//! Per-file lock registry
//!
//! A concurrent map from canonical path to a single-permit semaphore. Lock
//! objects are cheap and entries outlive individual acquisitions; guards are
//! token-based so acquisition and release can happen on different tasks.

use async_trait::async_trait;
use dashmap::DashMap;
use semdex_application::ports::{FileLockProvider, LockGuard};
use semdex_domain::{Error, Result};
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// In-process file lock registry keyed by canonical path
#[derive(Default)]
pub struct FileLockRegistry {
    locks: DashMap<String, Arc<Semaphore>>,
    held: DashMap<String, OwnedSemaphorePermit>,
}

impl FileLockRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of distinct paths ever locked
    pub fn tracked_paths(&self) -> usize {
        self.locks.len()
    }
}

#[async_trait]
impl FileLockProvider for FileLockRegistry {
    async fn acquire_lock(&self, key: &str) -> Result<LockGuard> {
        let semaphore = self
            .locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(1)))
            .clone();
        let permit = semaphore
            .acquire_owned()
            .await
            .map_err(|_| Error::Cancelled)?;
        let token = uuid::Uuid::new_v4().to_string();
        self.held.insert(token.clone(), permit);
        Ok(LockGuard {
            key: key.to_string(),
            token,
        })
    }

    async fn release_lock(&self, guard: LockGuard) -> Result<()> {
        match self.held.remove(&guard.token) {
            Some((_, permit)) => {
                drop(permit);
                Ok(())
            }
            None => Err(Error::not_found(format!(
                "lock token for {}",
                guard.key
            ))),
        }
    }
}
