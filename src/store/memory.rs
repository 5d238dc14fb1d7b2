//! In-memory store for tests and ephemeral runs.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::session::GuildRegistry;
use crate::store::SessionStore;

/// Keeps the last saved registry in memory.
#[derive(Default)]
pub struct MemoryStore {
    saved: RwLock<GuildRegistry>,
    saves: AtomicUsize,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `save` fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// The last successfully saved registry.
    pub async fn snapshot(&self) -> GuildRegistry {
        self.saved.read().await.clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> Result<GuildRegistry, StoreError> {
        Ok(self.saved.read().await.clone())
    }

    async fn save(&self, registry: &GuildRegistry) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Io(std::io::Error::other("writes disabled")));
        }
        *self.saved.write().await = registry.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
