//! `SessionStore` trait: async interface to durable session state.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::session::GuildRegistry;

/// Backend-agnostic store for the whole guild registry.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load every persisted session. A missing or corrupt document yields an
    /// empty registry; only I/O failures are errors.
    async fn load(&self) -> Result<GuildRegistry, StoreError>;

    /// Overwrite the stored document with `registry`.
    async fn save(&self, registry: &GuildRegistry) -> Result<(), StoreError>;
}
