//! JSON file store.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::{error, info};

use crate::error::StoreError;
use crate::session::GuildRegistry;
use crate::store::SessionStore;

/// Stores the registry as pretty-printed JSON at `path`.
///
/// Writes go to a sibling temp file that is then renamed over the target, so
/// a crash mid-write leaves the previous document intact.
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    /// Where an unreadable document is moved before starting empty.
    pub fn corrupt_path(&self) -> PathBuf {
        self.sibling(".corrupt")
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "count_data.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Move the unreadable document aside so the next save does not destroy it.
    async fn quarantine(&self, reason: &str) {
        let target = self.corrupt_path();
        match fs::rename(&self.path, &target).await {
            Ok(()) => error!(
                path = %self.path.display(),
                moved_to = %target.display(),
                error = %reason,
                "Corrupt counting data, starting with no sessions"
            ),
            Err(e) => error!(
                path = %self.path.display(),
                error = %reason,
                rename_error = %e,
                "Corrupt counting data could not be moved aside, starting with no sessions"
            ),
        }
    }
}

#[async_trait]
impl SessionStore for JsonFileStore {
    async fn load(&self) -> Result<GuildRegistry, StoreError> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                let registry = GuildRegistry::new();
                match self.save(&registry).await {
                    Ok(()) => {
                        info!(path = %self.path.display(), "No existing data file found, created new one")
                    }
                    Err(e) => error!(
                        path = %self.path.display(),
                        error = %e,
                        "No existing data file found and creating one failed"
                    ),
                }
                return Ok(registry);
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                self.quarantine(&e.to_string()).await;
                return Ok(GuildRegistry::new());
            }
            Err(e) => return Err(e.into()),
        };

        match serde_json::from_str::<GuildRegistry>(&raw) {
            Ok(registry) => {
                info!(
                    path = %self.path.display(),
                    sessions = registry.session_count(),
                    "Counting data loaded"
                );
                Ok(registry)
            }
            Err(e) => {
                self.quarantine(&e.to_string()).await;
                Ok(GuildRegistry::new())
            }
        }
    }

    async fn save(&self, registry: &GuildRegistry) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(registry)?;
        let tmp = self.temp_path();
        fs::write(&tmp, json).await?;
        fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::session::{ChannelSession, ModeConfig};
    use tempfile::TempDir;

    fn store() -> (JsonFileStore, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("data").join("count_data.json"));
        (store, dir)
    }

    #[tokio::test]
    async fn missing_file_loads_empty_and_creates_it() {
        let (store, _dir) = store();
        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
        assert!(store.path().exists());
    }

    #[tokio::test]
    async fn save_then_load() {
        let (store, _dir) = store();
        let mut registry = GuildRegistry::new();
        let mut session = ChannelSession::new(
            ModeConfig::parse("custom", "3,1,4").unwrap(),
            &EngineConfig::default(),
        );
        session.commit(3, "alice");
        registry.insert("g", "c", session);

        store.save(&registry).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, registry);
        assert!(!store.temp_path().exists());
    }

    #[tokio::test]
    async fn corrupt_file_loads_empty() {
        let (store, _dir) = store();
        fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        fs::write(store.path(), "{ not json").await.unwrap();
        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
        assert!(!store.path().exists());
        let kept = fs::read_to_string(store.corrupt_path()).await.unwrap();
        assert_eq!(kept, "{ not json");
    }

    #[tokio::test]
    async fn non_utf8_file_loads_empty_and_is_moved_aside() {
        let (store, _dir) = store();
        fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        fs::write(store.path(), [0xff, 0xfe, 0x00, 0x7b]).await.unwrap();

        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
        assert!(store.corrupt_path().exists());
        assert!(store.save(&registry).await.is_ok());
    }

    #[tokio::test]
    async fn missing_file_that_cannot_be_created_still_loads_empty() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, "plain file").await.unwrap();
        let store = JsonFileStore::new(blocker.join("count_data.json"));

        let registry = store.load().await.unwrap();
        assert!(registry.is_empty());
        assert!(!store.path().exists());
    }

    #[tokio::test]
    async fn reads_existing_documents_with_every_field() {
        let (store, _dir) = store();
        fs::create_dir_all(store.path().parent().unwrap()).await.unwrap();
        let doc = r#"{
            "111": {"channels": {"222": {
                "current_count": 5, "last_user": "42", "taking_turns": true,
                "leaderboard": {"42": 3, "7": 2}, "mode": "normal", "step": 1,
                "skip_numbers": [5, 10], "random_range": [1, 3], "multiple": null,
                "custom_sequence": null, "sequence_index": 0,
                "last_count_time": 1700000000.25, "reset_on_wrong_count": false
            }}}
        }"#;
        fs::write(store.path(), doc).await.unwrap();

        let registry = store.load().await.unwrap();
        let session = registry.get("111", "222").unwrap();
        assert_eq!(session.current_value, 5);
        assert_eq!(session.last_contributor.as_deref(), Some("42"));
        assert!(session.taking_turns);
        assert_eq!(session.leaderboard.get("42"), Some(3));
    }
}
