//! Client-local key-value storage
//!
//! Holds the two login settings. In-memory by default; the file store keeps
//! them as a flat JSON object between runs.

use crate::error::GuardianError;
use crate::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

pub const PIN_KEY: &str = "guardian-pin";
pub const BIOMETRIC_KEY: &str = "guardian-biometric";

pub const BIOMETRIC_ENABLED: &str = "enabled";
pub const BIOMETRIC_DISABLED: &str = "disabled";

/// Trait for string key-value persistence
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// In-memory store for development and tests
#[derive(Default)]
pub struct InMemoryKeyValueStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            entries: Arc::new(RwLock::new(map)),
        }
    }
}

#[async_trait::async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// JSON file store; rewrites the whole file on every `set`
pub struct FileKeyValueStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileKeyValueStore {
    /// Opens `path`, starting empty when the file does not exist yet
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let entries = match tokio::fs::read(&path).await {
            Ok(bytes) if bytes.is_empty() => HashMap::new(),
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => return Err(e.into()),
        };

        debug!(path = %path.display(), keys = entries.len(), "Key-value file opened");

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }
}

#[async_trait::async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.write().await;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());

        // Memory only changes once the file holds the new value.
        let json = serde_json::to_vec_pretty(&next)?;
        tokio::fs::write(&self.path, json).await.map_err(|e| {
            GuardianError::StorageError(format!("writing {}: {}", self.path.display(), e))
        })?;

        *entries = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_store_reads_back_writes() {
        let store = InMemoryKeyValueStore::new();
        assert_eq!(store.get(PIN_KEY).await.unwrap(), None);

        store.set(PIN_KEY, "1234").await.unwrap();
        assert_eq!(store.get(PIN_KEY).await.unwrap().as_deref(), Some("1234"));
    }

    #[tokio::test]
    async fn file_store_persists_across_reopen() {
        let path = std::env::temp_dir().join(format!("guardian-kv-{}.json", uuid::Uuid::new_v4()));

        {
            let store = FileKeyValueStore::open(&path).await.unwrap();
            store.set(PIN_KEY, "4321").await.unwrap();
            store.set(BIOMETRIC_KEY, BIOMETRIC_ENABLED).await.unwrap();
        }

        let reopened = FileKeyValueStore::open(&path).await.unwrap();
        assert_eq!(reopened.get(PIN_KEY).await.unwrap().as_deref(), Some("4321"));
        assert_eq!(
            reopened.get(BIOMETRIC_KEY).await.unwrap().as_deref(),
            Some(BIOMETRIC_ENABLED)
        );

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn failed_write_leaves_previous_value() {
        let path = std::env::temp_dir()
            .join(format!("guardian-no-dir-{}", uuid::Uuid::new_v4()))
            .join("kv.json");
        let store = FileKeyValueStore::open(&path).await.unwrap();

        let err = store.set(PIN_KEY, "1234").await.unwrap_err();
        assert!(matches!(err, GuardianError::StorageError(_)));
        assert_eq!(store.get(PIN_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn file_store_starts_empty_when_missing() {
        let path =
            std::env::temp_dir().join(format!("guardian-missing-{}.json", uuid::Uuid::new_v4()));
        let store = FileKeyValueStore::open(&path).await.unwrap();
        assert_eq!(store.get(PIN_KEY).await.unwrap(), None);
    }
}
