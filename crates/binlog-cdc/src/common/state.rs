//! Per-task key/value state
//!
//! The reader persists three things between runs: its session identity, the
//! first-run flag and the compressed schema history. The backing store is the
//! embedding application's concern; [`StateStore`] is the seam, with an
//! in-memory store for tests and a JSON file store for single-node use.

use crate::common::{CdcError, Result};
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Key/value state scoped to one reader task.
#[async_trait::async_trait]
pub trait StateStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;
    async fn put(&self, key: &str, value: Value) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;

    /// String value under `key`; any other JSON type is a state error.
    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        match self.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(CdcError::state(format!(
                "Expected string under {}, found {}",
                key, other
            ))),
        }
    }

    /// Boolean value under `key`; any other JSON type is a state error.
    async fn get_bool(&self, key: &str) -> Result<Option<bool>> {
        match self.get(key).await? {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(b)),
            Some(other) => Err(CdcError::state(format!(
                "Expected bool under {}, found {}",
                key, other
            ))),
        }
    }
}

/// Shared state store handle.
pub type SharedStateStore = Arc<dyn StateStore>;

/// In-memory state (for testing or when persistence isn't needed).
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    entries: RwLock<HashMap<String, Value>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl StateStore for MemoryStateStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

/// File-backed state: one JSON file per key, written atomically.
pub struct FileStateStore {
    base_dir: PathBuf,
    cache: RwLock<HashMap<String, Value>>,
    fsync: bool,
}

impl FileStateStore {
    /// Open (or create) a store rooted at `base_dir`.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        Self::with_options(base_dir, true).await
    }

    /// Open with explicit fsync behavior.
    pub async fn with_options(base_dir: impl AsRef<Path>, fsync: bool) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).await?;

        let store = Self {
            base_dir,
            cache: RwLock::new(HashMap::new()),
            fsync,
        };
        store.load_all().await?;
        Ok(store)
    }

    fn validate_key(key: &str) -> Result<()> {
        if key.is_empty() || key.contains('/') || key.contains('\\') || key.starts_with('.') {
            return Err(CdcError::config(format!("Invalid state key: {:?}", key)));
        }
        Ok(())
    }

    fn file_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", key))
    }

    async fn read_file(path: &Path) -> Result<Value> {
        let mut file = File::open(path).await?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).await?;
        serde_json::from_str(&contents).map_err(|e| CdcError::serialization(e.to_string()))
    }

    async fn load_all(&self) -> Result<()> {
        let mut entries = fs::read_dir(&self.base_dir).await?;
        let mut cache = self.cache.write().await;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            let Some(key) = path.file_stem().and_then(|s| s.to_str()).map(String::from) else {
                continue;
            };
            match Self::read_file(&path).await {
                Ok(value) => {
                    cache.insert(key, value);
                }
                Err(e) => warn!("Failed to load state entry {}: {}", key, e),
            }
        }

        if !cache.is_empty() {
            info!(
                "Loaded {} state entries from {}",
                cache.len(),
                self.base_dir.display()
            );
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl StateStore for FileStateStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Self::validate_key(key)?;
        Ok(self.cache.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: Value) -> Result<()> {
        Self::validate_key(key)?;

        let file_path = self.file_path(key);
        let temp_path = file_path.with_extension("tmp");
        let json = serde_json::to_string_pretty(&value)
            .map_err(|e| CdcError::serialization(e.to_string()))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .await?;
        file.write_all(json.as_bytes()).await?;
        if self.fsync {
            file.sync_all().await?;
        }
        fs::rename(&temp_path, &file_path).await?;

        self.cache.write().await.insert(key.to_string(), value);
        debug!("Saved state entry {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        Self::validate_key(key)?;

        let file_path = self.file_path(key);
        if fs::try_exists(&file_path).await? {
            fs::remove_file(&file_path).await?;
        }
        self.cache.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_memory_state_store() {
        let store = MemoryStateStore::new();
        assert!(store.is_empty().await);

        store.put("SERVER_NAME", json!("abc")).await.unwrap();
        store.put("FIRST_TIME", json!(true)).await.unwrap();

        assert_eq!(store.get_string("SERVER_NAME").await.unwrap(), Some("abc".to_string()));
        assert_eq!(store.get_bool("FIRST_TIME").await.unwrap(), Some(true));
        assert_eq!(store.get("missing").await.unwrap(), None);

        store.remove("SERVER_NAME").await.unwrap();
        assert_eq!(store.get_string("SERVER_NAME").await.unwrap(), None);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_typed_getters_reject_wrong_type() {
        let store = MemoryStateStore::new();
        store.put("k", json!(5)).await.unwrap();

        assert!(store.get_string("k").await.is_err());
        assert!(store.get_bool("k").await.is_err());
    }

    #[tokio::test]
    async fn test_file_state_store_survives_restart() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();
        store.put("SERVER_NAME", json!("abc")).await.unwrap();
        store.put("gone", json!(1)).await.unwrap();
        store.remove("gone").await.unwrap();
        drop(store);

        let reopened = FileStateStore::with_options(dir.path(), false).await.unwrap();
        assert_eq!(
            reopened.get_string("SERVER_NAME").await.unwrap(),
            Some("abc".to_string())
        );
        assert_eq!(reopened.get("gone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_file_state_store_invalid_key() {
        let dir = tempdir().unwrap();
        let store = FileStateStore::new(dir.path()).await.unwrap();

        assert!(store.put("", json!(1)).await.is_err());
        assert!(store.put("foo/bar", json!(1)).await.is_err());
        assert!(store.put("foo\\bar", json!(1)).await.is_err());
    }
}
