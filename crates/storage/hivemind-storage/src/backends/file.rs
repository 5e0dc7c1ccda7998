//! File-backed storage: one JSON document per namespace
//!
//! Each namespace is persisted as `<dir>/<namespace>.json` holding an object of
//! `key -> value`. Writes go to a temporary file first and are renamed into
//! place so a crash never leaves a half-written document behind.

use crate::error::{StorageError, StorageResult};
use crate::traits::{validate, validate_namespace, KeyValueStore};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, info};

/// JSON-file implementation of [`KeyValueStore`]
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl FileStore {
    /// Open (and create if needed) a store rooted at `dir`
    pub async fn open<P: AsRef<Path>>(dir: P) -> StorageResult<Self> {
        let root = dir.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        info!("Opened file store at {}", root.display());
        Ok(Self {
            root,
            lock: RwLock::new(()),
        })
    }

    /// Directory holding the namespace documents
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn namespace_path(&self, namespace: &str) -> StorageResult<PathBuf> {
        if namespace
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
        {
            return Err(StorageError::InvalidNamespace(format!(
                "namespace '{namespace}' may only contain [A-Za-z0-9_-]"
            )));
        }
        Ok(self.root.join(format!("{namespace}.json")))
    }

    async fn load(&self, path: &Path) -> StorageResult<Map<String, Value>> {
        match tokio::fs::read(path).await {
            Ok(bytes) => match serde_json::from_slice::<Value>(&bytes)? {
                Value::Object(map) => Ok(map),
                other => Err(StorageError::Deserialization(format!(
                    "expected object document in {}, found {}",
                    path.display(),
                    other
                ))),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Map::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, path: &Path, document: Map<String, Value>) -> StorageResult<()> {
        let bytes = serde_json::to_vec_pretty(&Value::Object(document))
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let temp = path.with_extension("json.tmp");
        tokio::fs::write(&temp, bytes).await?;
        tokio::fs::rename(&temp, path).await?;
        debug!("Persisted {}", path.display());
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn store(&self, key: &str, value: Value, namespace: &str) -> StorageResult<()> {
        validate(key, namespace)?;
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.write().await;
        let mut document = self.load(&path).await?;
        document.insert(key.to_string(), value);
        self.save(&path, document).await
    }

    async fn retrieve(&self, key: &str, namespace: &str) -> StorageResult<Option<Value>> {
        validate(key, namespace)?;
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.read().await;
        let mut document = self.load(&path).await?;
        Ok(document.remove(key))
    }

    async fn delete(&self, key: &str, namespace: &str) -> StorageResult<bool> {
        validate(key, namespace)?;
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.write().await;
        let mut document = self.load(&path).await?;
        if document.remove(key).is_none() {
            return Ok(false);
        }
        self.save(&path, document).await?;
        Ok(true)
    }

    async fn list(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_namespace(namespace)?;
        let path = self.namespace_path(namespace)?;
        let _guard = self.lock.read().await;
        let document = self.load(&path).await?;
        let mut keys: Vec<String> = document.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let store = FileStore::open(temp_dir.path()).await.unwrap();
            store.store("decision:1", json!({"ok": true}), "consensus").await.unwrap();
        }

        let store = FileStore::open(temp_dir.path()).await.unwrap();
        let value = store.retrieve("decision:1", "consensus").await.unwrap();
        assert_eq!(value, Some(json!({"ok": true})));
        assert!(temp_dir.path().join("consensus.json").exists());
    }

    #[tokio::test]
    async fn test_file_store_delete_and_list() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();

        store.store("b", json!(2), "hive-mind").await.unwrap();
        store.store("a", json!(1), "hive-mind").await.unwrap();
        assert_eq!(store.list("hive-mind").await.unwrap(), vec!["a", "b"]);

        assert!(store.delete("a", "hive-mind").await.unwrap());
        assert!(!store.delete("a", "hive-mind").await.unwrap());
        assert_eq!(store.list("hive-mind").await.unwrap(), vec!["b"]);
    }

    #[tokio::test]
    async fn test_file_store_rejects_path_like_namespace() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();

        let err = store.store("k", json!(1), "../escape").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidNamespace(_)));
    }

    #[tokio::test]
    async fn test_missing_namespace_lists_empty() {
        let temp_dir = TempDir::new().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        assert!(store.list("agents").await.unwrap().is_empty());
        assert_eq!(store.retrieve("x", "agents").await.unwrap(), None);
    }
}
