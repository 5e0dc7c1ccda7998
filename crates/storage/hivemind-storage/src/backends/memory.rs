//! In-memory storage backend for testing and development

use crate::error::StorageResult;
use crate::traits::{validate, validate_namespace, KeyValueStore};
use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::Arc;

/// In-memory store, one concurrent map per namespace
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    namespaces: Arc<DashMap<String, DashMap<String, Value>>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys held in `namespace`
    pub fn len(&self, namespace: &str) -> usize {
        self.namespaces.get(namespace).map(|ns| ns.len()).unwrap_or(0)
    }

    /// Whether `namespace` holds no keys
    pub fn is_empty(&self, namespace: &str) -> bool {
        self.len(namespace) == 0
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn store(&self, key: &str, value: Value, namespace: &str) -> StorageResult<()> {
        validate(key, namespace)?;
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn retrieve(&self, key: &str, namespace: &str) -> StorageResult<Option<Value>> {
        validate(key, namespace)?;
        Ok(self
            .namespaces
            .get(namespace)
            .and_then(|ns| ns.get(key).map(|v| v.value().clone())))
    }

    async fn delete(&self, key: &str, namespace: &str) -> StorageResult<bool> {
        validate(key, namespace)?;
        Ok(self
            .namespaces
            .get(namespace)
            .map(|ns| ns.remove(key).is_some())
            .unwrap_or(false))
    }

    async fn list(&self, namespace: &str) -> StorageResult<Vec<String>> {
        validate_namespace(namespace)?;
        let mut keys: Vec<String> = self
            .namespaces
            .get(namespace)
            .map(|ns| ns.iter().map(|entry| entry.key().clone()).collect())
            .unwrap_or_default();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use serde_json::json;

    #[tokio::test]
    async fn test_store_and_retrieve() {
        let store = MemoryStore::new();
        store.store("a", json!({"x": 1}), "agents").await.unwrap();

        let value = store.retrieve("a", "agents").await.unwrap();
        assert_eq!(value, Some(json!({"x": 1})));
        assert_eq!(store.retrieve("a", "consensus").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_writer_wins() {
        let store = MemoryStore::new();
        store.store("k", json!(1), "system").await.unwrap();
        store.store("k", json!(2), "system").await.unwrap();

        assert_eq!(store.retrieve("k", "system").await.unwrap(), Some(json!(2)));
        assert_eq!(store.len("system"), 1);
    }

    #[tokio::test]
    async fn test_delete_reports_existence() {
        let store = MemoryStore::new();
        store.store("k", json!(true), "metrics").await.unwrap();

        assert!(store.delete("k", "metrics").await.unwrap());
        assert!(!store.delete("k", "metrics").await.unwrap());
        assert!(!store.delete("k", "unknown").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_scoped() {
        let store = MemoryStore::new();
        store.store("b", json!(null), "topology").await.unwrap();
        store.store("a", json!(null), "topology").await.unwrap();
        store.store("z", json!(null), "agents").await.unwrap();

        assert_eq!(store.list("topology").await.unwrap(), vec!["a", "b"]);
        assert!(store.list("hive-mind").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_empty_key() {
        let store = MemoryStore::new();
        let err = store.store("", json!(1), "agents").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));

        let err = store.list(" ").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidNamespace(_)));
    }
}
