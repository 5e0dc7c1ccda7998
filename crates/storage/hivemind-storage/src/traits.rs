//! Core storage traits

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

/// Namespaced key/value store shared by all coordination components
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Store a value under `key` in `namespace`, replacing any previous value
    async fn store(&self, key: &str, value: Value, namespace: &str) -> StorageResult<()>;

    /// Retrieve the value stored under `key`, if any
    async fn retrieve(&self, key: &str, namespace: &str) -> StorageResult<Option<Value>>;

    /// Delete `key`, returning whether it existed
    async fn delete(&self, key: &str, namespace: &str) -> StorageResult<bool>;

    /// List every key in `namespace`, sorted
    async fn list(&self, namespace: &str) -> StorageResult<Vec<String>>;
}

/// Typed helpers layered over any [`KeyValueStore`]
#[async_trait]
pub trait KeyValueStoreExt: KeyValueStore {
    /// Serialize `value` and store it
    async fn store_json<T>(&self, key: &str, value: &T, namespace: &str) -> StorageResult<()>
    where
        T: Serialize + Sync,
    {
        let json = serde_json::to_value(value)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.store(key, json, namespace).await
    }

    /// Retrieve and decode a value
    async fn retrieve_json<T>(&self, key: &str, namespace: &str) -> StorageResult<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        match self.retrieve(key, namespace).await? {
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| StorageError::Deserialization(e.to_string())),
            None => Ok(None),
        }
    }
}

impl<S: KeyValueStore + ?Sized> KeyValueStoreExt for S {}

pub(crate) fn validate_namespace(namespace: &str) -> StorageResult<()> {
    if namespace.trim().is_empty() {
        return Err(StorageError::InvalidNamespace("namespace must not be empty".into()));
    }
    Ok(())
}

pub(crate) fn validate(key: &str, namespace: &str) -> StorageResult<()> {
    validate_namespace(namespace)?;
    if key.trim().is_empty() {
        return Err(StorageError::InvalidKey("key must not be empty".into()));
    }
    Ok(())
}
