//! Backend selection from configuration

use crate::backends::{file::FileStore, memory::MemoryStore};
use crate::error::StorageResult;
use crate::traits::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Storage backend selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Ephemeral in-memory storage
    Memory,
    /// JSON documents under a directory
    File {
        /// Directory holding one document per namespace
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Memory
    }
}

impl StorageConfig {
    /// Build the configured backend
    pub async fn build(&self) -> StorageResult<Arc<dyn KeyValueStore>> {
        match self {
            StorageConfig::Memory => Ok(Arc::new(MemoryStore::new())),
            StorageConfig::File { path } => Ok(Arc::new(FileStore::open(path).await?)),
        }
    }
}
