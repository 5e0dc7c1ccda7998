//! Behavioural tests shared by every storage backend

use hivemind_storage::{
    namespaces, FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore, StorageConfig,
};
use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Record {
    name: String,
    score: f64,
}

async fn exercise_backend(store: Arc<dyn KeyValueStore>) {
    // Namespaces are isolated from each other
    store.store("shared", json!("agents"), namespaces::AGENTS).await.unwrap();
    store.store("shared", json!("consensus"), namespaces::CONSENSUS).await.unwrap();
    assert_eq!(
        store.retrieve("shared", namespaces::AGENTS).await.unwrap(),
        Some(json!("agents"))
    );
    assert_eq!(
        store.retrieve("shared", namespaces::CONSENSUS).await.unwrap(),
        Some(json!("consensus"))
    );

    // Typed helpers
    let record = Record { name: "alpha".into(), score: 0.75 };
    store.store_json("record", &record, namespaces::SYSTEM).await.unwrap();
    let loaded: Option<Record> = store.retrieve_json("record", namespaces::SYSTEM).await.unwrap();
    assert_eq!(loaded, Some(record));

    // Deletion and listing
    assert!(store.delete("shared", namespaces::AGENTS).await.unwrap());
    assert!(store.list(namespaces::AGENTS).await.unwrap().is_empty());
    assert_eq!(store.list(namespaces::CONSENSUS).await.unwrap(), vec!["shared"]);
}

#[tokio::test]
async fn test_memory_backend() {
    exercise_backend(Arc::new(MemoryStore::new())).await;
}

#[tokio::test]
async fn test_file_backend() {
    let temp_dir = TempDir::new().unwrap();
    let store = FileStore::open(temp_dir.path()).await.unwrap();
    exercise_backend(Arc::new(store)).await;
}

#[tokio::test]
async fn test_config_builds_backends() {
    let memory = StorageConfig::default().build().await.unwrap();
    exercise_backend(memory).await;

    let temp_dir = TempDir::new().unwrap();
    let file = StorageConfig::File { path: temp_dir.path().join("db") }
        .build()
        .await
        .unwrap();
    exercise_backend(file).await;
}

#[tokio::test]
async fn test_retrieve_json_reports_shape_mismatch() {
    let store = MemoryStore::new();
    store.store("record", json!([1, 2, 3]), namespaces::SYSTEM).await.unwrap();
    let result: Result<Option<Record>, _> = store.retrieve_json("record", namespaces::SYSTEM).await;
    assert!(result.is_err());
}

fn create_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("Failed to create runtime")
}

proptest! {
    #[test]
    fn prop_memory_store_matches_last_write(
        writes in prop::collection::vec(("[a-z]{1,4}", any::<i64>()), 1..40)
    ) {
        let rt = create_runtime();
        rt.block_on(async {
            let store = MemoryStore::new();
            let mut expected = std::collections::BTreeMap::new();
            for (key, value) in &writes {
                store.store(key, json!(value), namespaces::METRICS).await.unwrap();
                expected.insert(key.clone(), *value);
            }

            let keys = store.list(namespaces::METRICS).await.unwrap();
            prop_assert_eq!(keys, expected.keys().cloned().collect::<Vec<_>>());
            for (key, value) in expected {
                prop_assert_eq!(
                    store.retrieve(&key, namespaces::METRICS).await.unwrap(),
                    Some(json!(value))
                );
            }
            Ok(())
        })?;
    }
}
