//! Device-local key-value persistence
//!
//! Small async storage abstraction used by the feed client for the two
//! values it keeps on the device:
//! - the serialized session (identity + token)
//! - the selected theme name
//!
//! Two backends are provided:
//! - [`MemoryStore`] for tests and ephemeral runs
//! - [`FileStore`] which keeps every key in a single JSON document on disk
//!
//! Values are plain strings; [`load_json`] and [`store_json`] layer serde on
//! top for typed records.

mod error;
mod file;
mod memory;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Shared handle to a storage backend
pub type SharedStore = Arc<dyn KeyValueStore>;

/// Core storage operations
#[async_trait::async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`
    async fn get(&self, key: &str) -> StorageResult<Option<String>>;

    /// Store `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    /// Remove `key` (no-op when absent)
    async fn remove(&self, key: &str) -> StorageResult<()>;
}

/// Read and deserialize a JSON value
pub async fn load_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> StorageResult<Option<T>> {
    match store.get(key).await? {
        Some(raw) => {
            let value = serde_json::from_str::<T>(&raw).map_err(|e| StorageError::Corrupted {
                key: key.to_string(),
                source: e,
            })?;
            debug!(key = %key, "Loaded stored value");
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

/// Serialize and store a JSON value
pub async fn store_json<T: Serialize + Sync>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> StorageResult<()> {
    let raw = serde_json::to_string(value).map_err(StorageError::Serialization)?;
    store.set(key, &raw).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        name: String,
        count: u32,
    }

    #[tokio::test]
    async fn test_json_helpers_round_trip_typed_records() {
        let store = MemoryStore::new();
        let record = Record {
            name: "feed".to_string(),
            count: 3,
        };

        store_json(&store, "record", &record).await.unwrap();
        let loaded: Option<Record> = load_json(&store, "record").await.unwrap();

        assert_eq!(loaded, Some(record));
    }

    #[tokio::test]
    async fn test_load_json_reports_corrupted_values() {
        let store = MemoryStore::new();
        store.set("record", "{not json").await.unwrap();

        let result: StorageResult<Option<Record>> = load_json(&store, "record").await;

        match result {
            Err(StorageError::Corrupted { key, .. }) => assert_eq!(key, "record"),
            other => panic!("expected corrupted error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_load_json_missing_key_is_none() {
        let store = MemoryStore::new();
        let loaded: Option<Record> = load_json(&store, "missing").await.unwrap();
        assert!(loaded.is_none());
    }
}
