//! Generic storage abstraction for persistent data.
//!
//! This module provides a platform-agnostic interface for key-value storage.
//! On WASM targets, `LocalStorageStore` persists to the page origin's
//! `localStorage`. `MemoryStore` is available everywhere and keeps data only
//! for the lifetime of the process.

#[cfg(target_arch = "wasm32")]
mod local_storage;

#[cfg(target_arch = "wasm32")]
pub use local_storage::LocalStorageStore;

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, RwLock};

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The storage backend is not available in this context.
    Unavailable(String),
    /// The backend rejected a read or write (quota, security error).
    Backend(String),
    /// Serialization or deserialization failed.
    Serialization(String),
    /// Entries that must be written together were found out of step.
    Inconsistent(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
            StorageError::Backend(msg) => write!(f, "Storage backend error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Serialization error: {}", msg),
            StorageError::Inconsistent(msg) => write!(f, "Inconsistent storage: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// A generic key-value storage interface.
///
/// Values are stored as JSON strings. Implementations can use different
/// backends while providing a consistent API.
///
/// Note: This trait does not require `Send` bounds since WASM is single-threaded
/// and JS types cannot be sent between threads.
pub trait KeyValueStore {
    /// Stores a value under the given key, overwriting any existing value.
    fn put<T: Serialize + 'static>(
        &self,
        key: &str,
        value: &T,
    ) -> impl Future<Output = Result<(), StorageError>>;

    /// Retrieves a value by key.
    ///
    /// Returns `Ok(None)` if the key doesn't exist.
    fn get<T: DeserializeOwned + 'static>(
        &self,
        key: &str,
    ) -> impl Future<Output = Result<Option<T>, StorageError>>;

    /// Deletes a value by key.
    ///
    /// Returns `Ok(())` even if the key didn't exist.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>>;
}

/// A simple in-memory store.
///
/// Data is not persisted across process restarts. Clones share the same
/// underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    data: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw JSON string, bypassing serialization.
    pub fn put_raw(&self, key: &str, json: impl Into<String>) {
        if let Ok(mut data) = self.data.write() {
            data.insert(key.to_string(), json.into());
        }
    }

    /// Reads the raw JSON string stored under `key`.
    pub fn get_raw(&self, key: &str) -> Option<String> {
        self.data.read().ok()?.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get_raw(key).is_some()
    }
}

impl KeyValueStore for MemoryStore {
    async fn put<T: Serialize + 'static>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;
        self.data
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .insert(key.to_string(), json);
        Ok(())
    }

    async fn get<T: DeserializeOwned + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let data = self
            .data
            .read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        match data.get(key) {
            Some(json) => {
                let value = serde_json::from_str(json)
                    .map_err(|e| StorageError::Serialization(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.data
            .write()
            .map_err(|e| StorageError::Backend(e.to_string()))?
            .remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pollster::block_on;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        block_on(store.put("k", &vec![1u32, 2, 3])).unwrap();

        let value: Option<Vec<u32>> = block_on(store.get("k")).unwrap();
        assert_eq!(value, Some(vec![1, 2, 3]));
        assert_eq!(store.get_raw("k").as_deref(), Some("[1,2,3]"));
    }

    #[test]
    fn test_memory_store_missing_and_delete() {
        let store = MemoryStore::new();
        let missing: Option<String> = block_on(store.get("nope")).unwrap();
        assert!(missing.is_none());

        store.put_raw("k", "\"v\"");
        block_on(store.delete("k")).unwrap();
        block_on(store.delete("k")).unwrap();
        assert!(!store.contains("k"));
    }

    #[test]
    fn test_memory_store_bad_json_is_serialization_error() {
        let store = MemoryStore::new();
        store.put_raw("k", "{not json");
        let result: Result<Option<Vec<u32>>, _> = block_on(store.get("k"));
        assert!(matches!(result, Err(StorageError::Serialization(_))));
    }

    #[test]
    fn test_clones_share_data() {
        let store = MemoryStore::new();
        let other = store.clone();
        store.put_raw("k", "1");
        assert!(other.contains("k"));
    }
}
