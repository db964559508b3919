//! `localStorage`-backed store for WASM targets.
//!
//! localStorage is synchronous, so the async methods complete immediately.
//! It is shared by every page of the origin and survives reloads.

use super::{KeyValueStore, StorageError};
use serde::{de::DeserializeOwned, Serialize};
use web_sys::Storage;

/// Key-value store over `window.localStorage`.
#[derive(Clone, Default)]
pub struct LocalStorageStore {
    /// Prepended to every key to avoid clashing with the host page.
    prefix: String,
}

impl LocalStorageStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn storage(&self) -> Result<Storage, StorageError> {
        let window = web_sys::window()
            .ok_or_else(|| StorageError::Unavailable("No window object".to_string()))?;

        window
            .local_storage()
            .map_err(|e| StorageError::Unavailable(format!("{:?}", e)))?
            .ok_or_else(|| StorageError::Unavailable("localStorage not available".to_string()))
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

impl KeyValueStore for LocalStorageStore {
    async fn put<T: Serialize + 'static>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let storage = self.storage()?;
        let json =
            serde_json::to_string(value).map_err(|e| StorageError::Serialization(e.to_string()))?;

        storage
            .set_item(&self.full_key(key), &json)
            .map_err(|e| StorageError::Backend(format!("{:?}", e)))
    }

    async fn get<T: DeserializeOwned + 'static>(
        &self,
        key: &str,
    ) -> Result<Option<T>, StorageError> {
        let storage = self.storage()?;

        let json = match storage
            .get_item(&self.full_key(key))
            .map_err(|e| StorageError::Backend(format!("{:?}", e)))?
        {
            Some(json) => json,
            None => return Ok(None),
        };

        let value =
            serde_json::from_str(&json).map_err(|e| StorageError::Serialization(e.to_string()))?;
        Ok(Some(value))
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        self.storage()?
            .remove_item(&self.full_key(key))
            .map_err(|e| StorageError::Backend(format!("{:?}", e)))
    }
}
