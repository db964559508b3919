//! Durable snapshot of the dataset and its fetch time.
//!
//! The dataset and the timestamp live under two storage keys but form one
//! logical record: a snapshot is only loaded when both are present, and a
//! failed timestamp write removes the dataset it would have described.

use crate::config::CacheConfig;
use crate::storage::{KeyValueStore, StorageError};
use crate::table::Dataset;
use serde::Deserialize;

/// A dataset together with the time it was fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Snapshot {
    pub dataset: Dataset,
    pub fetched_at_ms: i64,
}

/// Timestamp entry as found in storage. Written as bare epoch milliseconds;
/// the quoted form is still read so older entries keep loading.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    Millis(i64),
    Text(String),
}

impl StoredTimestamp {
    fn millis(self) -> Result<i64, StorageError> {
        match self {
            StoredTimestamp::Millis(ms) => Ok(ms),
            StoredTimestamp::Text(text) => text.trim().parse::<i64>().map_err(|e| {
                StorageError::Serialization(format!("Bad timestamp {:?}: {}", text, e))
            }),
        }
    }
}

/// Reads the persisted snapshot, if any.
pub(crate) async fn load<S: KeyValueStore>(
    store: &S,
    config: &CacheConfig,
) -> Result<Option<Snapshot>, StorageError> {
    let dataset: Option<Dataset> = store.get(&config.dataset_key).await?;
    let timestamp: Option<StoredTimestamp> = store.get(&config.timestamp_key).await?;

    match (dataset, timestamp) {
        (None, None) => Ok(None),
        (Some(dataset), Some(timestamp)) => {
            Ok(Some(Snapshot {
                dataset,
                fetched_at_ms: timestamp.millis()?,
            }))
        }
        (Some(_), None) => Err(StorageError::Inconsistent(
            "dataset stored without a timestamp".to_string(),
        )),
        (None, Some(_)) => Err(StorageError::Inconsistent(
            "timestamp stored without a dataset".to_string(),
        )),
    }
}

/// Writes the dataset, then its timestamp as bare epoch milliseconds.
pub(crate) async fn save<S: KeyValueStore>(
    store: &S,
    config: &CacheConfig,
    dataset: &Dataset,
    fetched_at_ms: i64,
) -> Result<(), StorageError> {
    store.put(&config.dataset_key, dataset).await?;

    if let Err(e) = store.put(&config.timestamp_key, &fetched_at_ms).await {
        let _ = clear(store, config).await;
        return Err(e);
    }

    Ok(())
}

/// Removes both entries, reporting the first failure.
pub(crate) async fn clear<S: KeyValueStore>(
    store: &S,
    config: &CacheConfig,
) -> Result<(), StorageError> {
    let dataset = store.delete(&config.dataset_key).await;
    let timestamp = store.delete(&config.timestamp_key).await;
    dataset.and(timestamp)
}
