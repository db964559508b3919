//! Cache configuration.
//!
//! Every field has a default, so hosts can override a subset from JSON.

use crate::sheets::DEFAULT_DOCUMENT_ID;
use serde::{Deserialize, Serialize};

/// Tunables for `CompatibilityCache`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Spreadsheet document the sheets are exported from.
    pub document_id: String,
    /// Age after which a fetched dataset is stale.
    pub freshness_window_ms: i64,
    /// Storage key of the serialized dataset.
    pub dataset_key: String,
    /// Storage key of the fetch timestamp (epoch millis as a string).
    pub timestamp_key: String,
    /// Readiness wait bound, expressed as attempts × interval.
    pub ready_poll_attempts: u32,
    pub ready_poll_interval_ms: u32,
    /// Notes returned for a key that no row matches.
    pub not_found_note: String,
    /// Notes returned when a matching row has an empty notes cell.
    pub empty_note: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            document_id: DEFAULT_DOCUMENT_ID.to_string(),
            freshness_window_ms: 24 * 60 * 60 * 1000, // 24 hours
            dataset_key: "mpCompatData".to_string(),
            timestamp_key: "mpCompatTimestamp".to_string(),
            ready_poll_attempts: 10,
            ready_poll_interval_ms: 500,
            not_found_note: "Mod not found in compatibility list".to_string(),
            empty_note: "No notes".to_string(),
        }
    }
}

impl CacheConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a (possibly partial) JSON configuration object.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Longest time `wait_ready` waits before giving up.
    pub fn ready_timeout_ms(&self) -> u32 {
        self.ready_poll_attempts
            .saturating_mul(self.ready_poll_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CacheConfig::default();
        assert_eq!(config.freshness_window_ms, 86_400_000);
        assert_eq!(config.ready_timeout_ms(), 5000);
        assert_eq!(config.document_id, DEFAULT_DOCUMENT_ID);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            CacheConfig::from_json(r#"{"freshness_window_ms": 1000, "empty_note": "-"}"#).unwrap();
        assert_eq!(config.freshness_window_ms, 1000);
        assert_eq!(config.empty_note, "-");
        assert_eq!(config.dataset_key, "mpCompatData");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(CacheConfig::from_json(r#"{"freshness_window_ms": "soon"}"#).is_err());
    }
}
