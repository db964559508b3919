//! Reporting for failures the cache deliberately does not propagate.
//!
//! Persistence problems and discarded snapshots never fail a refresh or a
//! lookup. They are handed to a `Diagnostics` sink instead, so hosts and
//! tests can observe them.

use crate::storage::StorageError;

/// Something the cache handled without failing the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    /// A persisted snapshot was adopted at startup.
    SnapshotLoaded { fetched_at_ms: i64, expired: bool },
    /// The persisted snapshot could not be read and was ignored.
    SnapshotDiscarded(StorageError),
    /// Writing the refreshed dataset to storage failed.
    PersistFailed(StorageError),
    /// A refresh was skipped because another one is in flight.
    RefreshSkipped,
    /// A refresh cycle committed a new dataset.
    RefreshSucceeded { sheets: usize, fetched_at_ms: i64 },
    /// A refresh cycle failed; the previous dataset stays in place.
    RefreshFailed(String),
}

/// Receives diagnostic events from the cache.
pub trait Diagnostics {
    fn report(&self, event: DiagnosticEvent);
}

/// Forwards diagnostic events to the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDiagnostics;

impl Diagnostics for LogDiagnostics {
    fn report(&self, event: DiagnosticEvent) {
        match event {
            DiagnosticEvent::SnapshotLoaded {
                fetched_at_ms,
                expired,
            } => log::info!(
                "Loaded compatibility data from storage (fetched at {}, expired: {})",
                fetched_at_ms,
                expired
            ),
            DiagnosticEvent::SnapshotDiscarded(e) => {
                log::warn!("Ignoring stored compatibility data: {}", e)
            }
            DiagnosticEvent::PersistFailed(e) => {
                log::warn!("Failed to persist compatibility data: {}", e)
            }
            DiagnosticEvent::RefreshSkipped => {
                log::debug!("Refresh already in progress, ignoring request")
            }
            DiagnosticEvent::RefreshSucceeded {
                sheets,
                fetched_at_ms,
            } => log::info!(
                "Refreshed compatibility data: {} sheet(s) at {}",
                sheets,
                fetched_at_ms
            ),
            DiagnosticEvent::RefreshFailed(msg) => {
                log::error!("Failed to refresh compatibility data: {}", msg)
            }
        }
    }
}
