#![warn(clippy::all)]

//! Multiplayer compatibility data for RimWorld workshop pages.
//!
//! This crate fetches the public compatibility spreadsheet, keeps it in a
//! persisted cache with a 24 hour freshness window, and answers lookups by
//! workshop id. Page integration code builds one `CompatibilityCache` at
//! startup, initializes it, and queries it while rendering.
//!
//! ```text
//! SheetFetcher ──► CompatibilityCache ──► get_mod_info / summarize
//!                        │
//!                        └── KeyValueStore (localStorage on the web)
//! ```

pub mod cache;
pub mod clock;
pub mod config;
pub mod diagnostics;
pub mod fetch;
pub mod record;
pub mod sheets;
pub mod storage;
pub mod table;

#[cfg(target_arch = "wasm32")]
mod bindings;

pub use cache::{CompatibilityCache, ReadinessError, RefreshError, RefreshStatus};
pub use config::CacheConfig;
pub use diagnostics::{DiagnosticEvent, Diagnostics, LogDiagnostics};
pub use fetch::{FetchError, SheetFetcher};
pub use record::{CompatibilitySummary, ModCompatibilityRecord, StatusCode};
pub use sheets::SheetDescriptor;
pub use storage::{KeyValueStore, MemoryStore, StorageError};
pub use table::{Dataset, ParsedTable};
