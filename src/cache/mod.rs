//! Compatibility data cache.
//!
//! `CompatibilityCache` owns the dataset, keeps it fresh and answers
//! lookups. It is created once per page and shared by cloning the handle;
//! clones see the same state.
//!
//! ## Lifecycle
//!
//! 1. `initialize` adopts a persisted snapshot if one deserializes cleanly,
//!    refreshing it right away when expired. Without a usable snapshot it
//!    refreshes from the network.
//! 2. Whatever happens, the cache ends up `initialized`. A failed first load
//!    leaves it ready but empty.
//! 3. `refresh` fetches every sheet and commits only if all of them succeed.
//!
//! Lookups never fail: "sheet not loaded" is `None`, while "key not in a
//! loaded sheet" is an untested record.

mod persist;
mod readiness;
mod state;
mod status;

pub use readiness::ReadinessError;
pub use status::{RefreshStatus, StatusCallback, SubscriptionId};

use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::diagnostics::{DiagnosticEvent, Diagnostics, LogDiagnostics};
use crate::fetch::{FetchError, SheetFetcher};
use crate::record::{CompatibilitySummary, ModCompatibilityRecord, StatusCode};
use crate::sheets::{SheetDescriptor, SHEETS};
use crate::storage::{KeyValueStore, StorageError};
use crate::table::{self, Dataset, ParsedTable, NOTES_COLUMN, STATUS_COLUMN};
#[cfg(target_arch = "wasm32")]
use chrono::FixedOffset;
use chrono::{DateTime, Utc};
use readiness::Readiness;
use state::CacheState;
use status::StatusListeners;
use std::cell::RefCell;
use std::rc::Rc;

/// Shown by `get_last_updated` before any successful fetch.
pub const NEVER_UPDATED: &str = "Never";

/// A refresh cycle that did not commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    /// Fetching one of the sheets failed; nothing was committed.
    Fetch {
        selector: String,
        source: FetchError,
    },
    /// Another refresh is already running.
    Busy,
}

impl std::fmt::Display for RefreshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefreshError::Fetch { selector, source } => {
                write!(f, "Failed to load sheet {}: {}", selector, source)
            }
            RefreshError::Busy => write!(f, "A refresh is already in progress"),
        }
    }
}

impl std::error::Error for RefreshError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RefreshError::Fetch { source, .. } => Some(source),
            RefreshError::Busy => None,
        }
    }
}

struct Inner<F, S> {
    config: CacheConfig,
    sheets: Vec<SheetDescriptor>,
    fetcher: F,
    store: S,
    clock: Rc<dyn Clock>,
    diagnostics: Rc<dyn Diagnostics>,
    state: RefCell<CacheState>,
    status: StatusListeners,
    readiness: Readiness,
}

/// Shared handle to the compatibility dataset.
pub struct CompatibilityCache<F, S> {
    inner: Rc<Inner<F, S>>,
}

impl<F, S> Clone for CompatibilityCache<F, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Builder for `CompatibilityCache`.
pub struct CacheBuilder<F, S> {
    fetcher: F,
    store: S,
    config: CacheConfig,
    sheets: Vec<SheetDescriptor>,
    clock: Rc<dyn Clock>,
    diagnostics: Rc<dyn Diagnostics>,
}

impl<F, S> CacheBuilder<F, S> {
    pub fn config(mut self, config: CacheConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the sheet list (newest first).
    pub fn sheets(mut self, sheets: Vec<SheetDescriptor>) -> Self {
        self.sheets = sheets;
        self
    }

    pub fn clock(mut self, clock: Rc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn diagnostics(mut self, diagnostics: Rc<dyn Diagnostics>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn build(self) -> CompatibilityCache<F, S> {
        CompatibilityCache {
            inner: Rc::new(Inner {
                config: self.config,
                sheets: self.sheets,
                fetcher: self.fetcher,
                store: self.store,
                clock: self.clock,
                diagnostics: self.diagnostics,
                state: RefCell::new(CacheState::default()),
                status: StatusListeners::default(),
                readiness: Readiness::default(),
            }),
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn render_fetch_time(ms: i64) -> Option<String> {
    let utc = DateTime::<Utc>::from_timestamp_millis(ms)?;
    // getTimezoneOffset is minutes behind UTC, for that instant.
    let behind_min =
        js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(ms as f64)).get_timezone_offset();
    let offset = FixedOffset::west_opt((behind_min as i32) * 60)?;
    Some(utc.with_timezone(&offset).format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(not(target_arch = "wasm32"))]
fn render_fetch_time(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
}

/// Decrements the in-flight counter when a refresh ends, however it ends.
struct InFlightGuard<'a>(&'a RefCell<CacheState>);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.0.borrow_mut();
        state.refreshes_in_flight = state.refreshes_in_flight.saturating_sub(1);
    }
}

impl<F, S> CompatibilityCache<F, S> {
    pub fn builder(fetcher: F, store: S) -> CacheBuilder<F, S> {
        CacheBuilder {
            fetcher,
            store,
            config: CacheConfig::default(),
            sheets: SHEETS.to_vec(),
            clock: Rc::new(SystemClock),
            diagnostics: Rc::new(LogDiagnostics),
        }
    }

    /// Creates a cache with default configuration, clock and logging.
    pub fn new(fetcher: F, store: S) -> Self {
        Self::builder(fetcher, store).build()
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Configured sheets, newest first.
    pub fn sheets(&self) -> &[SheetDescriptor] {
        &self.inner.sheets
    }

    /// True once the first load attempt has finished, successful or not.
    pub fn is_initialized(&self) -> bool {
        self.inner.state.borrow().initialized
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.state.borrow().refreshes_in_flight > 0
    }

    /// True when nothing was fetched yet or the data is older than the
    /// freshness window.
    pub fn is_expired(&self) -> bool {
        self.inner.state.borrow().is_expired(
            self.inner.clock.now_ms(),
            self.inner.config.freshness_window_ms,
        )
    }

    /// The committed dataset, for bulk use.
    pub fn data(&self) -> Option<Rc<Dataset>> {
        self.inner.state.borrow().dataset.clone()
    }

    pub fn last_fetched_ms(&self) -> Option<i64> {
        self.inner.state.borrow().fetched_at_ms
    }

    /// Human-readable fetch time, or `NEVER_UPDATED`.
    ///
    /// In the browser this is the viewer's local time; native builds have no
    /// time zone source and render UTC.
    pub fn get_last_updated(&self) -> String {
        self.last_fetched_ms()
            .and_then(render_fetch_time)
            .unwrap_or_else(|| NEVER_UPDATED.to_string())
    }

    /// Looks up a mod in one sheet.
    ///
    /// Returns `None` when no dataset is loaded or the sheet is not part of
    /// it. A loaded sheet without the key yields an untested record carrying
    /// the not-found note.
    pub fn get_mod_info(&self, key: &str, selector: &str) -> Option<ModCompatibilityRecord> {
        let dataset = self.data()?;
        let sheet = dataset.sheet(selector)?;
        Some(self.record_for(sheet, key))
    }

    /// Counts statuses for a set of mods in one sheet.
    ///
    /// Keys missing from the sheet count as untested.
    pub fn summarize<'k>(
        &self,
        keys: impl IntoIterator<Item = &'k str>,
        selector: &str,
    ) -> Option<CompatibilitySummary> {
        let dataset = self.data()?;
        let sheet = dataset.sheet(selector)?;

        let mut summary = CompatibilitySummary::new();
        for key in keys {
            summary.record(self.record_for(sheet, key).status);
        }
        Some(summary)
    }

    /// Link to the spreadsheet row describing `key`, if it is listed.
    pub fn row_link(&self, key: &str, selector: &str) -> Option<String> {
        let descriptor = self.inner.sheets.iter().find(|s| s.selector == selector)?;
        let dataset = self.data()?;
        let (index, _) = dataset.sheet(selector)?.find_row(key)?;
        Some(descriptor.row_link(&self.inner.config.document_id, index))
    }

    fn record_for(&self, sheet: &ParsedTable, key: &str) -> ModCompatibilityRecord {
        let config = &self.inner.config;
        match sheet.find_row(key) {
            Some((_, row)) => {
                let status = StatusCode::from_raw(table::field(row, STATUS_COLUMN).unwrap_or(""));
                let notes = match table::field(row, NOTES_COLUMN) {
                    Some(notes) if !notes.is_empty() => notes,
                    _ => config.empty_note.as_str(),
                };
                ModCompatibilityRecord::new(status, notes)
            }
            None => ModCompatibilityRecord::new(StatusCode::Untested, config.not_found_note.as_str()),
        }
    }

    pub fn current_status(&self) -> RefreshStatus {
        self.inner.status.current()
    }

    /// Registers a callback for refresh status transitions.
    pub fn subscribe(&self, callback: impl Fn(&RefreshStatus) + 'static) -> SubscriptionId {
        self.inner.status.subscribe(Rc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.status.unsubscribe(id)
    }

    /// Waits until the cache is initialized, bounded by the configured
    /// readiness timeout.
    pub async fn wait_ready(&self) -> Result<(), ReadinessError> {
        self.inner
            .readiness
            .wait(
                self.inner.clock.as_ref(),
                self.inner.config.ready_timeout_ms(),
            )
            .await
    }

    fn report(&self, event: DiagnosticEvent) {
        self.inner.diagnostics.report(event);
    }

    fn mark_initialized(&self) {
        self.inner.state.borrow_mut().initialized = true;
        self.inner.readiness.mark_ready();
    }
}

impl<F: SheetFetcher, S: KeyValueStore> CompatibilityCache<F, S> {
    /// Loads persisted data or fetches it. Runs at most once.
    pub async fn initialize(&self) {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.init_started {
                return;
            }
            state.init_started = true;
        }

        match persist::load(&self.inner.store, &self.inner.config).await {
            Ok(Some(snapshot)) => {
                self.inner
                    .state
                    .borrow_mut()
                    .commit(snapshot.dataset, snapshot.fetched_at_ms);

                let expired = self.is_expired();
                self.report(DiagnosticEvent::SnapshotLoaded {
                    fetched_at_ms: snapshot.fetched_at_ms,
                    expired,
                });

                if expired {
                    // Stale data keeps serving lookups while this runs.
                    let _ = self.refresh().await;
                }
            }
            Ok(None) => {
                let _ = self.refresh().await;
            }
            Err(e) => {
                self.report(DiagnosticEvent::SnapshotDiscarded(e));
                let _ = self.refresh().await;
            }
        }

        self.mark_initialized();
    }

    /// Fetches every sheet and commits them together.
    ///
    /// Returns `Ok(())` without doing anything if a refresh is already in
    /// flight after initialization.
    pub async fn refresh(&self) -> Result<(), RefreshError> {
        match self.try_refresh().await {
            Err(RefreshError::Busy) => Ok(()),
            other => other,
        }
    }

    /// Like `refresh`, but reports a skipped cycle as `RefreshError::Busy`.
    ///
    /// The in-flight check only applies after initialization, so a refresh
    /// requested during the very first load still runs.
    pub async fn try_refresh(&self) -> Result<(), RefreshError> {
        {
            let mut state = self.inner.state.borrow_mut();
            if state.refreshes_in_flight > 0 && state.initialized {
                drop(state);
                self.report(DiagnosticEvent::RefreshSkipped);
                return Err(RefreshError::Busy);
            }
            state.refreshes_in_flight += 1;
        }
        let guard = InFlightGuard(&self.inner.state);

        self.inner.status.emit(RefreshStatus::Loading);

        let outcome = match self.fetch_all().await {
            Ok(dataset) => Ok(self.commit(dataset).await),
            Err(e) => Err(e),
        };
        // Released before listeners run so they may start another refresh.
        drop(guard);

        match outcome {
            Ok(fetched_at_ms) => {
                self.inner
                    .status
                    .emit(RefreshStatus::Success { fetched_at_ms });
                Ok(())
            }
            Err(e) => {
                self.report(DiagnosticEvent::RefreshFailed(e.to_string()));
                self.inner.status.emit(RefreshStatus::Error(e.to_string()));
                Err(e)
            }
        }
    }

    /// Swaps in a complete dataset and persists it, best effort.
    async fn commit(&self, dataset: Dataset) -> i64 {
        let dataset = Rc::new(dataset);
        let fetched_at_ms = self.inner.clock.now_ms();
        self.inner
            .state
            .borrow_mut()
            .commit(dataset.clone(), fetched_at_ms);

        if let Err(e) =
            persist::save(&self.inner.store, &self.inner.config, &dataset, fetched_at_ms).await
        {
            self.report(DiagnosticEvent::PersistFailed(e));
        }

        self.report(DiagnosticEvent::RefreshSucceeded {
            sheets: dataset.len(),
            fetched_at_ms,
        });
        fetched_at_ms
    }

    /// Fetches and parses every configured sheet in order.
    async fn fetch_all(&self) -> Result<Dataset, RefreshError> {
        let mut dataset = Dataset::new();
        for sheet in &self.inner.sheets {
            let text = self
                .inner
                .fetcher
                .fetch(sheet.selector)
                .await
                .map_err(|source| RefreshError::Fetch {
                    selector: sheet.selector.to_string(),
                    source,
                })?;
            dataset.insert(sheet.selector, table::parse(&text));
        }
        Ok(dataset)
    }

    /// Removes the persisted snapshot. The in-memory dataset is kept.
    pub async fn clear_persisted(&self) -> Result<(), StorageError> {
        persist::clear(&self.inner.store, &self.inner.config).await
    }
}

impl<F, S> CompatibilityCache<F, S>
where
    F: SheetFetcher + 'static,
    S: KeyValueStore + 'static,
{
    /// Starts `initialize` on the browser event loop.
    #[cfg(target_arch = "wasm32")]
    pub fn spawn_initialize(&self) {
        let cache = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            cache.initialize().await;
        });
    }

    /// Starts a refresh on the browser event loop. Failures are reported
    /// through status listeners.
    #[cfg(target_arch = "wasm32")]
    pub fn spawn_refresh(&self) {
        let cache = self.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = cache.refresh().await;
        });
    }
}

#[cfg(target_arch = "wasm32")]
impl CompatibilityCache<crate::fetch::WebSheetFetcher, crate::storage::LocalStorageStore> {
    /// Cache backed by `window.fetch` and `localStorage`.
    pub fn for_browser(config: CacheConfig) -> Self {
        let fetcher = crate::fetch::WebSheetFetcher::new(config.document_id.clone());
        Self::builder(fetcher, crate::storage::LocalStorageStore::new())
            .config(config)
            .build()
    }
}

#[cfg(not(target_arch = "wasm32"))]
impl CompatibilityCache<crate::fetch::HttpSheetFetcher, crate::storage::MemoryStore> {
    /// Cache backed by blocking HTTP and in-memory storage.
    pub fn for_native(config: CacheConfig) -> Self {
        let fetcher = crate::fetch::HttpSheetFetcher::new(config.document_id.clone());
        Self::builder(fetcher, crate::storage::MemoryStore::new())
            .config(config)
            .build()
    }
}
