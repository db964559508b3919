//! JavaScript entry points for the page-integration layer.
//!
//! The userscript glue calls `createCompatCache` once per page and keeps the
//! returned handle for every lookup.

use crate::cache::CompatibilityCache;
use crate::config::CacheConfig;
use crate::fetch::WebSheetFetcher;
use crate::sheets::SHEETS;
use crate::storage::LocalStorageStore;
use serde::Serialize;
use wasm_bindgen::prelude::*;

type BrowserCache = CompatibilityCache<WebSheetFetcher, LocalStorageStore>;

/// Sheet metadata as seen from JavaScript.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SheetInfo {
    version_label: &'static str,
    selector: &'static str,
    note: Option<&'static str>,
}

/// Handle to the page's compatibility cache.
#[wasm_bindgen]
pub struct CompatCache {
    cache: BrowserCache,
}

/// Builds the cache and starts initializing it in the background.
///
/// `config_json` may override any subset of the configuration.
#[wasm_bindgen(js_name = createCompatCache)]
pub fn create_compat_cache(config_json: Option<String>) -> Result<CompatCache, JsValue> {
    console_log::init_with_level(log::Level::Info).ok();

    let config = match config_json {
        Some(json) => CacheConfig::from_json(&json)
            .map_err(|e| JsValue::from_str(&format!("Invalid config: {}", e)))?,
        None => CacheConfig::default(),
    };

    let cache = BrowserCache::for_browser(config);
    cache.spawn_initialize();
    Ok(CompatCache { cache })
}

#[wasm_bindgen]
impl CompatCache {
    #[wasm_bindgen(getter)]
    pub fn initialized(&self) -> bool {
        self.cache.is_initialized()
    }

    #[wasm_bindgen(js_name = isExpired)]
    pub fn is_expired(&self) -> bool {
        self.cache.is_expired()
    }

    #[wasm_bindgen(js_name = getLastUpdated)]
    pub fn get_last_updated(&self) -> String {
        self.cache.get_last_updated()
    }

    /// `{ status, notes }`, or `null` when the sheet is not loaded.
    #[wasm_bindgen(js_name = getModInfo)]
    pub fn get_mod_info(&self, key: &str, selector: &str) -> Result<JsValue, JsValue> {
        match self.cache.get_mod_info(key, selector) {
            Some(record) => to_js(&record),
            None => Ok(JsValue::NULL),
        }
    }

    /// Per-status counts for a list of workshop ids, or `null`.
    #[wasm_bindgen(js_name = summarize)]
    pub fn summarize(&self, keys: Vec<String>, selector: &str) -> Result<JsValue, JsValue> {
        let summary = self
            .cache
            .summarize(keys.iter().map(String::as_str), selector);
        match summary {
            Some(summary) => {
                let counts: Vec<(&str, usize)> =
                    summary.iter().map(|(s, n)| (s.as_str(), n)).collect();
                to_js(&counts)
            }
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = rowLink)]
    pub fn row_link(&self, key: &str, selector: &str) -> Option<String> {
        self.cache.row_link(key, selector)
    }

    /// Resolves when the refresh finishes; rejects with the error message.
    pub fn refresh(&self) -> js_sys::Promise {
        let cache = self.cache.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            cache
                .refresh()
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    /// Resolves once initialized; rejects after the readiness timeout.
    #[wasm_bindgen(js_name = waitReady)]
    pub fn wait_ready(&self) -> js_sys::Promise {
        let cache = self.cache.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            cache
                .wait_ready()
                .await
                .map(|()| JsValue::TRUE)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }

    /// Calls `callback` with the status name and an optional message.
    #[wasm_bindgen(js_name = onStatus)]
    pub fn on_status(&self, callback: js_sys::Function) {
        use crate::cache::RefreshStatus;

        self.cache.subscribe(move |status: &RefreshStatus| {
            let (name, detail) = match status {
                RefreshStatus::Idle => ("idle", JsValue::UNDEFINED),
                RefreshStatus::Loading => ("loading", JsValue::UNDEFINED),
                RefreshStatus::Success { .. } => ("success", JsValue::UNDEFINED),
                RefreshStatus::Error(msg) => ("error", JsValue::from_str(msg)),
            };
            if let Err(e) = callback.call2(&JsValue::NULL, &JsValue::from_str(name), &detail) {
                log::warn!("Status callback threw: {:?}", e);
            }
        });
    }

    /// Bulk access to the whole dataset (selector → rows).
    pub fn data(&self) -> Result<JsValue, JsValue> {
        match self.cache.data() {
            Some(dataset) => to_js(dataset.as_ref()),
            None => Ok(JsValue::NULL),
        }
    }

    /// Drops the persisted copy so the next page load fetches again.
    #[wasm_bindgen(js_name = clearPersisted)]
    pub fn clear_persisted(&self) -> js_sys::Promise {
        let cache = self.cache.clone();
        wasm_bindgen_futures::future_to_promise(async move {
            cache
                .clear_persisted()
                .await
                .map(|()| JsValue::UNDEFINED)
                .map_err(|e| JsValue::from_str(&e.to_string()))
        })
    }
}

/// Configured sheets, newest first.
#[wasm_bindgen(js_name = compatSheets)]
pub fn compat_sheets() -> Result<JsValue, JsValue> {
    let sheets: Vec<SheetInfo> = SHEETS
        .iter()
        .map(|s| SheetInfo {
            version_label: s.version_label,
            selector: s.selector,
            note: s.note,
        })
        .collect();
    to_js(&sheets)
}

/// Serializes to plain JS objects (not `Map`s) so the glue can index them.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(JsValue::from)
}
