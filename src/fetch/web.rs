//! Browser `fetch` implementation of the sheet downloader.

use super::{check_status, FetchError, SheetFetcher, ACCEPT_CSV};
use crate::sheets::export_url;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

/// Downloads sheets with a cross-origin `window.fetch`.
#[derive(Debug, Clone)]
pub struct WebSheetFetcher {
    document_id: String,
}

impl WebSheetFetcher {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
        }
    }
}

impl SheetFetcher for WebSheetFetcher {
    async fn fetch(&self, selector: &str) -> Result<String, FetchError> {
        let url = export_url(&self.document_id, selector);

        let init = RequestInit::new();
        init.set_method("GET");
        init.set_mode(RequestMode::Cors);

        let request = Request::new_with_str_and_init(&url, &init).map_err(js_transport)?;
        request
            .headers()
            .set("Accept", ACCEPT_CSV)
            .map_err(js_transport)?;

        let window = web_sys::window()
            .ok_or_else(|| FetchError::Transport("No window object".to_string()))?;

        let response: Response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_transport)?
            .dyn_into()
            .map_err(|_| FetchError::Transport("Expected a Response".to_string()))?;

        check_status(response.status())?;

        let text = JsFuture::from(response.text().map_err(js_transport)?)
            .await
            .map_err(js_transport)?;

        let body = text
            .as_string()
            .ok_or_else(|| FetchError::Transport("Response body was not text".to_string()))?;

        log::debug!("Fetched sheet {} ({} bytes)", selector, body.len());
        Ok(body)
    }
}

fn js_transport(e: JsValue) -> FetchError {
    FetchError::Transport(format!("{:?}", e))
}
