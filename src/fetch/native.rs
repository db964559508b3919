//! Native implementation of the sheet downloader.
//!
//! `ureq` is blocking, so each request runs on its own thread and the result
//! is handed back through a oneshot channel. This keeps `fetch` usable from
//! any executor.

use super::{check_status, FetchError, SheetFetcher, ACCEPT_CSV};
use crate::sheets::export_url;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Downloads sheets over HTTPS with `ureq`.
#[derive(Clone)]
pub struct HttpSheetFetcher {
    document_id: String,
    agent: ureq::Agent,
}

impl HttpSheetFetcher {
    pub fn new(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
        }
    }
}

impl SheetFetcher for HttpSheetFetcher {
    async fn fetch(&self, selector: &str) -> Result<String, FetchError> {
        let url = export_url(&self.document_id, selector);
        let agent = self.agent.clone();
        let (tx, rx) = futures_channel::oneshot::channel();

        std::thread::spawn(move || {
            let _ = tx.send(blocking_get(&agent, &url));
        });

        let body = rx
            .await
            .map_err(|_| FetchError::Transport("Request thread exited".to_string()))??;

        log::debug!("Fetched sheet {} ({} bytes)", selector, body.len());
        Ok(body)
    }
}

fn blocking_get(agent: &ureq::Agent, url: &str) -> Result<String, FetchError> {
    let response = match agent.get(url).set("Accept", ACCEPT_CSV).call() {
        Ok(response) => response,
        Err(ureq::Error::Status(code, _)) => return Err(FetchError::Status(code)),
        Err(ureq::Error::Transport(t)) => return Err(FetchError::Transport(t.to_string())),
    };

    check_status(response.status())?;

    response
        .into_string()
        .map_err(|e| FetchError::Transport(e.to_string()))
}
