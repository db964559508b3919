//! Sheet download layer.
//!
//! A `SheetFetcher` turns a tab selector into the raw CSV text of that tab.
//! Implementations perform a single GET and never retry; retry policy
//! belongs to the caller.
//!
//! On WASM targets `WebSheetFetcher` uses the browser's `fetch`. On native
//! targets `HttpSheetFetcher` runs a blocking request on a helper thread.

#[cfg(not(target_arch = "wasm32"))]
mod native;
#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(not(target_arch = "wasm32"))]
pub use native::HttpSheetFetcher;
#[cfg(target_arch = "wasm32")]
pub use web::WebSheetFetcher;

use std::future::Future;

/// Content type requested from the export endpoint.
pub(crate) const ACCEPT_CSV: &str = "text/csv";

/// Errors that can occur while downloading a sheet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The server answered with a non-success status code.
    Status(u16),
    /// The request never produced a response (network, CORS, decoding).
    Transport(String),
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Status(code) => write!(f, "Sheet request failed with HTTP {}", code),
            FetchError::Transport(msg) => write!(f, "Sheet request failed: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

/// Downloads the raw delimited text of one spreadsheet tab.
///
/// Like the storage traits, this does not require `Send` since WASM is
/// single-threaded and JS futures cannot cross threads.
pub trait SheetFetcher {
    fn fetch(&self, selector: &str) -> impl Future<Output = Result<String, FetchError>>;
}

/// Returns `Ok(())` for 2xx status codes.
pub(crate) fn check_status(status: u16) -> Result<(), FetchError> {
    if (200..300).contains(&status) {
        Ok(())
    } else {
        Err(FetchError::Status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status() {
        assert!(check_status(200).is_ok());
        assert!(check_status(204).is_ok());
        assert_eq!(check_status(302), Err(FetchError::Status(302)));
        assert_eq!(check_status(404), Err(FetchError::Status(404)));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FetchError::Status(500).to_string(),
            "Sheet request failed with HTTP 500"
        );
        assert_eq!(
            FetchError::Transport("offline".into()).to_string(),
            "Sheet request failed: offline"
        );
    }
}
