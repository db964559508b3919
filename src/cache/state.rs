//! Mutable cache state.

use crate::table::Dataset;
use std::rc::Rc;

/// Everything the refresh cycle mutates.
///
/// `dataset` and `fetched_at_ms` are only ever assigned together.
#[derive(Debug, Default)]
pub(crate) struct CacheState {
    pub dataset: Option<Rc<Dataset>>,
    pub fetched_at_ms: Option<i64>,
    /// An initialization pass has been started.
    pub init_started: bool,
    /// The first best-effort load (from storage or network) has finished.
    pub initialized: bool,
    /// Number of refresh cycles currently running.
    pub refreshes_in_flight: u32,
}

impl CacheState {
    pub fn commit(&mut self, dataset: impl Into<Rc<Dataset>>, fetched_at_ms: i64) {
        self.dataset = Some(dataset.into());
        self.fetched_at_ms = Some(fetched_at_ms);
    }

    pub fn is_expired(&self, now_ms: i64, window_ms: i64) -> bool {
        match self.fetched_at_ms {
            Some(fetched) => now_ms.saturating_sub(fetched) > window_ms,
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expiry_boundary() {
        let mut state = CacheState::default();
        assert!(state.is_expired(0, 1000));

        state.commit(Dataset::new(), 5000);
        assert!(!state.is_expired(5000, 1000));
        assert!(!state.is_expired(6000, 1000));
        assert!(state.is_expired(6001, 1000));
    }
}
