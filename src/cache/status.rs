//! Observable refresh status for the presentation layer.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Progress of the most recent refresh cycle.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RefreshStatus {
    /// No refresh has started yet.
    #[default]
    Idle,
    /// A refresh cycle is fetching sheets.
    Loading,
    /// The last cycle committed a new dataset.
    Success { fetched_at_ms: i64 },
    /// The last cycle failed; the message is suitable for a notification.
    Error(String),
}

impl RefreshStatus {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(usize);

/// Callback for status transitions.
pub type StatusCallback = Rc<dyn Fn(&RefreshStatus)>;

/// Current status plus the callbacks to notify on change.
#[derive(Default)]
pub(crate) struct StatusListeners {
    current: RefCell<RefreshStatus>,
    listeners: RefCell<Vec<(SubscriptionId, StatusCallback)>>,
    next_id: Cell<usize>,
}

impl StatusListeners {
    pub fn current(&self) -> RefreshStatus {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self, callback: StatusCallback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, callback));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(other, _)| *other != id);
        listeners.len() != before
    }

    /// Records a new status and notifies every listener.
    ///
    /// Listeners run after all borrows are released, so they may call back
    /// into the cache.
    pub fn emit(&self, status: RefreshStatus) {
        *self.current.borrow_mut() = status.clone();
        let listeners: Vec<StatusCallback> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        for listener in listeners {
            listener(&status);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_notifies_and_updates_current() {
        let listeners = StatusListeners::default();
        let seen = Rc::new(RefCell::new(Vec::new()));

        let sink = seen.clone();
        listeners.subscribe(Rc::new(move |s: &RefreshStatus| sink.borrow_mut().push(s.clone())));

        assert_eq!(listeners.current(), RefreshStatus::Idle);
        listeners.emit(RefreshStatus::Loading);
        listeners.emit(RefreshStatus::Error("boom".into()));

        assert_eq!(
            *seen.borrow(),
            vec![RefreshStatus::Loading, RefreshStatus::Error("boom".into())]
        );
        assert_eq!(listeners.current(), RefreshStatus::Error("boom".into()));
    }

    #[test]
    fn test_unsubscribe() {
        let listeners = StatusListeners::default();
        let count = Rc::new(Cell::new(0));

        let counter = count.clone();
        let id = listeners.subscribe(Rc::new(move |_: &RefreshStatus| counter.set(counter.get() + 1)));
        listeners.emit(RefreshStatus::Loading);

        assert!(listeners.unsubscribe(id));
        assert!(!listeners.unsubscribe(id));
        listeners.emit(RefreshStatus::Loading);
        assert_eq!(count.get(), 1);
    }
}
