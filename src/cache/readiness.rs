//! One-shot readiness signal with a bounded wait.

use crate::clock::Clock;
use futures_channel::oneshot;
use futures_util::future::{select, Either};
use std::cell::{Cell, RefCell};

/// Returned when the cache did not become ready in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessError {
    TimedOut { waited_ms: u32 },
}

impl std::fmt::Display for ReadinessError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadinessError::TimedOut { waited_ms } => {
                write!(f, "Compatibility data not ready after {} ms", waited_ms)
            }
        }
    }
}

impl std::error::Error for ReadinessError {}

/// Flips to ready once and wakes everyone waiting on it.
#[derive(Default)]
pub(crate) struct Readiness {
    ready: Cell<bool>,
    waiters: RefCell<Vec<oneshot::Sender<()>>>,
}

impl Readiness {
    pub fn is_ready(&self) -> bool {
        self.ready.get()
    }

    pub fn mark_ready(&self) {
        self.ready.set(true);
        for waiter in self.waiters.borrow_mut().drain(..) {
            let _ = waiter.send(());
        }
    }

    /// Waits until ready, or fails after `timeout_ms`.
    pub async fn wait(&self, clock: &dyn Clock, timeout_ms: u32) -> Result<(), ReadinessError> {
        if self.is_ready() {
            return Ok(());
        }

        let (tx, rx) = oneshot::channel();
        {
            let mut waiters = self.waiters.borrow_mut();
            waiters.retain(|waiter| !waiter.is_canceled());
            waiters.push(tx);
        }

        let woken = matches!(
            select(rx, clock.sleep_ms(timeout_ms)).await,
            Either::Left((Ok(()), _))
        );

        // Our receiver is gone by now; drop its sender too.
        self.waiters
            .borrow_mut()
            .retain(|waiter| !waiter.is_canceled());

        if woken || self.is_ready() {
            Ok(())
        } else {
            Err(ReadinessError::TimedOut {
                waited_ms: timeout_ms,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures_util::future::{self, join, FutureExt, LocalBoxFuture};
    use pollster::block_on;
    use std::rc::Rc;

    /// Sleeps that either finish at once or never, and record cancellation.
    #[derive(Default)]
    struct TestClock {
        never_fires: bool,
        cancelled: Rc<Cell<u32>>,
    }

    struct CancelFlag(Rc<Cell<u32>>);

    impl Drop for CancelFlag {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    impl Clock for TestClock {
        fn now_ms(&self) -> i64 {
            0
        }

        fn sleep_ms(&self, _ms: u32) -> LocalBoxFuture<'static, ()> {
            if !self.never_fires {
                return future::ready(()).boxed_local();
            }
            let flag = CancelFlag(self.cancelled.clone());
            async move {
                let _flag = flag;
                future::pending::<()>().await
            }
            .boxed_local()
        }
    }

    #[test]
    fn test_ready_signal_cancels_pending_timer() {
        let readiness = Readiness::default();
        let clock = TestClock {
            never_fires: true,
            ..TestClock::default()
        };

        let mark = async {
            readiness.mark_ready();
        };
        let (result, ()) = block_on(join(readiness.wait(&clock, 5000), mark));

        assert_eq!(result, Ok(()));
        assert_eq!(clock.cancelled.get(), 1);
    }

    #[test]
    fn test_timed_out_waits_do_not_accumulate() {
        let readiness = Readiness::default();
        let clock = TestClock::default();

        for _ in 0..1000 {
            assert_eq!(
                block_on(readiness.wait(&clock, 10)),
                Err(ReadinessError::TimedOut { waited_ms: 10 })
            );
        }
        assert!(readiness.waiters.borrow().is_empty());
    }

    #[test]
    fn test_wait_after_ready_returns_immediately() {
        let readiness = Readiness::default();
        readiness.mark_ready();
        let clock = TestClock {
            never_fires: true,
            ..TestClock::default()
        };

        assert_eq!(block_on(readiness.wait(&clock, 5000)), Ok(()));
        assert_eq!(clock.cancelled.get(), 0);
    }
}
