//! Wall-clock time and timers.

use futures_util::future::LocalBoxFuture;
use futures_util::FutureExt;

/// Source of wall-clock time and async sleeps.
pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;

    /// Resolves after `ms` milliseconds.
    fn sleep_ms(&self, ms: u32) -> LocalBoxFuture<'static, ()>;
}

/// The real clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        web_time::SystemTime::now()
            .duration_since(web_time::SystemTime::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }

    fn sleep_ms(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        sleep_ms(ms).boxed_local()
    }
}

#[cfg(target_arch = "wasm32")]
mod timer {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_name = setTimeout)]
        fn set_timeout(closure: &Closure<dyn FnMut()>, millis: u32) -> i32;

        #[wasm_bindgen(js_name = clearTimeout)]
        fn clear_timeout(handle: i32);
    }

    /// A scheduled `setTimeout`. Dropping it clears the timer before the
    /// callback is released, so a cancelled sleep never fires into a
    /// dropped closure.
    pub(super) struct Timeout {
        handle: i32,
        _callback: Closure<dyn FnMut()>,
    }

    impl Timeout {
        pub(super) fn schedule(ms: u32, on_fire: impl FnOnce() + 'static) -> Self {
            let callback: Closure<dyn FnMut()> = Closure::once(on_fire);
            let handle = set_timeout(&callback, ms);
            Self {
                handle,
                _callback: callback,
            }
        }
    }

    impl Drop for Timeout {
        fn drop(&mut self) {
            clear_timeout(self.handle);
        }
    }
}

#[cfg(target_arch = "wasm32")]
async fn sleep_ms(ms: u32) {
    let (tx, rx) = futures_channel::oneshot::channel::<()>();
    let _timeout = timer::Timeout::schedule(ms, move || {
        let _ = tx.send(());
    });
    let _ = rx.await;
}

#[cfg(not(target_arch = "wasm32"))]
async fn sleep_ms(ms: u32) {
    let (tx, rx) = futures_channel::oneshot::channel::<()>();
    std::thread::spawn(move || {
        std::thread::sleep(std::time::Duration::from_millis(ms as u64));
        let _ = tx.send(());
    });
    let _ = rx.await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_2020() {
        assert!(SystemClock.now_ms() > 1_577_836_800_000);
    }

    #[test]
    fn test_native_sleep_resolves() {
        pollster::block_on(SystemClock.sleep_ms(1));
    }
}
