//! Time and timer helpers shared across host contracts and adapters.

use std::{cell::Cell, future::Future, pin::Pin};
#[cfg(not(target_arch = "wasm32"))]
use std::time::{SystemTime, UNIX_EPOCH};

thread_local! {
    static LAST_ISSUED_TIMESTAMP_MS: Cell<u64> = const { Cell::new(0) };
}

/// Returns the current unix timestamp in milliseconds.
pub fn unix_time_ms_now() -> u64 {
    #[cfg(target_arch = "wasm32")]
    {
        js_sys::Date::now().max(0.0) as u64
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Returns a unix millisecond timestamp that never repeats within the current process.
pub fn next_monotonic_timestamp_ms() -> u64 {
    let now = unix_time_ms_now();
    LAST_ISSUED_TIMESTAMP_MS.with(|last| {
        let next = now.max(last.get().saturating_add(1));
        last.set(next);
        next
    })
}

/// Object-safe boxed future used by [`Sleeper`].
pub type SleeperFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a>>;

/// Timer seam used by workflows that must wait between remote polls.
pub trait Sleeper {
    /// Resolves after roughly `delay_ms` milliseconds.
    fn sleep<'a>(&'a self, delay_ms: u32) -> SleeperFuture<'a>;
}

#[derive(Debug, Clone, Default)]
/// Sleeper that resolves immediately and records every requested delay.
pub struct ImmediateSleeper {
    requested: std::rc::Rc<std::cell::RefCell<Vec<u32>>>,
}

impl ImmediateSleeper {
    /// Returns the delays requested so far, in order.
    pub fn requested(&self) -> Vec<u32> {
        self.requested.borrow().clone()
    }
}

impl Sleeper for ImmediateSleeper {
    fn sleep<'a>(&'a self, delay_ms: u32) -> SleeperFuture<'a> {
        self.requested.borrow_mut().push(delay_ms);
        Box::pin(async {})
    }
}
