//! Process-wide access to the bridging client and its readiness signal.
//!
//! The provider is constructed once by the entry layer and shared by injection. The client
//! handle itself is created lazily on first [`ConnectionProvider::acquire`] and memoized behind a
//! single-initialization cell, so every consumer observes the same instance.

use std::{cell::OnceCell, rc::Rc};

use futures::channel::oneshot;
use valu_host::ValuBridge;

/// How a readiness callback was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// The client was already connected; the callback ran before `when_ready` returned.
    Immediate,
    /// The callback is registered for the one-time readiness event.
    Deferred,
}

type BridgeFactory = Rc<dyn Fn() -> Rc<dyn ValuBridge>>;

#[derive(Clone)]
/// Lazily constructed, memoized handle to the bridging client.
pub struct ConnectionProvider {
    factory: BridgeFactory,
    handle: Rc<OnceCell<Rc<dyn ValuBridge>>>,
}

impl ConnectionProvider {
    /// Creates a provider that builds the client with `factory` on first use.
    pub fn new(factory: BridgeFactory) -> Self {
        Self {
            factory,
            handle: Rc::new(OnceCell::new()),
        }
    }

    /// Creates a provider around an existing client.
    pub fn from_bridge(bridge: Rc<dyn ValuBridge>) -> Self {
        let provider = Self::new(Rc::new(|| -> Rc<dyn ValuBridge> {
            Rc::new(valu_host::NoopValuBridge)
        }));
        let _ = provider.handle.set(bridge);
        provider
    }

    /// Returns the client, constructing it on the first call.
    pub fn acquire(&self) -> Rc<dyn ValuBridge> {
        self.handle.get_or_init(|| (self.factory)()).clone()
    }

    /// Returns whether the client reports a completed handshake right now.
    pub fn is_ready(&self) -> bool {
        self.acquire().is_connected()
    }

    /// Runs `callback` once the client is connected.
    ///
    /// A connected client invokes the callback synchronously. Otherwise it is registered for the
    /// readiness event and runs exactly once when that fires. There is no timeout: a handshake that
    /// never completes leaves the callback pending.
    pub fn when_ready(&self, callback: impl FnOnce(Rc<dyn ValuBridge>) + 'static) -> Readiness {
        let bridge = self.acquire();
        if bridge.is_connected() {
            callback(bridge);
            return Readiness::Immediate;
        }
        let notify = bridge.clone();
        bridge.on_ready(Box::new(move || callback(notify)));
        Readiness::Deferred
    }

    /// Resolves with the client once it is connected.
    pub async fn ready(&self) -> Rc<dyn ValuBridge> {
        let (tx, rx) = oneshot::channel();
        self.when_ready(move |bridge| {
            let _ = tx.send(bridge);
        });
        match rx.await {
            Ok(bridge) => bridge,
            // The client dropped the listener without firing it.
            Err(oneshot::Canceled) => futures::future::pending().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use futures::{executor::block_on, FutureExt};
    use valu_host::MemoryValuBridge;

    use super::*;

    #[test]
    fn acquire_constructs_client_once() {
        let constructed = Rc::new(Cell::new(0));
        let counter = constructed.clone();
        let provider = ConnectionProvider::new(Rc::new(move || -> Rc<dyn ValuBridge> {
            counter.set(counter.get() + 1);
            Rc::new(MemoryValuBridge::default())
        }));

        let first = provider.acquire();
        let second = provider.clone().acquire();
        assert_eq!(constructed.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn connected_client_notifies_synchronously() {
        let provider = ConnectionProvider::from_bridge(Rc::new(MemoryValuBridge::connected()));
        let fired = Rc::new(Cell::new(false));
        let flag = fired.clone();
        assert_eq!(
            provider.when_ready(move |_| flag.set(true)),
            Readiness::Immediate
        );
        assert!(fired.get());
    }

    #[test]
    fn pending_client_notifies_once_on_ready_event() {
        let bridge = MemoryValuBridge::default();
        let provider = ConnectionProvider::from_bridge(Rc::new(bridge.clone()));
        let fired = Rc::new(Cell::new(0));
        let counter = fired.clone();

        assert_eq!(
            provider.when_ready(move |_| counter.set(counter.get() + 1)),
            Readiness::Deferred
        );
        assert_eq!(fired.get(), 0);
        bridge.connect();
        bridge.connect();
        assert_eq!(fired.get(), 1);
        assert!(provider.is_ready());
    }

    #[test]
    fn ready_future_resolves_after_handshake() {
        let bridge = MemoryValuBridge::default();
        let provider = ConnectionProvider::from_bridge(Rc::new(bridge.clone()));
        let mut waiting = Box::pin(provider.ready());
        assert!(waiting.as_mut().now_or_never().is_none());

        bridge.connect();
        let ready = block_on(waiting);
        assert!(ready.is_connected());
    }

    #[test]
    fn missing_handshake_waits_indefinitely() {
        let provider = ConnectionProvider::from_bridge(Rc::new(valu_host::NoopValuBridge));
        assert!(provider.ready().now_or_never().is_none());
    }
}
