//! Route ownership in standalone and embedded modes.
//!
//! Standalone pages own their address bar and delegate to the client-side router. Embedded pages
//! keep the route in memory; the host drives it through route-change events and is told about
//! local navigation through a fire-and-forget route push.

use std::{
    cell::{Cell, RefCell},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use leptos::logging;
use valu_host::EmbeddingMode;

use crate::{connection::ConnectionProvider, model::Destination};

/// Route push to spawn after an optimistic embedded navigation.
pub type PendingPush = Pin<Box<dyn Future<Output = ()>>>;

type RouteListener = Rc<dyn Fn(&str)>;

/// Normalizes a host-supplied route: empty or `/` becomes `/console`, and a leading `/` is added
/// when missing.
pub fn normalize_route(raw: &str) -> String {
    let route = raw.trim();
    if route.is_empty() || route == "/" {
        Destination::Console.path().to_string()
    } else if route.starts_with('/') {
        route.to_string()
    } else {
        format!("/{route}")
    }
}

enum Authority {
    Router(RouteListener),
    Host(ConnectionProvider),
}

#[derive(Clone)]
/// Current route plus the policy deciding who owns it.
pub struct NavigationCoordinator {
    authority: Rc<Authority>,
    current: Rc<RefCell<String>>,
    listeners: Rc<RefCell<Vec<RouteListener>>>,
    inbound_installed: Rc<Cell<bool>>,
}

impl NavigationCoordinator {
    /// Creates a coordinator for a page that owns its address bar. `router` performs navigation.
    pub fn standalone(initial_route: &str, router: impl Fn(&str) + 'static) -> Self {
        Self::with_authority(Authority::Router(Rc::new(router)), initial_route)
    }

    /// Creates a coordinator for a page embedded in the host, starting at `/console`.
    pub fn embedded(connection: ConnectionProvider) -> Self {
        Self::with_authority(Authority::Host(connection), "")
    }

    fn with_authority(authority: Authority, initial_route: &str) -> Self {
        Self {
            authority: Rc::new(authority),
            current: Rc::new(RefCell::new(normalize_route(initial_route))),
            listeners: Rc::new(RefCell::new(Vec::new())),
            inbound_installed: Rc::new(Cell::new(false)),
        }
    }

    /// Returns which mode this coordinator was built for.
    pub fn mode(&self) -> EmbeddingMode {
        match *self.authority {
            Authority::Router(_) => EmbeddingMode::Standalone,
            Authority::Host(_) => EmbeddingMode::Embedded,
        }
    }

    /// Returns the current normalized route.
    pub fn current_route(&self) -> String {
        self.current.borrow().clone()
    }

    /// Returns the destination rendered for the current route.
    pub fn destination(&self) -> Destination {
        Destination::from_route(&self.current.borrow())
    }

    /// Registers a callback invoked with every new route.
    pub fn subscribe(&self, listener: impl Fn(&str) + 'static) {
        self.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Subscribes to host route-change events. Only embedded coordinators subscribe, and only
    /// once; returns whether this call installed the subscription.
    pub fn install_inbound(&self) -> bool {
        let Authority::Host(connection) = &*self.authority else {
            return false;
        };
        if self.inbound_installed.replace(true) {
            return false;
        }
        let this = self.clone();
        connection
            .acquire()
            .on_route_changed(Box::new(move |raw| this.apply_route(&raw)));
        true
    }

    /// Records a route observed from outside, such as the standalone router's location.
    pub fn sync_location(&self, path: &str) {
        self.apply_route(path);
    }

    /// Navigates to `path`.
    ///
    /// Standalone coordinators hand the path to the router. Embedded coordinators update the
    /// current route immediately and return the host push to spawn; a failed push is logged and
    /// the optimistic route stays.
    pub fn navigate(&self, path: &str) -> Option<PendingPush> {
        match &*self.authority {
            Authority::Router(router) => {
                router(path);
                self.apply_route(path);
                None
            }
            Authority::Host(connection) => {
                let route = normalize_route(path);
                self.apply_route(&route);
                let bridge = connection.acquire();
                Some(Box::pin(async move {
                    if let Err(err) = bridge.push_route(&route).await {
                        logging::warn!("host did not accept route {route}: {err}");
                    }
                }))
            }
        }
    }

    fn apply_route(&self, raw: &str) {
        let route = normalize_route(raw);
        *self.current.borrow_mut() = route.clone();
        let listeners = self.listeners.borrow().clone();
        for listener in listeners {
            listener(&route);
        }
    }
}
