//! Bridging-client contract for exchanging intents with the Valu host platform.
//!
//! The concrete client is an external collaborator. Everything the orchestration layer needs from
//! it is captured by [`ValuBridge`]: a connection flag, a one-shot readiness event, a repeating
//! route-change event, request/response intents, fire-and-forget intents, named API commands, and
//! an outbound route push.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use serde_json::Value;

use crate::files::RawFile;

/// Name of the event the client emits once its handshake with the host completes.
pub const API_READY_EVENT: &str = "api:ready";
/// Name of the event the client emits whenever the host pushes a new route.
pub const ROUTE_CHANGED_EVENT: &str = "on_route";

/// Object-safe boxed future used by [`ValuBridge`] async methods.
pub type BridgeFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Structured request addressed to one host application.
#[derive(Debug, Clone)]
pub struct Intent {
    /// Target application or service namespace (for example `ApplicationStorage`).
    pub app_id: String,
    /// Operation name; `None` asks the target to perform its default action.
    pub action: Option<String>,
    /// Parameter object.
    pub params: Value,
    /// Files forwarded with the request (upload intents only).
    pub attachments: Vec<RawFile>,
}

impl Intent {
    /// Creates an intent for `action` on `app_id` with no parameters.
    pub fn new(app_id: impl Into<String>, action: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            action: Some(action.into()),
            params: Value::Null,
            attachments: Vec::new(),
        }
    }

    /// Creates an intent that opens `app_id` with its default action.
    pub fn open(app_id: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            action: None,
            params: Value::Null,
            attachments: Vec::new(),
        }
    }

    /// Replaces the parameter object.
    pub fn with_params(mut self, params: Value) -> Self {
        self.params = params;
        self
    }

    /// Attaches files to forward with the request.
    pub fn with_attachments(mut self, attachments: Vec<RawFile>) -> Self {
        self.attachments = attachments;
        self
    }

    /// Returns `app_id/action` for diagnostics.
    pub fn label(&self) -> String {
        match &self.action {
            Some(action) => format!("{}/{action}", self.app_id),
            None => self.app_id.clone(),
        }
    }
}

/// Host service wrapping the external bridging client.
pub trait ValuBridge {
    /// Returns whether the handshake with the host has completed.
    fn is_connected(&self) -> bool;

    /// Registers a listener for the one-time readiness event.
    ///
    /// Listeners registered after readiness are never invoked; callers check
    /// [`ValuBridge::is_connected`] first.
    fn on_ready(&self, listener: Box<dyn FnOnce()>);

    /// Registers a listener for host-pushed route changes. The payload is the raw route string.
    fn on_route_changed(&self, listener: Box<dyn Fn(String)>);

    /// Sends a request intent to a host service and resolves with its raw response.
    fn call_service<'a>(&'a self, intent: Intent) -> BridgeFuture<'a, Result<Value, String>>;

    /// Sends a fire-and-forget intent (for example opening a chat channel).
    fn send_intent<'a>(&'a self, intent: Intent) -> BridgeFuture<'a, Result<(), String>>;

    /// Runs `command` on the named host API (for example `users` / `current`).
    fn run_api<'a>(
        &'a self,
        api: &'a str,
        command: &'a str,
        args: Option<Value>,
    ) -> BridgeFuture<'a, Result<Value, String>>;

    /// Asks the host to adopt `path` as the embedded application's route.
    fn push_route<'a>(&'a self, path: &'a str) -> BridgeFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// Bridge used when no host client exists; it never becomes ready.
pub struct NoopValuBridge;

fn unavailable() -> String {
    "valu bridge is unavailable on this target".to_string()
}

impl ValuBridge for NoopValuBridge {
    fn is_connected(&self) -> bool {
        false
    }

    fn on_ready(&self, _listener: Box<dyn FnOnce()>) {}

    fn on_route_changed(&self, _listener: Box<dyn Fn(String)>) {}

    fn call_service<'a>(&'a self, _intent: Intent) -> BridgeFuture<'a, Result<Value, String>> {
        Box::pin(async { Err(unavailable()) })
    }

    fn send_intent<'a>(&'a self, _intent: Intent) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async { Err(unavailable()) })
    }

    fn run_api<'a>(
        &'a self,
        _api: &'a str,
        _command: &'a str,
        _args: Option<Value>,
    ) -> BridgeFuture<'a, Result<Value, String>> {
        Box::pin(async { Err(unavailable()) })
    }

    fn push_route<'a>(&'a self, _path: &'a str) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async { Err(unavailable()) })
    }
}

/// One intent observed by [`MemoryValuBridge`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedIntent {
    /// `app_id/action` label.
    pub label: String,
    /// Parameter object.
    pub params: Value,
    /// Names of attached files.
    pub attachments: Vec<String>,
}

impl From<&Intent> for RecordedIntent {
    fn from(intent: &Intent) -> Self {
        Self {
            label: intent.label(),
            params: intent.params.clone(),
            attachments: intent.attachments.iter().map(|f| f.name.clone()).collect(),
        }
    }
}

type ServiceHandler = Rc<dyn Fn(&Intent) -> Result<Value, String>>;
type ApiHandler = Rc<dyn Fn(&str, &str, Option<&Value>) -> Result<Value, String>>;

#[derive(Default)]
struct MemoryBridgeState {
    connected: bool,
    ready_listeners: Vec<Box<dyn FnOnce()>>,
    route_listeners: Vec<Rc<dyn Fn(String)>>,
    service_handler: Option<ServiceHandler>,
    api_handler: Option<ApiHandler>,
    service_calls: Vec<RecordedIntent>,
    sent_intents: Vec<RecordedIntent>,
    api_calls: Vec<String>,
    pushed_routes: Vec<String>,
    reject_route_pushes: bool,
}

#[derive(Clone, Default)]
/// Scriptable in-process bridge. Clones share the same state.
///
/// Service and API responses come from handler closures; every request is recorded so callers
/// can assert on ordering and parameters.
pub struct MemoryValuBridge {
    inner: Rc<RefCell<MemoryBridgeState>>,
}

impl MemoryValuBridge {
    /// Creates a bridge that is already connected.
    pub fn connected() -> Self {
        let bridge = Self::default();
        bridge.inner.borrow_mut().connected = true;
        bridge
    }

    /// Completes the handshake and fires pending readiness listeners exactly once.
    pub fn connect(&self) {
        let listeners = {
            let mut state = self.inner.borrow_mut();
            if state.connected {
                return;
            }
            state.connected = true;
            std::mem::take(&mut state.ready_listeners)
        };
        for listener in listeners {
            listener();
        }
    }

    /// Delivers a host-originated route change to every route listener.
    pub fn emit_route(&self, raw_route: &str) {
        let listeners = self.inner.borrow().route_listeners.clone();
        for listener in listeners {
            listener(raw_route.to_string());
        }
    }

    /// Installs the handler answering [`ValuBridge::call_service`].
    pub fn set_service_handler(
        &self,
        handler: impl Fn(&Intent) -> Result<Value, String> + 'static,
    ) {
        self.inner.borrow_mut().service_handler = Some(Rc::new(handler));
    }

    /// Installs the handler answering [`ValuBridge::run_api`].
    pub fn set_api_handler(
        &self,
        handler: impl Fn(&str, &str, Option<&Value>) -> Result<Value, String> + 'static,
    ) {
        self.inner.borrow_mut().api_handler = Some(Rc::new(handler));
    }

    /// Makes subsequent route pushes fail.
    pub fn reject_route_pushes(&self, reject: bool) {
        self.inner.borrow_mut().reject_route_pushes = reject;
    }

    /// Returns the service intents issued so far.
    pub fn service_calls(&self) -> Vec<RecordedIntent> {
        self.inner.borrow().service_calls.clone()
    }

    /// Returns the fire-and-forget intents issued so far.
    pub fn sent_intents(&self) -> Vec<RecordedIntent> {
        self.inner.borrow().sent_intents.clone()
    }

    /// Returns `api/command` labels of API calls issued so far.
    pub fn api_calls(&self) -> Vec<String> {
        self.inner.borrow().api_calls.clone()
    }

    /// Returns the routes pushed to the host so far, rejected ones included.
    pub fn pushed_routes(&self) -> Vec<String> {
        self.inner.borrow().pushed_routes.clone()
    }

    /// Returns the number of readiness listeners still waiting.
    pub fn pending_ready_listeners(&self) -> usize {
        self.inner.borrow().ready_listeners.len()
    }

    /// Returns the number of registered route listeners.
    pub fn route_listener_count(&self) -> usize {
        self.inner.borrow().route_listeners.len()
    }
}

impl ValuBridge for MemoryValuBridge {
    fn is_connected(&self) -> bool {
        self.inner.borrow().connected
    }

    fn on_ready(&self, listener: Box<dyn FnOnce()>) {
        let mut state = self.inner.borrow_mut();
        if !state.connected {
            state.ready_listeners.push(listener);
        }
    }

    fn on_route_changed(&self, listener: Box<dyn Fn(String)>) {
        self.inner
            .borrow_mut()
            .route_listeners
            .push(Rc::from(listener));
    }

    fn call_service<'a>(&'a self, intent: Intent) -> BridgeFuture<'a, Result<Value, String>> {
        Box::pin(async move {
            let handler = {
                let mut state = self.inner.borrow_mut();
                state.service_calls.push(RecordedIntent::from(&intent));
                state.service_handler.clone()
            };
            match handler {
                Some(handler) => handler(&intent),
                None => Ok(Value::Null),
            }
        })
    }

    fn send_intent<'a>(&'a self, intent: Intent) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async move {
            self.inner
                .borrow_mut()
                .sent_intents
                .push(RecordedIntent::from(&intent));
            Ok(())
        })
    }

    fn run_api<'a>(
        &'a self,
        api: &'a str,
        command: &'a str,
        args: Option<Value>,
    ) -> BridgeFuture<'a, Result<Value, String>> {
        Box::pin(async move {
            let handler = {
                let mut state = self.inner.borrow_mut();
                state.api_calls.push(format!("{api}/{command}"));
                state.api_handler.clone()
            };
            match handler {
                Some(handler) => handler(api, command, args.as_ref()),
                None => Ok(Value::Null),
            }
        })
    }

    fn push_route<'a>(&'a self, path: &'a str) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            state.pushed_routes.push(path.to_string());
            if state.reject_route_pushes {
                Err(format!("host rejected route {path}"))
            } else {
                Ok(())
            }
        })
    }
}
