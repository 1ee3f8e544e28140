//! [`ValuBridge`] adapter for the page-global Valu bridging client.

use leptos::logging;
use serde_json::Value;
use valu_host::{BridgeFuture, Intent, ValuBridge, API_READY_EVENT, ROUTE_CHANGED_EVENT};

use crate::bridge;

#[derive(Debug, Clone, Copy, Default)]
/// Bridge adapter delegating to the client stored in `globalThis.valuApi`.
pub struct WebValuBridge;

impl WebValuBridge {
    /// Constructs the page-global client if no one has yet, then returns the adapter.
    ///
    /// # Errors
    ///
    /// Returns an error when the client bundle is missing or the target is not `wasm32`.
    pub fn acquire() -> Result<Self, String> {
        bridge::init_client()?;
        Ok(Self)
    }
}

impl ValuBridge for WebValuBridge {
    fn is_connected(&self) -> bool {
        bridge::is_connected()
    }

    fn on_ready(&self, listener: Box<dyn FnOnce()>) {
        if let Err(err) = bridge::on_ready(listener, API_READY_EVENT) {
            logging::warn!("valu ready subscription failed: {err}");
        }
    }

    fn on_route_changed(&self, listener: Box<dyn Fn(String)>) {
        if let Err(err) = bridge::on_route(listener, ROUTE_CHANGED_EVENT) {
            logging::warn!("valu route subscription failed: {err}");
        }
    }

    fn call_service<'a>(&'a self, intent: Intent) -> BridgeFuture<'a, Result<Value, String>> {
        Box::pin(async move {
            bridge::call_service(
                &intent.app_id,
                intent.action.clone(),
                &intent.params,
                &intent.attachments,
            )
            .await
        })
    }

    fn send_intent<'a>(&'a self, intent: Intent) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async move {
            bridge::send_intent(&intent.app_id, intent.action.clone(), &intent.params).await
        })
    }

    fn run_api<'a>(
        &'a self,
        api: &'a str,
        command: &'a str,
        args: Option<Value>,
    ) -> BridgeFuture<'a, Result<Value, String>> {
        Box::pin(async move { bridge::run_api(api, command, args.as_ref()).await })
    }

    fn push_route<'a>(&'a self, path: &'a str) -> BridgeFuture<'a, Result<(), String>> {
        Box::pin(async move { bridge::push_route(path).await })
    }
}
