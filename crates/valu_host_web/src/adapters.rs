use std::rc::Rc;

use leptos::logging;
use valu_host::{
    EmbeddingMode, HostServices, HostUiService, MemorySlotStore, NoopHostUi, NoopValuBridge,
    Sleeper, SlotStore, ValuBridge,
};

use crate::{bridge, WebHostUi, WebSleeper, WebSlotStore, WebValuBridge};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Compile-time selected host strategy for `valu_host_web` adapters.
pub enum HostStrategy {
    /// Browser-backed adapters talking to the page-global Valu client.
    Browser,
    /// In-memory adapters for running the front-end without a host page or storage.
    Stub,
}

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(feature = "host-stub")]
    {
        HostStrategy::Stub
    }

    #[cfg(not(feature = "host-stub"))]
    {
        HostStrategy::Browser
    }
}

/// Returns the selected host strategy as a stable string token.
pub fn host_strategy_name() -> &'static str {
    match selected_host_strategy() {
        HostStrategy::Browser => "browser",
        HostStrategy::Stub => "stub",
    }
}

/// Returns the slot store for the selected host strategy.
pub fn slot_store() -> Rc<dyn SlotStore> {
    match selected_host_strategy() {
        HostStrategy::Browser => Rc::new(WebSlotStore),
        HostStrategy::Stub => Rc::new(MemorySlotStore::default()),
    }
}

/// Returns the clipboard/alert service for the selected host strategy.
pub fn host_ui() -> Rc<dyn HostUiService> {
    match selected_host_strategy() {
        HostStrategy::Browser => Rc::new(WebHostUi),
        HostStrategy::Stub => Rc::new(NoopHostUi),
    }
}

/// Returns the timer used between remote polls.
pub fn sleeper() -> Rc<dyn Sleeper> {
    Rc::new(WebSleeper)
}

/// Detects whether the page runs inside a host frame.
pub fn embedding_mode() -> EmbeddingMode {
    if bridge::is_embedded() {
        EmbeddingMode::Embedded
    } else {
        EmbeddingMode::Standalone
    }
}

/// Constructs the bridging client for the selected strategy.
///
/// A page without the client bundle degrades to [`NoopValuBridge`], which keeps the front-end in
/// local mode for the whole session.
pub fn valu_bridge() -> Rc<dyn ValuBridge> {
    match selected_host_strategy() {
        HostStrategy::Browser => match WebValuBridge::acquire() {
            Ok(bridge) => Rc::new(bridge),
            Err(err) => {
                logging::error!("valu client unavailable, staying in local mode: {err}");
                Rc::new(NoopValuBridge)
            }
        },
        HostStrategy::Stub => Rc::new(NoopValuBridge),
    }
}

/// Assembles the host service bundle injected into `valu_runtime`.
pub fn build_host_services() -> HostServices {
    HostServices {
        bridge_factory: Rc::new(valu_bridge),
        slots: slot_store(),
        ui: host_ui(),
        sleeper: sleeper(),
        embedding: embedding_mode(),
    }
}
