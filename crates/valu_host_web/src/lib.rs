//! Browser (`wasm32`) implementations of [`valu_host`] service contracts.
//!
//! This crate is the concrete browser-side wiring layer for the Valu bridging client, the
//! `localStorage` slot store, clipboard/alert capabilities, timers, and picked/dropped files.
//! Every adapter compiles on non-wasm targets to an inert fallback so the workspace builds and
//! tests on the host.
//!
//! The bridging client is expected on the page as the global `ValuApi` constructor (and `Intent`
//! class) from the `@arkeytyp/valu-api` bundle. The client instance is kept in the well-known
//! `globalThis.valuApi` slot.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and concrete adapter factories for runtime wiring.
pub mod adapters;
mod bridge;
pub mod files;
pub mod storage;
pub mod ui;
pub mod valu_client;

pub use adapters::{
    build_host_services, embedding_mode, host_strategy_name, host_ui, selected_host_strategy,
    sleeper, slot_store, valu_bridge, HostStrategy,
};
#[cfg(target_arch = "wasm32")]
pub use files::{raw_files_from_list, BrowserFile};
pub use storage::local_slots::WebSlotStore;
pub use ui::{WebHostUi, WebSleeper};
pub use valu_client::WebValuBridge;
