//! Typed host-domain contracts and shared models for the Valu sample front-end.
//!
//! This crate is the API-first boundary between the orchestration layer and the host platform.
//! It exposes the bridging-client seam ([`ValuBridge`]), the persisted slot seam ([`SlotStore`]),
//! browser UI capabilities ([`HostUiService`]), timers ([`Sleeper`]), and the file models shared by
//! the storage workflows. Concrete browser adapters live in `valu_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod bridge;
pub mod files;
pub mod host;
pub mod storage;
pub mod time;

pub use bridge::{
    BridgeFuture, Intent, MemoryValuBridge, NoopValuBridge, RecordedIntent, ValuBridge,
    API_READY_EVENT, ROUTE_CHANGED_EVENT,
};
pub use files::{
    encode_data_url, FileReadFuture, FileRecord, FileSource, MemoryFile, RawFile,
    DEFAULT_MIME_TYPE,
};
pub use host::{
    EmbeddingMode, HostServices, HostUiFuture, HostUiService, MemoryHostUi, NoopHostUi,
};
pub use storage::slot::{MemorySlotStore, SlotStore, SlotStoreFuture};
pub use time::{
    next_monotonic_timestamp_ms, unix_time_ms_now, ImmediateSleeper, Sleeper, SleeperFuture,
};
