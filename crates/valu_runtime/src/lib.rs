//! Orchestration layer of the Valu sample page.
//!
//! The runtime owns the bridging-client connection, the dual-mode storage workflows, route
//! ownership for standalone and embedded hosting, and the Leptos components rendering them.
//! Browser services arrive through [`valu_host::HostServices`], so everything except the
//! components runs and tests on the host target against in-memory services.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod components;
pub mod config;
pub mod connection;
pub mod model;
pub mod navigation;
mod runtime_context;
pub mod sample_calls;
pub mod storage;
pub mod user_info;

pub use components::{
    use_valu_runtime, ConsolePanel, DocumentationPanel, SampleApiCalls, StoragePanel, TopBar,
    ValuProvider, ValuRuntimeContext, ValuShell,
};
pub use config::{AppConfig, SettlePolicy, StorageConfig};
pub use connection::{ConnectionProvider, Readiness};
pub use model::{
    format_file_size, Destination, FileKind, StorageMode, StorageViewState, UserInfo,
};
pub use navigation::{normalize_route, NavigationCoordinator, PendingPush};
pub use sample_calls::{open_current_user_chat, open_video_chat, SampleCallError};
pub use storage::{
    ClipboardError, LocalFallbackStore, RemoteResourceClient, StorageError, StorageManager,
};
pub use user_info::{fetch_current_user, CurrentUser, UserInfoLoader};
