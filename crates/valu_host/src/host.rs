//! Host-bundle and browser capability models for runtime composition.

use std::{cell::RefCell, future::Future, pin::Pin, rc::Rc};

use crate::{Sleeper, SlotStore, ValuBridge};

/// How the application is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingMode {
    /// Top-level page with its own URL-based routing.
    Standalone,
    /// Rendered inside a host-controlled iframe; routing and identity come from the host.
    Embedded,
}

impl EmbeddingMode {
    /// Returns a stable string token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::Embedded => "embedded",
        }
    }

    /// Returns whether routing is driven by the host.
    pub const fn is_embedded(self) -> bool {
        matches!(self, Self::Embedded)
    }
}

/// Object-safe boxed future used by [`HostUiService`] async methods.
pub type HostUiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Browser UI capabilities used by user-facing flows (clipboard and blocking alerts).
pub trait HostUiService {
    /// Returns whether a clipboard API exists in the current context.
    fn clipboard_available(&self) -> bool;

    /// Writes `text` to the clipboard.
    fn write_clipboard<'a>(&'a self, text: &'a str) -> HostUiFuture<'a, Result<(), String>>;

    /// Shows a blocking alert with `message`.
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, Copy, Default)]
/// UI service for targets without a browser: no clipboard, alerts are dropped.
pub struct NoopHostUi;

impl HostUiService for NoopHostUi {
    fn clipboard_available(&self) -> bool {
        false
    }

    fn write_clipboard<'a>(&'a self, _text: &'a str) -> HostUiFuture<'a, Result<(), String>> {
        Box::pin(async { Err("clipboard unavailable".to_string()) })
    }

    fn alert(&self, _message: &str) {}
}

#[derive(Debug, Default)]
struct MemoryHostUiState {
    clipboard_missing: bool,
    fail_writes: bool,
    clipboard: Option<String>,
    alerts: Vec<String>,
}

#[derive(Debug, Clone, Default)]
/// In-memory UI service recording clipboard writes and alerts. Clones share state.
pub struct MemoryHostUi {
    inner: Rc<RefCell<MemoryHostUiState>>,
}

impl MemoryHostUi {
    /// Simulates a browser without a clipboard API.
    pub fn without_clipboard() -> Self {
        let ui = Self::default();
        ui.inner.borrow_mut().clipboard_missing = true;
        ui
    }

    /// Makes subsequent clipboard writes fail.
    pub fn set_fail_writes(&self, fail: bool) {
        self.inner.borrow_mut().fail_writes = fail;
    }

    /// Returns the last text written to the clipboard.
    pub fn clipboard(&self) -> Option<String> {
        self.inner.borrow().clipboard.clone()
    }

    /// Returns every alert shown so far.
    pub fn alerts(&self) -> Vec<String> {
        self.inner.borrow().alerts.clone()
    }
}

impl HostUiService for MemoryHostUi {
    fn clipboard_available(&self) -> bool {
        !self.inner.borrow().clipboard_missing
    }

    fn write_clipboard<'a>(&'a self, text: &'a str) -> HostUiFuture<'a, Result<(), String>> {
        Box::pin(async move {
            let mut state = self.inner.borrow_mut();
            if state.fail_writes {
                return Err("clipboard write denied".to_string());
            }
            state.clipboard = Some(text.to_string());
            Ok(())
        })
    }

    fn alert(&self, message: &str) {
        self.inner.borrow_mut().alerts.push(message.to_string());
    }
}

/// Runtime-selected host service bundle injected into the orchestration layer.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `valu_runtime`, which keeps the runtime free of browser adapter details.
#[derive(Clone)]
pub struct HostServices {
    /// Factory for the process-wide bridging client. Invoked at most once.
    pub bridge_factory: Rc<dyn Fn() -> Rc<dyn ValuBridge>>,
    /// Persisted slot store backing the local fallback collection.
    pub slots: Rc<dyn SlotStore>,
    /// Clipboard and alert capabilities.
    pub ui: Rc<dyn HostUiService>,
    /// Timer used between remote polls.
    pub sleeper: Rc<dyn Sleeper>,
    /// Whether the page runs inside a host iframe.
    pub embedding: EmbeddingMode,
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;

    #[test]
    fn embedding_mode_tokens() {
        assert_eq!(EmbeddingMode::Embedded.as_str(), "embedded");
        assert!(!EmbeddingMode::Standalone.is_embedded());
    }

    #[test]
    fn memory_host_ui_records_clipboard_and_alerts() {
        let ui = MemoryHostUi::default();
        assert!(ui.clipboard_available());
        block_on(ui.write_clipboard("https://x")).expect("write");
        ui.alert("copied");
        assert_eq!(ui.clipboard().as_deref(), Some("https://x"));
        assert_eq!(ui.alerts(), vec!["copied".to_string()]);

        ui.set_fail_writes(true);
        assert!(block_on(ui.write_clipboard("y")).is_err());
        assert!(!MemoryHostUi::without_clipboard().clipboard_available());
    }
}
