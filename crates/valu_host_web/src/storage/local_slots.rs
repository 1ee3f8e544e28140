//! `localStorage`-backed slot store implementation.
//!
//! The browser API is synchronous; the adapter wraps it in the async [`valu_host::SlotStore`]
//! contract so the orchestration layer treats every backend the same way.

use valu_host::{SlotStore, SlotStoreFuture};

#[derive(Debug, Clone, Copy, Default)]
/// Browser slot store backed by `window.localStorage`.
pub struct WebSlotStore;

impl WebSlotStore {
    /// Loads the raw text stored under `key`.
    pub fn load_raw(self, key: &str) -> Option<String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()?.local_storage().ok().flatten()?;
            storage.get_item(key).ok().flatten()
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = key;
            None
        }
    }

    /// Replaces the raw text stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error when localStorage is unavailable or the write fails (for example when the
    /// quota is exhausted by large data URIs).
    pub fn save_raw(self, key: &str, raw_json: &str) -> Result<(), String> {
        #[cfg(target_arch = "wasm32")]
        {
            let storage = web_sys::window()
                .and_then(|w| w.local_storage().ok().flatten())
                .ok_or_else(|| "localStorage unavailable".to_string())?;
            storage
                .set_item(key, raw_json)
                .map_err(|e| format!("localStorage set_item failed: {e:?}"))
        }

        #[cfg(not(target_arch = "wasm32"))]
        {
            let _ = (key, raw_json);
            Ok(())
        }
    }
}

impl SlotStore for WebSlotStore {
    fn load_slot<'a>(&'a self, key: &'a str) -> SlotStoreFuture<'a, Result<Option<String>, String>> {
        let store = *self;
        Box::pin(async move { Ok(store.load_raw(key)) })
    }

    fn save_slot<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> SlotStoreFuture<'a, Result<(), String>> {
        let store = *self;
        Box::pin(async move { store.save_raw(key, raw_json) })
    }
}
