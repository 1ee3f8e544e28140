//! Named persisted slot contracts and adapters.
//!
//! A slot is one key in browser-local persistent storage holding a JSON text blob. The local
//! fallback file collection lives in exactly one slot.

use std::{cell::RefCell, collections::HashMap, future::Future, pin::Pin, rc::Rc};

/// Object-safe boxed future used by [`SlotStore`] async methods.
pub type SlotStoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Host service for named persisted slots (JSON stored as text per key).
pub trait SlotStore {
    /// Loads the raw JSON text stored under `key`.
    fn load_slot<'a>(&'a self, key: &'a str) -> SlotStoreFuture<'a, Result<Option<String>, String>>;

    /// Replaces the raw JSON text stored under `key`.
    fn save_slot<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> SlotStoreFuture<'a, Result<(), String>>;
}

#[derive(Debug, Clone, Default)]
/// In-memory slot store. Clones share the same backing map.
pub struct MemorySlotStore {
    inner: Rc<RefCell<HashMap<String, String>>>,
    fail_writes: Rc<RefCell<bool>>,
}

impl MemorySlotStore {
    /// Returns the raw text currently held by `key`, bypassing the async contract.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    /// Seeds `key` with raw text, bypassing the async contract.
    pub fn seed(&self, key: &str, raw_json: &str) {
        self.inner
            .borrow_mut()
            .insert(key.to_string(), raw_json.to_string());
    }

    /// Makes every subsequent write fail, mimicking a full or disabled `localStorage`.
    pub fn set_fail_writes(&self, fail: bool) {
        *self.fail_writes.borrow_mut() = fail;
    }
}

impl SlotStore for MemorySlotStore {
    fn load_slot<'a>(&'a self, key: &'a str) -> SlotStoreFuture<'a, Result<Option<String>, String>> {
        Box::pin(async move { Ok(self.raw(key)) })
    }

    fn save_slot<'a>(
        &'a self,
        key: &'a str,
        raw_json: &'a str,
    ) -> SlotStoreFuture<'a, Result<(), String>> {
        Box::pin(async move {
            if *self.fail_writes.borrow() {
                return Err(format!("slot write rejected: {key}"));
            }
            self.seed(key, raw_json);
            Ok(())
        })
    }
}
