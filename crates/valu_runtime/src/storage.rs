//! Dual-mode file management over the local fallback slot and the host resource service.
//!
//! Every operation picks its [`StorageMode`] once, from the connection state at the moment it
//! starts, and keeps that mode for all of its steps. Listing commits are tagged with a generation
//! token: a result is applied only if no newer listing or mutation started after it, so a slow
//! response from the previous mode can never overwrite a fresher collection.

pub mod local;
pub mod remote;

use std::{
    cell::{Cell, RefCell},
    collections::HashSet,
    rc::Rc,
};

use chrono::Utc;
use leptos::logging;
use thiserror::Error;
use valu_host::{next_monotonic_timestamp_ms, FileRecord, HostUiService, RawFile, Sleeper};

pub use local::LocalFallbackStore;
pub use remote::RemoteResourceClient;

use crate::{
    config::StorageConfig,
    connection::ConnectionProvider,
    model::{StorageMode, StorageViewState},
};

/// Failure of one storage operation. Operations log these and leave the view consistent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The bridging client could not deliver an intent.
    #[error("{intent} failed: {message}")]
    Transport {
        /// `app/action` label of the intent.
        intent: String,
        /// Client error text.
        message: String,
    },
    /// The host answered with an error object.
    #[error("{intent} reported an error: {detail}")]
    Remote {
        /// `app/action` label of the intent.
        intent: String,
        /// Serialized error detail.
        detail: String,
    },
    /// The host answered with a shape that could not be interpreted.
    #[error("{intent} returned an unexpected response: {message}")]
    MalformedResponse {
        /// `app/action` label of the intent.
        intent: String,
        /// What was missing.
        message: String,
    },
    /// Writing the local fallback collection failed.
    #[error("persisting local files failed: {0}")]
    Persist(String),
    /// Reading a picked or dropped file failed.
    #[error("reading `{name}` failed: {message}")]
    FileRead {
        /// File name.
        name: String,
        /// Reader error text.
        message: String,
    },
}

/// Failure of the copy-public-URL workflow. The display text is the alert shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClipboardError {
    /// The browser exposes no clipboard API.
    #[error("Clipboard API is not available in this browser")]
    Unavailable,
    /// No URL could be produced for the selected file.
    #[error("Unable to get public URL")]
    Unresolved,
    /// The clipboard write was rejected.
    #[error("Error generating or copying URL")]
    WriteFailed(String),
}

#[derive(Debug, Clone, Copy)]
enum BusyFlag {
    Loading,
    Uploading,
    CopyingUrl,
}

struct StorageInner {
    connection: ConnectionProvider,
    local: LocalFallbackStore,
    config: StorageConfig,
    ui: Rc<dyn HostUiService>,
    sleeper: Rc<dyn Sleeper>,
    state: RefCell<StorageViewState>,
    generation: Cell<u64>,
    // Remote ids deleted since the current generation began.
    remote_deletions: RefCell<Vec<String>>,
    busy: [Cell<u32>; 3],
    subscribers: RefCell<Vec<Rc<dyn Fn(&StorageViewState)>>>,
}

#[derive(Clone)]
/// Owner of the storage view state and the list, upload, delete, and share workflows.
pub struct StorageManager {
    inner: Rc<StorageInner>,
}

/// Restores a busy flag when the owning operation finishes, whichever path it takes.
struct BusyGuard {
    manager: StorageManager,
    flag: BusyFlag,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.manager.adjust_busy(self.flag, false);
    }
}

impl StorageManager {
    /// Creates a manager with an empty view.
    pub fn new(
        connection: ConnectionProvider,
        slots: Rc<dyn valu_host::SlotStore>,
        ui: Rc<dyn HostUiService>,
        sleeper: Rc<dyn Sleeper>,
        config: StorageConfig,
    ) -> Self {
        let local = LocalFallbackStore::new(slots, config.slot_key.clone());
        let mode = StorageMode::from_connected(connection.is_ready());
        Self {
            inner: Rc::new(StorageInner {
                connection,
                local,
                config,
                ui,
                sleeper,
                state: RefCell::new(StorageViewState {
                    mode,
                    ..StorageViewState::default()
                }),
                generation: Cell::new(0),
                remote_deletions: RefCell::new(Vec::new()),
                busy: [Cell::new(0), Cell::new(0), Cell::new(0)],
                subscribers: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Registers a callback invoked with the full view state after every change.
    pub fn subscribe(&self, subscriber: impl Fn(&StorageViewState) + 'static) {
        self.inner
            .subscribers
            .borrow_mut()
            .push(Rc::new(subscriber));
    }

    /// Returns a copy of the current view state.
    pub fn snapshot(&self) -> StorageViewState {
        self.inner.state.borrow().clone()
    }

    /// Returns the mode an operation starting now would use.
    pub fn current_mode(&self) -> StorageMode {
        StorageMode::from_connected(self.inner.connection.is_ready())
    }

    /// Builds a resource client over the shared bridging client.
    pub fn remote_client(&self) -> RemoteResourceClient {
        RemoteResourceClient::new(self.inner.connection.acquire(), &self.inner.config)
    }

    /// Fetches the collection of `mode` without touching the view.
    ///
    /// # Errors
    ///
    /// Only remote fetches fail; the local collection degrades to empty instead.
    pub async fn fetch_files(&self, mode: StorageMode) -> Result<Vec<FileRecord>, StorageError> {
        match mode {
            StorageMode::Local => Ok(self.inner.local.load().await),
            StorageMode::Remote => self.remote_client().search().await,
        }
    }

    /// Lists the collection of the current mode and commits it to the view.
    pub async fn list_files(&self) -> Vec<FileRecord> {
        self.list_files_in(self.current_mode()).await
    }

    /// Lists the collection of `mode` and commits it unless a newer operation started meanwhile.
    ///
    /// A failed remote listing is logged and commits an empty collection.
    pub async fn list_files_in(&self, mode: StorageMode) -> Vec<FileRecord> {
        let token = self.begin();
        let _busy = self.busy(BusyFlag::Loading);
        let files = match self.fetch_files(mode).await {
            Ok(files) => files,
            Err(err) => {
                logging::error!("listing {mode:?} files failed: {err}");
                Vec::new()
            }
        };
        self.commit_listing(token, mode, files.clone());
        files
    }

    /// Uploads `files` in the current mode.
    pub async fn upload_files(&self, files: Vec<RawFile>) {
        self.upload_files_in(self.current_mode(), files).await;
    }

    /// Uploads `files` in `mode`. An empty batch does nothing.
    ///
    /// Local uploads persist each file as soon as it is read; a read or persist failure stops the
    /// batch and keeps what was already stored. Remote uploads send the whole batch in one intent
    /// and then poll the listing on the settle schedule until a new record appears or the attempts
    /// run out.
    pub async fn upload_files_in(&self, mode: StorageMode, files: Vec<RawFile>) {
        if files.is_empty() {
            return;
        }
        let _busy = self.busy(BusyFlag::Uploading);
        match mode {
            StorageMode::Local => self.upload_local(files).await,
            StorageMode::Remote => self.upload_remote(files).await,
        }
    }

    async fn upload_local(&self, files: Vec<RawFile>) {
        let token = self.begin();
        let batch = next_monotonic_timestamp_ms();
        let mut stored = None;
        for (index, file) in files.into_iter().enumerate() {
            let payload = match file.read_data_url().await {
                Ok(payload) => payload,
                Err(message) => {
                    let err = StorageError::FileRead {
                        name: file.name.clone(),
                        message,
                    };
                    logging::error!("local upload stopped: {err}");
                    break;
                }
            };
            let record = FileRecord {
                id: format!("{batch}-{index}"),
                name: file.name,
                size_bytes: file.size_bytes,
                mime_type: file.mime_type,
                uploaded_at: Utc::now(),
                payload: Some(payload),
            };
            match self.inner.local.append(record).await {
                Ok(all) => stored = Some(all),
                Err(err) => {
                    logging::error!("local upload stopped: {err}");
                    break;
                }
            }
        }
        if let Some(all) = stored {
            self.commit_listing(token, StorageMode::Local, all);
        }
    }

    async fn upload_remote(&self, files: Vec<RawFile>) {
        let client = self.remote_client();
        let known: HashSet<String> = self
            .inner
            .state
            .borrow()
            .files
            .iter()
            .map(|file| file.id.clone())
            .collect();
        if let Err(err) = client.upload(files).await {
            logging::error!("remote upload failed: {err}");
            return;
        }

        let token = self.begin();
        let mut latest = None;
        for delay in self.inner.config.settle.delays() {
            self.inner.sleeper.sleep(delay).await;
            let _loading = self.busy(BusyFlag::Loading);
            match client.search().await {
                Ok(files) => {
                    let settled = files.iter().any(|file| !known.contains(&file.id));
                    latest = Some(files);
                    if settled {
                        break;
                    }
                }
                Err(err) => logging::warn!("post-upload listing failed: {err}"),
            }
        }
        self.commit_listing(token, StorageMode::Remote, latest.unwrap_or_default());
    }

    /// Deletes the record `id` in the current mode.
    pub async fn delete_file(&self, id: &str) {
        self.delete_file_in(self.current_mode(), id).await;
    }

    /// Deletes the record `id` in `mode`.
    ///
    /// Deleting an unknown id locally is a no-op. A remote delete removes the record from the view
    /// only when the host reports no error status. A delivered request clears the selection if it
    /// pointed at `id`.
    ///
    /// A remote delete is a point change: it leaves listings in flight valid and only filters `id`
    /// out of whichever of them commits next.
    pub async fn delete_file_in(&self, mode: StorageMode, id: &str) {
        let _busy = self.busy(BusyFlag::Loading);
        let delivered = match mode {
            StorageMode::Local => match self.inner.local.remove(id).await {
                Ok(remaining) => {
                    let token = self.begin();
                    self.commit_listing(token, mode, remaining);
                    true
                }
                Err(err) => {
                    logging::error!("local delete of {id} failed: {err}");
                    false
                }
            },
            StorageMode::Remote => match self.remote_client().delete(id).await {
                Ok(()) => {
                    self.inner.remote_deletions.borrow_mut().push(id.to_string());
                    self.update(|state| state.files.retain(|file| file.id != id));
                    true
                }
                Err(err @ StorageError::Remote { .. }) => {
                    logging::warn!("remote delete of {id} rejected: {err}");
                    true
                }
                Err(err) => {
                    logging::error!("remote delete of {id} failed: {err}");
                    false
                }
            },
        };
        if delivered {
            self.update(|state| {
                if state.is_selected(id) {
                    state.selected = None;
                }
            });
        }
    }

    /// Resolves a shareable URL for `id` in the current mode.
    pub async fn resolve_public_url(&self, id: &str) -> Option<String> {
        self.resolve_public_url_in(self.current_mode(), id).await
    }

    /// Resolves a shareable URL for `id` in `mode`.
    ///
    /// Remote mode asks the host. Local mode returns the stored payload when it is already a URL
    /// (`http…` or `data:`).
    pub async fn resolve_public_url_in(&self, mode: StorageMode, id: &str) -> Option<String> {
        match mode {
            StorageMode::Remote => match self.remote_client().public_url(id).await {
                Ok(url) => url,
                Err(err) => {
                    logging::error!("public URL for {id} failed: {err}");
                    None
                }
            },
            StorageMode::Local => {
                let state = self.inner.state.borrow();
                state
                    .files
                    .iter()
                    .find(|file| file.id == id)
                    .and_then(|file| file.payload.as_deref())
                    .filter(|payload| payload.starts_with("http") || payload.starts_with("data:"))
                    .map(str::to_string)
            }
        }
    }

    /// Resolves the selected record's URL and writes it to the clipboard, alerting the outcome.
    ///
    /// Resolves `Ok(None)` when nothing is selected.
    ///
    /// # Errors
    ///
    /// Returns the [`ClipboardError`] whose text was alerted.
    pub async fn copy_public_url(&self) -> Result<Option<String>, ClipboardError> {
        let Some(id) = self.snapshot().selected_file().map(|file| file.id.clone()) else {
            return Ok(None);
        };
        let result = self.copy_url_of(&id).await;
        match &result {
            Ok(_) => self.inner.ui.alert("Public URL copied to clipboard"),
            Err(err) => {
                if let ClipboardError::WriteFailed(message) = err {
                    logging::error!("clipboard write failed: {message}");
                }
                self.inner.ui.alert(&err.to_string());
            }
        }
        result.map(Some)
    }

    async fn copy_url_of(&self, id: &str) -> Result<String, ClipboardError> {
        if !self.inner.ui.clipboard_available() {
            return Err(ClipboardError::Unavailable);
        }
        let _busy = self.busy(BusyFlag::CopyingUrl);
        let url = self
            .resolve_public_url(id)
            .await
            .ok_or(ClipboardError::Unresolved)?;
        self.inner
            .ui
            .write_clipboard(&url)
            .await
            .map_err(ClipboardError::WriteFailed)?;
        Ok(url)
    }

    /// Selects `id`, or clears the selection when `id` is already selected.
    pub fn toggle_selection(&self, id: &str) {
        self.update(|state| {
            state.selected = if state.is_selected(id) {
                None
            } else {
                Some(id.to_string())
            };
        });
    }

    /// Clears the selection.
    pub fn clear_selection(&self) {
        self.update(|state| state.selected = None);
    }

    fn begin(&self) -> u64 {
        let next = self.inner.generation.get().wrapping_add(1);
        self.inner.generation.set(next);
        self.inner.remote_deletions.borrow_mut().clear();
        next
    }

    fn commit_listing(&self, token: u64, mode: StorageMode, mut files: Vec<FileRecord>) -> bool {
        if token != self.inner.generation.get() {
            logging::debug_warn!("discarding stale {mode:?} listing");
            return false;
        }
        if mode == StorageMode::Remote {
            let deleted = self.inner.remote_deletions.borrow();
            files.retain(|file| !deleted.contains(&file.id));
        }
        self.update(|state| {
            state.mode = mode;
            if let Some(selected) = state.selected.as_deref() {
                if !files.iter().any(|file| file.id == selected) {
                    state.selected = None;
                }
            }
            state.files = files;
        });
        true
    }

    fn busy(&self, flag: BusyFlag) -> BusyGuard {
        self.adjust_busy(flag, true);
        BusyGuard {
            manager: self.clone(),
            flag,
        }
    }

    fn adjust_busy(&self, flag: BusyFlag, enter: bool) {
        let counter = &self.inner.busy[flag as usize];
        let count = if enter {
            counter.get() + 1
        } else {
            counter.get().saturating_sub(1)
        };
        counter.set(count);
        self.update(|state| {
            let slot = match flag {
                BusyFlag::Loading => &mut state.loading,
                BusyFlag::Uploading => &mut state.uploading,
                BusyFlag::CopyingUrl => &mut state.copying_url,
            };
            *slot = count > 0;
        });
    }

    fn update(&self, apply: impl FnOnce(&mut StorageViewState)) {
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            apply(&mut state);
            state.clone()
        };
        let subscribers = self.inner.subscribers.borrow().clone();
        for subscriber in subscribers {
            subscriber(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{future::Future, pin::Pin, task::Poll};

    use futures::{channel::oneshot, executor::block_on, FutureExt};
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};
    use valu_host::{
        ImmediateSleeper, MemoryFile, MemoryHostUi, MemorySlotStore, MemoryValuBridge, ValuBridge,
    };

    use super::*;
    use crate::storage::local::decode_collection;

    struct Harness {
        bridge: MemoryValuBridge,
        slots: MemorySlotStore,
        ui: MemoryHostUi,
        sleeper: ImmediateSleeper,
        manager: StorageManager,
    }

    fn harness(bridge: MemoryValuBridge) -> Harness {
        harness_with(bridge, MemoryHostUi::default())
    }

    fn harness_with(bridge: MemoryValuBridge, ui: MemoryHostUi) -> Harness {
        let slots = MemorySlotStore::default();
        let sleeper = ImmediateSleeper::default();
        let manager = StorageManager::new(
            ConnectionProvider::from_bridge(Rc::new(bridge.clone())),
            Rc::new(slots.clone()),
            Rc::new(ui.clone()),
            Rc::new(sleeper.clone()),
            StorageConfig::default(),
        );
        Harness {
            bridge,
            slots,
            ui,
            sleeper,
            manager,
        }
    }

    fn text_file(name: &str, body: &[u8]) -> RawFile {
        RawFile::from_bytes(name, "text/plain", body.to_vec())
    }

    fn persisted(slots: &MemorySlotStore) -> Vec<FileRecord> {
        slots
            .raw("valu_files")
            .map(|raw| decode_collection(&raw).expect("valid slot"))
            .unwrap_or_default()
    }

    fn resource(id: &str) -> Value {
        json!({ "id": id, "title": format!("{id}.bin"), "metadata": { "fileSize": 1 } })
    }

    fn ids(files: &[FileRecord]) -> Vec<&str> {
        files.iter().map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn local_upload_persists_data_urls_and_updates_view() {
        let h = harness(MemoryValuBridge::default());
        block_on(h.manager.upload_files(vec![text_file("note.txt", b"0123456789")]));

        let stored = persisted(&h.slots);
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].name, "note.txt");
        assert_eq!(stored[0].size_bytes, 10);
        assert_eq!(stored[0].mime_type, "text/plain");
        assert_eq!(
            stored[0].payload.as_deref(),
            Some("data:text/plain;base64,MDEyMzQ1Njc4OQ==")
        );
        assert!(stored[0].id.ends_with("-0"));

        let view = h.manager.snapshot();
        assert_eq!(view.files, stored);
        assert_eq!(view.mode, StorageMode::Local);
        assert!(!view.uploading);
        assert!(!view.loading);
    }

    #[test]
    fn local_upload_batch_grows_collection_by_batch_size() {
        let h = harness(MemoryValuBridge::default());
        block_on(h.manager.upload_files(vec![text_file("a.txt", b"a")]));
        block_on(h.manager.upload_files(vec![
            text_file("b.txt", b"b"),
            text_file("c.txt", b"c"),
        ]));

        let view = block_on(h.manager.list_files());
        assert_eq!(view.len(), 3);
        let unique: HashSet<&str> = ids(&view).into_iter().collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn local_upload_keeps_files_read_before_a_failure() {
        let h = harness(MemoryValuBridge::default());
        let broken = RawFile::new("bad.bin", 3, "", Rc::new(MemoryFile::unreadable()));
        block_on(h.manager.upload_files(vec![
            text_file("good.txt", b"ok"),
            broken,
            text_file("never.txt", b"no"),
        ]));

        let names: Vec<String> = persisted(&h.slots).into_iter().map(|f| f.name).collect();
        assert_eq!(names, vec!["good.txt"]);
        assert_eq!(h.manager.snapshot().files.len(), 1);
        assert!(!h.manager.snapshot().uploading);
    }

    #[test]
    fn empty_upload_is_a_no_op() {
        let h = harness(MemoryValuBridge::connected());
        block_on(h.manager.upload_files(Vec::new()));
        assert!(h.bridge.service_calls().is_empty());
        assert_eq!(h.slots.raw("valu_files"), None);
    }

    #[test]
    fn local_delete_filters_and_unknown_id_is_no_op() {
        let h = harness(MemoryValuBridge::default());
        block_on(h.manager.upload_files(vec![text_file("a.txt", b"a"), text_file("b.txt", b"b")]));
        let before = h.slots.raw("valu_files");

        block_on(h.manager.delete_file("missing"));
        assert_eq!(h.slots.raw("valu_files"), before);
        assert_eq!(h.manager.snapshot().files.len(), 2);

        let first = h.manager.snapshot().files[0].id.clone();
        h.manager.toggle_selection(&first);
        block_on(h.manager.delete_file(&first));
        let remaining = persisted(&h.slots);
        assert_eq!(remaining.len(), 1);
        assert!(remaining.iter().all(|f| f.id != first));
        assert_eq!(h.manager.snapshot().selected, None);
    }

    #[test]
    fn remote_listing_maps_resources_in_order() {
        let h = harness(MemoryValuBridge::connected());
        h.bridge.set_service_handler(|intent| match intent.label().as_str() {
            "ApplicationStorage/resource-search" => Ok(json!({
                "data": { "resources": [resource("r1"), resource("r2")] }
            })),
            _ => Ok(json!({ "url": "https://cdn.example/thumb.png" })),
        });

        let files = block_on(h.manager.list_files());
        assert_eq!(ids(&files), vec!["r1", "r2"]);
        let view = h.manager.snapshot();
        assert_eq!(view.mode, StorageMode::Remote);
        assert_eq!(ids(&view.files), vec!["r1", "r2"]);
    }

    #[test]
    fn remote_listing_failure_commits_empty_view() {
        let h = harness(MemoryValuBridge::connected());
        h.bridge.set_service_handler(|_| Err("host unreachable".to_string()));
        assert!(block_on(h.manager.list_files()).is_empty());
        assert!(h.manager.snapshot().files.is_empty());
        assert!(!h.manager.snapshot().loading);
    }

    #[test]
    fn remote_upload_polls_until_new_resource_appears() {
        let h = harness(MemoryValuBridge::connected());
        let searches = Rc::new(Cell::new(0));
        let count = searches.clone();
        h.bridge.set_service_handler(move |intent| match intent.label().as_str() {
            "ApplicationStorage/resource-upload" => Ok(json!({})),
            "ApplicationStorage/resource-search" => {
                count.set(count.get() + 1);
                let resources = if count.get() < 3 {
                    json!([resource("old")])
                } else {
                    json!([resource("old"), resource("new")])
                };
                Ok(json!({ "data": { "resources": resources } }))
            }
            _ => Ok(Value::Null),
        });
        block_on(h.manager.list_files());
        searches.set(0);

        block_on(h.manager.upload_files(vec![text_file("new.txt", b"n")]));
        assert_eq!(searches.get(), 3);
        assert_eq!(h.sleeper.requested(), vec![1_000, 2_000, 4_000]);
        assert_eq!(ids(&h.manager.snapshot().files), vec!["old", "new"]);
        assert!(!h.manager.snapshot().uploading);
        assert_eq!(h.slots.raw("valu_files"), None);
    }

    #[test]
    fn remote_upload_gives_up_after_bounded_attempts() {
        let h = harness(MemoryValuBridge::connected());
        h.bridge.set_service_handler(|intent| match intent.label().as_str() {
            "ApplicationStorage/resource-search" => {
                Ok(json!({ "data": { "resources": [resource("old")] } }))
            }
            _ => Ok(json!({})),
        });
        block_on(h.manager.list_files());

        block_on(h.manager.upload_files(vec![text_file("slow.txt", b"s")]));
        assert_eq!(h.sleeper.requested(), vec![1_000, 2_000, 4_000, 8_000]);
        assert_eq!(ids(&h.manager.snapshot().files), vec!["old"]);
    }

    #[test]
    fn rejected_remote_upload_skips_polling() {
        let h = harness(MemoryValuBridge::connected());
        h.bridge.set_service_handler(|_| Ok(json!({ "error": "quota exceeded" })));
        block_on(h.manager.upload_files(vec![text_file("big.bin", b"x")]));
        assert!(h.sleeper.requested().is_empty());
        assert!(!h.manager.snapshot().uploading);
    }

    #[test]
    fn remote_delete_honors_error_status() {
        let h = harness(MemoryValuBridge::connected());
        let reject = Rc::new(Cell::new(false));
        let rejecting = reject.clone();
        h.bridge.set_service_handler(move |intent| match intent.label().as_str() {
            "ApplicationStorage/resource-search" => Ok(json!({
                "data": { "resources": [resource("r1"), resource("r2")] }
            })),
            "ApplicationStorage/resource-delete" if rejecting.get() => {
                Ok(json!({ "error": { "status": 403 } }))
            }
            _ => Ok(json!({})),
        });
        block_on(h.manager.list_files());

        reject.set(true);
        block_on(h.manager.delete_file("r1"));
        assert_eq!(ids(&h.manager.snapshot().files), vec!["r1", "r2"]);

        reject.set(false);
        h.manager.toggle_selection("r2");
        block_on(h.manager.delete_file("r2"));
        assert_eq!(ids(&h.manager.snapshot().files), vec!["r1"]);
        assert_eq!(h.manager.snapshot().selected, None);
    }

    #[test]
    fn transport_failure_on_delete_keeps_selection() {
        let h = harness(MemoryValuBridge::connected());
        h.bridge.set_service_handler(|intent| match intent.label().as_str() {
            "ApplicationStorage/resource-search" => {
                Ok(json!({ "data": { "resources": [resource("r1")] } }))
            }
            _ => Err("dropped".to_string()),
        });
        block_on(h.manager.list_files());
        h.manager.toggle_selection("r1");

        block_on(h.manager.delete_file("r1"));
        assert_eq!(h.manager.snapshot().selected.as_deref(), Some("r1"));
        assert_eq!(ids(&h.manager.snapshot().files), vec!["r1"]);
    }

    #[test]
    fn toggle_selection_flips_and_clears() {
        let h = harness(MemoryValuBridge::default());
        h.manager.toggle_selection("a");
        assert!(h.manager.snapshot().is_selected("a"));
        h.manager.toggle_selection("b");
        assert!(h.manager.snapshot().is_selected("b"));
        h.manager.toggle_selection("b");
        assert_eq!(h.manager.snapshot().selected, None);
        h.manager.toggle_selection("a");
        h.manager.clear_selection();
        assert_eq!(h.manager.snapshot().selected, None);
    }

    #[test]
    fn local_public_url_returns_data_payload() {
        let h = harness(MemoryValuBridge::default());
        block_on(h.manager.upload_files(vec![text_file("a.txt", b"a")]));
        let id = h.manager.snapshot().files[0].id.clone();
        assert_eq!(
            block_on(h.manager.resolve_public_url(&id)).as_deref(),
            Some("data:text/plain;base64,YQ==")
        );
        assert_eq!(block_on(h.manager.resolve_public_url("missing")), None);
    }

    #[test]
    fn copy_public_url_writes_clipboard_and_alerts() {
        let h = harness(MemoryValuBridge::connected());
        h.bridge.set_service_handler(|intent| match intent.label().as_str() {
            "ApplicationStorage/resource-search" => {
                Ok(json!({ "data": { "resources": [resource("r1")] } }))
            }
            "Resources/generate-public-url" => Ok(json!("https://share.example/r1")),
            _ => Ok(Value::Null),
        });
        block_on(h.manager.list_files());

        assert_eq!(block_on(h.manager.copy_public_url()), Ok(None));
        assert!(h.ui.alerts().is_empty());

        h.manager.toggle_selection("r1");
        let copied = block_on(h.manager.copy_public_url());
        assert_eq!(copied, Ok(Some("https://share.example/r1".to_string())));
        assert_eq!(h.ui.clipboard().as_deref(), Some("https://share.example/r1"));
        assert_eq!(h.ui.alerts(), vec!["Public URL copied to clipboard"]);
        assert!(!h.manager.snapshot().copying_url);
    }

    #[test]
    fn copy_public_url_alerts_each_failure() {
        let h = harness_with(MemoryValuBridge::default(), MemoryHostUi::without_clipboard());
        block_on(h.manager.upload_files(vec![text_file("a.txt", b"a")]));
        let id = h.manager.snapshot().files[0].id.clone();
        h.manager.toggle_selection(&id);
        assert_eq!(
            block_on(h.manager.copy_public_url()),
            Err(ClipboardError::Unavailable)
        );

        let h = harness(MemoryValuBridge::connected());
        h.bridge.set_service_handler(|intent| match intent.label().as_str() {
            "ApplicationStorage/resource-search" => {
                Ok(json!({ "data": { "resources": [resource("r1")] } }))
            }
            "Resources/generate-public-url" => Ok(json!("https://share.example/r1")),
            _ => Ok(Value::Null),
        });
        block_on(h.manager.list_files());
        h.manager.toggle_selection("r1");
        h.ui.set_fail_writes(true);
        assert!(matches!(
            block_on(h.manager.copy_public_url()),
            Err(ClipboardError::WriteFailed(_))
        ));
        assert_eq!(h.ui.alerts(), vec!["Error generating or copying URL"]);
        assert!(!h.manager.snapshot().copying_url);

        h.bridge.set_service_handler(|intent| match intent.label().as_str() {
            "Resources/generate-public-url" => Ok(Value::Null),
            _ => Ok(Value::Null),
        });
        assert_eq!(
            block_on(h.manager.copy_public_url()),
            Err(ClipboardError::Unresolved)
        );
        assert_eq!(h.ui.alerts().last().map(String::as_str), Some("Unable to get public URL"));
    }

    /// Bridge whose search responses are released by the test, to interleave operations.
    #[derive(Clone, Default)]
    struct GatedBridge {
        inner: MemoryValuBridge,
        gates: Rc<RefCell<Vec<oneshot::Receiver<Value>>>>,
    }

    impl ValuBridge for GatedBridge {
        fn is_connected(&self) -> bool {
            self.inner.is_connected()
        }

        fn on_ready(&self, listener: Box<dyn FnOnce()>) {
            self.inner.on_ready(listener);
        }

        fn on_route_changed(&self, listener: Box<dyn Fn(String)>) {
            self.inner.on_route_changed(listener);
        }

        fn call_service<'a>(
            &'a self,
            intent: valu_host::Intent,
        ) -> valu_host::BridgeFuture<'a, Result<Value, String>> {
            if intent.label() != "ApplicationStorage/resource-search" {
                return self.inner.call_service(intent);
            }
            let gate = self.gates.borrow_mut().remove(0);
            Box::pin(async move { gate.await.map_err(|_| "gate dropped".to_string()) })
        }

        fn send_intent<'a>(
            &'a self,
            intent: valu_host::Intent,
        ) -> valu_host::BridgeFuture<'a, Result<(), String>> {
            self.inner.send_intent(intent)
        }

        fn run_api<'a>(
            &'a self,
            api: &'a str,
            command: &'a str,
            args: Option<Value>,
        ) -> valu_host::BridgeFuture<'a, Result<Value, String>> {
            self.inner.run_api(api, command, args)
        }

        fn push_route<'a>(&'a self, path: &'a str) -> valu_host::BridgeFuture<'a, Result<(), String>> {
            self.inner.push_route(path)
        }
    }

    fn poll_once<F: Future>(future: Pin<&mut F>) -> Poll<F::Output> {
        match future.now_or_never() {
            Some(output) => Poll::Ready(output),
            None => Poll::Pending,
        }
    }

    #[test]
    fn stale_remote_listing_never_overwrites_local_listing() {
        let gated = GatedBridge::default();
        let (release, gate) = oneshot::channel();
        gated.gates.borrow_mut().push(gate);
        let slots = MemorySlotStore::default();
        let manager = StorageManager::new(
            ConnectionProvider::from_bridge(Rc::new(gated.clone())),
            Rc::new(slots.clone()),
            Rc::new(MemoryHostUi::default()),
            Rc::new(ImmediateSleeper::default()),
            StorageConfig::default(),
        );
        block_on(manager.upload_files_in(StorageMode::Local, vec![text_file("local.txt", b"l")]));

        let mut remote = Box::pin(manager.list_files_in(StorageMode::Remote));
        assert!(poll_once(remote.as_mut()).is_pending());
        assert!(manager.snapshot().loading);

        let local = block_on(manager.list_files_in(StorageMode::Local));
        assert_eq!(local.len(), 1);

        release
            .send(json!({ "data": { "resources": [resource("remote")] } }))
            .expect("receiver alive");
        let remote_files = block_on(remote);
        assert_eq!(ids(&remote_files), vec!["remote"]);

        let view = manager.snapshot();
        assert_eq!(view.mode, StorageMode::Local);
        assert_eq!(view.files, local);
        assert!(!view.loading);
    }

    #[derive(Clone, Default)]
    struct GatedSleeper {
        gates: Rc<RefCell<Vec<oneshot::Receiver<()>>>>,
    }

    impl Sleeper for GatedSleeper {
        fn sleep<'a>(&'a self, _delay_ms: u32) -> valu_host::SleeperFuture<'a> {
            let gate = {
                let mut gates = self.gates.borrow_mut();
                (!gates.is_empty()).then(|| gates.remove(0))
            };
            Box::pin(async move {
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
            })
        }
    }

    #[test]
    fn remote_delete_during_settle_wait_keeps_post_upload_listing() {
        let bridge = MemoryValuBridge::connected();
        let sleeper = GatedSleeper::default();
        let (release, gate) = oneshot::channel();
        sleeper.gates.borrow_mut().push(gate);
        let manager = StorageManager::new(
            ConnectionProvider::from_bridge(Rc::new(bridge.clone())),
            Rc::new(MemorySlotStore::default()),
            Rc::new(MemoryHostUi::default()),
            Rc::new(sleeper),
            StorageConfig::default(),
        );
        let uploaded = Rc::new(Cell::new(false));
        let host_has_new = uploaded.clone();
        bridge.set_service_handler(move |intent| match intent.label().as_str() {
            "ApplicationStorage/resource-upload" => {
                host_has_new.set(true);
                Ok(json!({}))
            }
            "ApplicationStorage/resource-search" if host_has_new.get() => {
                Ok(json!({ "data": { "resources": [resource("new")] } }))
            }
            "ApplicationStorage/resource-search" => {
                Ok(json!({ "data": { "resources": [resource("old")] } }))
            }
            _ => Ok(json!({})),
        });
        block_on(manager.list_files());
        assert_eq!(ids(&manager.snapshot().files), vec!["old"]);

        let mut upload = Box::pin(manager.upload_files(vec![text_file("new.txt", b"n")]));
        assert!(poll_once(upload.as_mut()).is_pending());
        assert!(uploaded.get());

        block_on(manager.delete_file("old"));
        assert!(manager.snapshot().files.is_empty());

        release.send(()).expect("sleeper alive");
        block_on(upload);
        let view = manager.snapshot();
        assert_eq!(ids(&view.files), vec!["new"]);
        assert!(!view.uploading);
    }

    #[test]
    fn listing_in_flight_drops_remotely_deleted_record() {
        let gated = GatedBridge::default();
        gated.inner.connect();
        let (release, gate) = oneshot::channel();
        gated.gates.borrow_mut().push(gate);
        let manager = StorageManager::new(
            ConnectionProvider::from_bridge(Rc::new(gated.clone())),
            Rc::new(MemorySlotStore::default()),
            Rc::new(MemoryHostUi::default()),
            Rc::new(ImmediateSleeper::default()),
            StorageConfig::default(),
        );

        let mut listing = Box::pin(manager.list_files());
        assert!(poll_once(listing.as_mut()).is_pending());
        block_on(manager.delete_file("r1"));

        release
            .send(json!({ "data": { "resources": [resource("r1"), resource("r2")] } }))
            .expect("receiver alive");
        block_on(listing);
        assert_eq!(ids(&manager.snapshot().files), vec!["r2"]);
    }

    #[test]
    fn subscribers_observe_busy_flags_and_results() {
        let h = harness(MemoryValuBridge::default());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = seen.clone();
        h.manager
            .subscribe(move |state| log.borrow_mut().push((state.uploading, state.files.len())));

        block_on(h.manager.upload_files(vec![text_file("a.txt", b"a")]));
        let seen = seen.borrow();
        assert_eq!(seen.first(), Some(&(true, 0)));
        assert_eq!(seen.last(), Some(&(false, 1)));
    }

    #[test]
    fn connection_state_selects_mode_per_operation() {
        let bridge = MemoryValuBridge::default();
        let h = harness(bridge.clone());
        assert_eq!(h.manager.current_mode(), StorageMode::Local);
        block_on(h.manager.upload_files(vec![text_file("a.txt", b"a")]));
        assert!(h.bridge.service_calls().is_empty());
        let local_view = h.manager.snapshot().files;
        let local_bytes = h.slots.raw("valu_files");

        bridge.connect();
        bridge.set_service_handler(|_| Ok(json!({ "data": { "resources": [] } })));
        assert_eq!(h.manager.current_mode(), StorageMode::Remote);
        block_on(h.manager.list_files());
        assert_eq!(h.manager.snapshot().mode, StorageMode::Remote);
        assert!(h.manager.snapshot().files.is_empty());
        assert_eq!(persisted(&h.slots).len(), 1);
        assert_eq!(h.slots.raw("valu_files"), local_bytes);

        assert_eq!(block_on(h.manager.list_files_in(StorageMode::Local)), local_view);
        assert_eq!(h.manager.snapshot().mode, StorageMode::Local);
    }
}
