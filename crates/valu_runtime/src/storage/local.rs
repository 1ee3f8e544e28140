//! Local fallback collection persisted as one JSON array in a named slot.

use std::rc::Rc;

use leptos::logging;
use valu_host::{FileRecord, SlotStore};

use super::StorageError;

#[derive(Clone)]
/// File collection persisted in browser-local storage while no host connection is active.
pub struct LocalFallbackStore {
    slots: Rc<dyn SlotStore>,
    key: String,
}

impl LocalFallbackStore {
    /// Creates a store bound to the slot `key`.
    pub fn new(slots: Rc<dyn SlotStore>, key: impl Into<String>) -> Self {
        Self {
            slots,
            key: key.into(),
        }
    }

    /// Loads the persisted collection.
    ///
    /// A missing, unreadable, or corrupt slot yields an empty collection.
    pub async fn load(&self) -> Vec<FileRecord> {
        match self.slots.load_slot(&self.key).await {
            Ok(Some(raw)) => decode_collection(&raw).unwrap_or_else(|err| {
                logging::warn!("local file collection `{}` is corrupt: {err}", self.key);
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(err) => {
                logging::warn!("local file collection `{}` load failed: {err}", self.key);
                Vec::new()
            }
        }
    }

    /// Replaces the persisted collection.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Persist`] when serialization or the slot write fails.
    pub async fn save(&self, files: &[FileRecord]) -> Result<(), StorageError> {
        let raw = encode_collection(files)?;
        self.slots
            .save_slot(&self.key, &raw)
            .await
            .map_err(StorageError::Persist)
    }

    /// Appends one record and returns the collection as persisted.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Persist`] when the slot write fails; the slot is left unchanged.
    pub async fn append(&self, record: FileRecord) -> Result<Vec<FileRecord>, StorageError> {
        let mut files = self.load().await;
        files.push(record);
        self.save(&files).await?;
        Ok(files)
    }

    /// Removes the record with `id` and returns the remaining collection.
    ///
    /// An unknown id leaves the slot untouched.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Persist`] when the slot write fails.
    pub async fn remove(&self, id: &str) -> Result<Vec<FileRecord>, StorageError> {
        let mut files = self.load().await;
        let before = files.len();
        files.retain(|file| file.id != id);
        if files.len() != before {
            self.save(&files).await?;
        }
        Ok(files)
    }
}

/// Serializes a collection into the persisted slot format.
///
/// # Errors
///
/// Returns [`StorageError::Persist`] when serialization fails.
pub fn encode_collection(files: &[FileRecord]) -> Result<String, StorageError> {
    serde_json::to_string(files).map_err(|e| StorageError::Persist(e.to_string()))
}

/// Parses the persisted slot format.
///
/// # Errors
///
/// Returns the JSON error message when `raw` is not a valid collection.
pub fn decode_collection(raw: &str) -> Result<Vec<FileRecord>, String> {
    serde_json::from_str(raw).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use futures::executor::block_on;
    use pretty_assertions::assert_eq;
    use valu_host::MemorySlotStore;

    use super::*;

    fn record(id: &str, millis: i64) -> FileRecord {
        FileRecord {
            id: id.to_string(),
            name: format!("{id}.txt"),
            size_bytes: 10,
            mime_type: "text/plain".to_string(),
            uploaded_at: Utc.timestamp_millis_opt(millis).unwrap(),
            payload: Some("data:text/plain;base64,MDEyMzQ1Njc4OQ==".to_string()),
        }
    }

    fn store() -> (MemorySlotStore, LocalFallbackStore) {
        let slots = MemorySlotStore::default();
        let store = LocalFallbackStore::new(Rc::new(slots.clone()), "valu_files");
        (slots, store)
    }

    #[test]
    fn collection_round_trips_through_slot_format() {
        let files = vec![record("a", 1_714_566_600_250), record("b", 1_714_566_601_000)];
        let raw = encode_collection(&files).expect("encode");
        assert_eq!(decode_collection(&raw).expect("decode"), files);
    }

    #[test]
    fn missing_and_corrupt_slots_load_empty() {
        let (slots, store) = store();
        assert_eq!(block_on(store.load()), Vec::new());

        slots.seed("valu_files", "{not json");
        assert_eq!(block_on(store.load()), Vec::new());

        slots.seed("valu_files", r#"[{"id":"x"}]"#);
        assert_eq!(block_on(store.load()), Vec::new());
    }

    #[test]
    fn append_and_remove_persist() {
        let (slots, store) = store();
        block_on(store.append(record("a", 1))).expect("append a");
        let files = block_on(store.append(record("b", 2))).expect("append b");
        assert_eq!(files.len(), 2);

        let remaining = block_on(store.remove("a")).expect("remove");
        assert_eq!(remaining, vec![record("b", 2)]);
        assert_eq!(
            decode_collection(&slots.raw("valu_files").expect("slot")).expect("decode"),
            remaining
        );
    }

    #[test]
    fn removing_unknown_id_leaves_slot_bytes_untouched() {
        let (slots, store) = store();
        block_on(store.append(record("a", 1))).expect("append");
        let before = slots.raw("valu_files");

        slots.set_fail_writes(true);
        let files = block_on(store.remove("missing")).expect("no-op remove");
        assert_eq!(files, vec![record("a", 1)]);
        assert_eq!(slots.raw("valu_files"), before);
    }

    #[test]
    fn failed_append_reports_persist_error() {
        let (slots, store) = store();
        slots.set_fail_writes(true);
        let err = block_on(store.append(record("a", 1))).expect_err("write fails");
        assert!(matches!(err, StorageError::Persist(_)));
        assert_eq!(slots.raw("valu_files"), None);
    }
}
