//! File records shared by the storage workflows and the raw upload inputs that produce them.

use std::{any::Any, fmt, future::Future, pin::Pin, rc::Rc};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// MIME type used when the browser reports none.
pub const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// One stored file or remote resource as presented in the file grid.
///
/// Records are immutable after creation. The serialized field names match the persisted local
/// slot format (`size`, `type`, `uploadedAt`, `data`), with timestamps written as RFC 3339 text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Identifier, unique within the active storage mode.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Size in bytes.
    #[serde(rename = "size")]
    pub size_bytes: u64,
    /// Reported MIME type (may be empty for local uploads the browser could not classify).
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Upload or last-update time.
    #[serde(rename = "uploadedAt")]
    pub uploaded_at: DateTime<Utc>,
    /// Inline content reference: a data URI (local) or a resolved thumbnail URL (remote).
    #[serde(rename = "data", default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<String>,
}

impl FileRecord {
    /// Returns whether the record renders as an inline image preview.
    pub fn has_image_preview(&self) -> bool {
        self.mime_type.starts_with("image/") && self.payload.is_some()
    }
}

/// Object-safe boxed future used by [`FileSource`] reads.
pub type FileReadFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Backing content of a [`RawFile`].
pub trait FileSource {
    /// Reads the full content and encodes it as a self-contained data URI.
    fn read_data_url<'a>(&'a self, mime_type: &'a str) -> FileReadFuture<'a, Result<String, String>>;

    /// Exposes the concrete source so host adapters can recover platform handles.
    fn as_any(&self) -> &dyn Any;
}

/// A file handed to the upload workflow, before it becomes a [`FileRecord`].
#[derive(Clone)]
pub struct RawFile {
    /// File name as reported by the picker or drop target.
    pub name: String,
    /// Size in bytes as reported by the picker or drop target.
    pub size_bytes: u64,
    /// MIME type as reported by the picker or drop target.
    pub mime_type: String,
    source: Rc<dyn FileSource>,
}

impl RawFile {
    /// Wraps a platform file source with its reported metadata.
    pub fn new(
        name: impl Into<String>,
        size_bytes: u64,
        mime_type: impl Into<String>,
        source: Rc<dyn FileSource>,
    ) -> Self {
        Self {
            name: name.into(),
            size_bytes,
            mime_type: mime_type.into(),
            source,
        }
    }

    /// Builds an in-memory file whose size is taken from `bytes`.
    pub fn from_bytes(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        let size_bytes = bytes.len() as u64;
        Self::new(name, size_bytes, mime_type, Rc::new(MemoryFile::new(bytes)))
    }

    /// Reads the full content as a data URI.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying source cannot be read.
    pub async fn read_data_url(&self) -> Result<String, String> {
        self.source.read_data_url(&self.mime_type).await
    }

    /// Returns the backing source.
    pub fn source(&self) -> &dyn FileSource {
        self.source.as_ref()
    }
}

impl fmt::Debug for RawFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawFile")
            .field("name", &self.name)
            .field("size_bytes", &self.size_bytes)
            .field("mime_type", &self.mime_type)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default)]
/// In-memory file source.
pub struct MemoryFile {
    bytes: Vec<u8>,
    unreadable: bool,
}

impl MemoryFile {
    /// Creates a readable source holding `bytes`.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            unreadable: false,
        }
    }

    /// Creates a source whose reads always fail.
    pub fn unreadable() -> Self {
        Self {
            bytes: Vec::new(),
            unreadable: true,
        }
    }
}

impl FileSource for MemoryFile {
    fn read_data_url<'a>(&'a self, mime_type: &'a str) -> FileReadFuture<'a, Result<String, String>> {
        Box::pin(async move {
            if self.unreadable {
                return Err("file could not be read".to_string());
            }
            Ok(encode_data_url(mime_type, &self.bytes))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Encodes `bytes` as a base64 data URI, substituting [`DEFAULT_MIME_TYPE`] for an empty type.
pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    let mime_type = if mime_type.trim().is_empty() {
        DEFAULT_MIME_TYPE
    } else {
        mime_type
    };
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}
