//! View-facing state models for storage, navigation, and identity.

use valu_host::FileRecord;

/// Backing store used by one storage operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Browser-local persisted fallback collection.
    Local,
    /// Host resource service reached through the bridging client.
    Remote,
}

impl StorageMode {
    /// Maps the bridging client's connection flag onto a mode.
    pub const fn from_connected(connected: bool) -> Self {
        if connected {
            Self::Remote
        } else {
            Self::Local
        }
    }

    /// Caption shown above the file grid.
    pub const fn caption(self) -> &'static str {
        match self {
            Self::Local => "Demo mode: Files are stored in browser localStorage",
            Self::Remote => "Manage files stored in Valu API application storage",
        }
    }
}

/// Everything the storage view renders. Replaced wholesale on each commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageViewState {
    /// Visible collection, in presentation order.
    pub files: Vec<FileRecord>,
    /// Id of the selected record, if any.
    pub selected: Option<String>,
    /// A list or delete operation is in flight.
    pub loading: bool,
    /// An upload is in flight.
    pub uploading: bool,
    /// A public URL is being resolved and copied.
    pub copying_url: bool,
    /// Mode of the last committed listing.
    pub mode: StorageMode,
}

impl Default for StorageViewState {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            selected: None,
            loading: false,
            uploading: false,
            copying_url: false,
            mode: StorageMode::Local,
        }
    }
}

impl StorageViewState {
    /// Returns the selected record if it is still visible.
    pub fn selected_file(&self) -> Option<&FileRecord> {
        let id = self.selected.as_deref()?;
        self.files.iter().find(|file| file.id == id)
    }

    /// Returns whether `id` is the selected record.
    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }
}

/// Icon family for a MIME type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// `image/*`.
    Image,
    /// Text or JSON.
    Text,
    /// zip, rar, or tar archives.
    Archive,
    /// JavaScript, TypeScript, HTML, or CSS sources.
    Code,
    /// Anything else.
    Generic,
}

impl FileKind {
    /// Classifies a MIME type. Checks run in priority order.
    pub fn from_mime(mime_type: &str) -> Self {
        let contains_any = |needles: &[&str]| needles.iter().any(|n| mime_type.contains(n));
        if mime_type.starts_with("image/") {
            Self::Image
        } else if contains_any(&["text", "json"]) {
            Self::Text
        } else if contains_any(&["zip", "rar", "tar"]) {
            Self::Archive
        } else if contains_any(&["javascript", "typescript", "html", "css"]) {
            Self::Code
        } else {
            Self::Generic
        }
    }

    /// Returns the CSS icon class rendered for this kind.
    pub const fn icon_class(self) -> &'static str {
        match self {
            Self::Image => "file-icon file-icon-image",
            Self::Text => "file-icon file-icon-text",
            Self::Archive => "file-icon file-icon-archive",
            Self::Code => "file-icon file-icon-code",
            Self::Generic => "file-icon file-icon-generic",
        }
    }
}

/// Formats a byte count as `B`, `KB`, or `MB` with one decimal above one kilobyte.
pub fn format_file_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Logical destinations of the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Destination {
    /// Connection console and sample API calls.
    Console,
    /// Application storage file manager.
    Storage,
    /// Usage notes.
    Documentation,
}

impl Destination {
    /// All destinations in tab order.
    pub const ALL: [Self; 3] = [Self::Console, Self::Storage, Self::Documentation];

    /// Absolute route path.
    pub const fn path(self) -> &'static str {
        match self {
            Self::Console => "/console",
            Self::Storage => "/storage",
            Self::Documentation => "/documentation",
        }
    }

    /// Tab label.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Console => "Console",
            Self::Storage => "Storage",
            Self::Documentation => "Documentation",
        }
    }

    /// Maps a normalized route onto a destination by prefix. Unknown routes render the console.
    pub fn from_route(route: &str) -> Self {
        if route.starts_with(Self::Storage.path()) {
            Self::Storage
        } else if route.starts_with(Self::Documentation.path()) {
            Self::Documentation
        } else {
            Self::Console
        }
    }
}

/// Identity shown in the top bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInfo {
    /// `"{firstName} {lastName}"`.
    pub name: String,
    /// Company title.
    pub role: String,
    /// Icon URL; `None` keeps the spinner.
    pub icon: Option<String>,
}

impl Default for UserInfo {
    fn default() -> Self {
        Self {
            name: "John Doe".to_string(),
            role: "Developer".to_string(),
            icon: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn file_kind_priority_order() {
        assert_eq!(FileKind::from_mime("image/svg+xml"), FileKind::Image);
        assert_eq!(FileKind::from_mime("application/json"), FileKind::Text);
        assert_eq!(FileKind::from_mime("text/html"), FileKind::Text);
        assert_eq!(FileKind::from_mime("application/x-tar"), FileKind::Archive);
        assert_eq!(FileKind::from_mime("application/javascript"), FileKind::Code);
        assert_eq!(FileKind::from_mime(""), FileKind::Generic);
    }

    #[test]
    fn file_sizes_format_with_units() {
        assert_eq!(format_file_size(10), "10 B");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(5 * 1024 * 1024), "5.0 MB");
    }

    #[test]
    fn destinations_match_by_prefix_and_default_to_console() {
        assert_eq!(Destination::from_route("/storage"), Destination::Storage);
        assert_eq!(Destination::from_route("/storage/abc"), Destination::Storage);
        assert_eq!(
            Destination::from_route("/documentation#intents"),
            Destination::Documentation
        );
        assert_eq!(Destination::from_route("/settings"), Destination::Console);
        assert_eq!(Destination::from_route("/"), Destination::Console);
    }

    #[test]
    fn selected_file_requires_visible_record() {
        let mut state = StorageViewState {
            selected: Some("a".to_string()),
            ..StorageViewState::default()
        };
        assert!(state.selected_file().is_none());

        state.files.push(FileRecord {
            id: "a".to_string(),
            name: "a.txt".to_string(),
            size_bytes: 1,
            mime_type: "text/plain".to_string(),
            uploaded_at: Utc::now(),
            payload: None,
        });
        assert_eq!(state.selected_file().map(|f| f.name.as_str()), Some("a.txt"));
        assert!(state.is_selected("a"));
    }
}
