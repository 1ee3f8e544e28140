//! Runtime configuration for the storage workflows and intent addressing.

/// Intent namespace serving search, upload, and delete of application resources.
pub const STORAGE_NAMESPACE: &str = "ApplicationStorage";
/// Intent namespace serving thumbnail and public URL generation.
pub const RESOURCES_NAMESPACE: &str = "Resources";
/// Host API exposing identity commands.
pub const USERS_API: &str = "users";
/// Application opened to chat with a user.
pub const TEXT_CHAT_APP: &str = "textchat";
/// Application opened for a video call.
pub const VIDEO_CHAT_APP: &str = "videochat";

/// Bounded poll schedule used after a remote upload until the listing reflects it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SettlePolicy {
    /// Wait before the first re-list.
    pub initial_delay_ms: u32,
    /// Multiplier applied to the wait after every attempt that did not observe the upload.
    pub backoff_factor: u32,
    /// Number of re-list attempts before the last listing is accepted as-is.
    pub max_attempts: u32,
}

impl Default for SettlePolicy {
    fn default() -> Self {
        Self {
            initial_delay_ms: 1_000,
            backoff_factor: 2,
            max_attempts: 4,
        }
    }
}

impl SettlePolicy {
    /// Returns the wait preceding each attempt, in order.
    pub fn delays(self) -> impl Iterator<Item = u32> {
        let factor = self.backoff_factor.max(1);
        std::iter::successors(Some(self.initial_delay_ms), move |delay| {
            Some(delay.saturating_mul(factor))
        })
        .take(self.max_attempts.max(1) as usize)
    }
}

/// Storage workflow settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// `localStorage` slot holding the local fallback collection.
    pub slot_key: String,
    /// Page size of remote resource searches.
    pub page_size: u32,
    /// Requested edge length of remote thumbnails, in pixels.
    pub thumbnail_size: u32,
    /// Post-upload poll schedule.
    pub settle: SettlePolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            slot_key: "valu_files".to_string(),
            page_size: 10,
            thumbnail_size: 256,
            settle: SettlePolicy::default(),
        }
    }
}

/// Top-level runtime configuration assembled by the entry crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppConfig {
    /// Storage workflow settings.
    pub storage: StorageConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settle_schedule_starts_with_one_second() {
        let delays: Vec<u32> = SettlePolicy::default().delays().collect();
        assert_eq!(delays, vec![1_000, 2_000, 4_000, 8_000]);
    }

    #[test]
    fn degenerate_policy_still_polls_once() {
        let policy = SettlePolicy {
            initial_delay_ms: 500,
            backoff_factor: 0,
            max_attempts: 0,
        };
        assert_eq!(policy.delays().collect::<Vec<_>>(), vec![500]);
    }

    #[test]
    fn storage_defaults_match_host_contract() {
        let config = StorageConfig::default();
        assert_eq!(config.slot_key, "valu_files");
        assert_eq!(config.page_size, 10);
        assert_eq!(config.thumbnail_size, 256);
    }
}
