//! Demonstration intents sent from the console page.

use serde_json::json;
use thiserror::Error;
use valu_host::{Intent, ValuBridge};

use crate::{
    config::{TEXT_CHAT_APP, VIDEO_CHAT_APP},
    user_info::fetch_current_user,
};

/// Failure of a sample call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SampleCallError {
    /// The host returned no current user.
    #[error("host returned no current user")]
    NoCurrentUser,
    /// The bridging client failed to deliver a request.
    #[error("intent delivery failed: {0}")]
    Transport(String),
}

/// Opens a text chat channel with the current user.
///
/// # Errors
///
/// Fails when the user lookup or the intent delivery fails.
pub async fn open_current_user_chat(bridge: &dyn ValuBridge) -> Result<(), SampleCallError> {
    let user = fetch_current_user(bridge)
        .await
        .map_err(SampleCallError::Transport)?
        .ok_or(SampleCallError::NoCurrentUser)?;
    let intent =
        Intent::new(TEXT_CHAT_APP, "open-channel").with_params(json!({ "userId": user.id }));
    bridge
        .send_intent(intent)
        .await
        .map_err(SampleCallError::Transport)
}

/// Opens the video chat application.
///
/// # Errors
///
/// Fails when the intent cannot be delivered.
pub async fn open_video_chat(bridge: &dyn ValuBridge) -> Result<(), SampleCallError> {
    bridge
        .send_intent(Intent::open(VIDEO_CHAT_APP))
        .await
        .map_err(SampleCallError::Transport)
}
