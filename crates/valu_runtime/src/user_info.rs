//! Current-user identity shown in the top bar.

use std::{cell::Cell, rc::Rc};

use leptos::logging;
use serde_json::{json, Value};
use valu_host::ValuBridge;

use crate::{config::USERS_API, connection::ConnectionProvider, model::UserInfo};

/// Subset of the host's `users/current` answer used by the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    /// Host user id.
    pub id: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Job title, if the host provides one.
    pub company_title: Option<String>,
}

impl CurrentUser {
    /// Reads the host answer. `None` when the host returned no user object or no id.
    pub fn from_value(value: &Value) -> Option<Self> {
        let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
        let id = match value.get("id")? {
            Value::String(id) if !id.is_empty() => id.clone(),
            Value::Number(id) => id.to_string(),
            _ => return None,
        };
        Some(Self {
            id,
            first_name: text("firstName").unwrap_or_default(),
            last_name: text("lastName").unwrap_or_default(),
            company_title: text("companyTitle"),
        })
    }

    /// Display identity without an icon.
    pub fn to_user_info(&self) -> UserInfo {
        UserInfo {
            name: format!("{} {}", self.first_name, self.last_name),
            role: self.company_title.clone().unwrap_or_default(),
            icon: None,
        }
    }
}

/// Runs `users/current`.
///
/// # Errors
///
/// Returns the client error text when the call fails.
pub async fn fetch_current_user(bridge: &dyn ValuBridge) -> Result<Option<CurrentUser>, String> {
    let value = bridge.run_api(USERS_API, "current", None).await?;
    Ok(CurrentUser::from_value(&value))
}

async fn fetch_icon(bridge: &dyn ValuBridge, user_id: &str) -> Result<Option<String>, String> {
    let value = bridge
        .run_api(USERS_API, "get-icon", Some(json!({ "userId": user_id })))
        .await?;
    let icon = match &value {
        Value::String(url) => Some(url.as_str()),
        other => other.get("url").and_then(Value::as_str),
    };
    Ok(icon.filter(|url| !url.is_empty()).map(str::to_string))
}

#[derive(Clone)]
/// Loads the current identity once the connection is ready. One fetch cycle per loader.
pub struct UserInfoLoader {
    connection: ConnectionProvider,
    started: Rc<Cell<bool>>,
}

impl UserInfoLoader {
    /// Creates a loader over the shared connection.
    pub fn new(connection: ConnectionProvider) -> Self {
        Self {
            connection,
            started: Rc::new(Cell::new(false)),
        }
    }

    /// Waits for readiness, then fetches identity and icon, calling `publish` after each step.
    ///
    /// Only the first call performs the cycle; later calls resolve `None` at once. Failures are
    /// logged and leave whatever was already published in place.
    pub async fn load(&self, publish: impl Fn(&UserInfo)) -> Option<UserInfo> {
        if self.started.replace(true) {
            return None;
        }
        let bridge = self.connection.ready().await;
        let user = match fetch_current_user(bridge.as_ref()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                logging::warn!("host returned no current user");
                return None;
            }
            Err(err) => {
                logging::warn!("current user lookup failed: {err}");
                return None;
            }
        };
        let mut info = user.to_user_info();
        publish(&info);

        match fetch_icon(bridge.as_ref(), &user.id).await {
            Ok(Some(icon)) => {
                info.icon = Some(icon);
                publish(&info);
            }
            Ok(None) => {}
            Err(err) => logging::warn!("user icon lookup failed: {err}"),
        }
        Some(info)
    }
}
