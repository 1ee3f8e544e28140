//! Remote resource operations expressed as host service intents.

use std::rc::Rc;

use chrono::{DateTime, TimeZone, Utc};
use leptos::logging;
use serde_json::{json, Value};
use valu_host::{FileRecord, Intent, RawFile, ValuBridge, DEFAULT_MIME_TYPE};

use super::StorageError;
use crate::config::{StorageConfig, RESOURCES_NAMESPACE, STORAGE_NAMESPACE};

const SEARCH: &str = "resource-search";
const THUMBNAIL: &str = "get-thumbnail-url";
const UPLOAD: &str = "resource-upload";
const DELETE: &str = "resource-delete";
const PUBLIC_URL: &str = "generate-public-url";

#[derive(Clone)]
/// Client for the host's application-storage and resource services.
pub struct RemoteResourceClient {
    bridge: Rc<dyn ValuBridge>,
    page_size: u32,
    thumbnail_size: u32,
}

impl RemoteResourceClient {
    /// Creates a client issuing intents through `bridge`.
    pub fn new(bridge: Rc<dyn ValuBridge>, config: &StorageConfig) -> Self {
        Self {
            bridge,
            page_size: config.page_size,
            thumbnail_size: config.thumbnail_size,
        }
    }

    async fn call(&self, intent: Intent) -> Result<Value, StorageError> {
        let label = intent.label();
        self.bridge
            .call_service(intent)
            .await
            .map_err(|message| StorageError::Transport {
                intent: label,
                message,
            })
    }

    /// Lists the first page of resources, resolving a thumbnail for each one in order.
    ///
    /// # Errors
    ///
    /// Fails when the search intent cannot be delivered or the response carries no resource list.
    /// Thumbnail failures never fail the listing.
    pub async fn search(&self) -> Result<Vec<FileRecord>, StorageError> {
        let response = self
            .call(
                Intent::new(STORAGE_NAMESPACE, SEARCH).with_params(json!({ "size": self.page_size })),
            )
            .await?;
        let resources = match response.pointer("/data/resources").and_then(Value::as_array) {
            Some(resources) => resources.clone(),
            None => {
                return Err(match response.get("error").filter(|e| !e.is_null()) {
                    Some(error) => StorageError::Remote {
                        intent: format!("{STORAGE_NAMESPACE}/{SEARCH}"),
                        detail: error.to_string(),
                    },
                    None => StorageError::MalformedResponse {
                        intent: format!("{STORAGE_NAMESPACE}/{SEARCH}"),
                        message: "missing data.resources".to_string(),
                    },
                })
            }
        };

        let mut files = Vec::with_capacity(resources.len());
        for (index, resource) in resources.iter().enumerate() {
            let Some(id) = resource_id(resource) else {
                // Kept visible under a listing-local id; there is nothing to look a thumbnail up by.
                logging::warn!("resource without id at position {index}: {resource}");
                files.push(map_resource(format!("unidentified-{index}"), resource, None));
                continue;
            };
            let thumbnail = self.thumbnail_url(&id).await;
            files.push(map_resource(id, resource, thumbnail));
        }
        Ok(files)
    }

    /// Resolves the thumbnail URL of one resource. Failures are logged and yield `None`.
    pub async fn thumbnail_url(&self, resource_id: &str) -> Option<String> {
        let intent = Intent::new(RESOURCES_NAMESPACE, THUMBNAIL).with_params(json!({
            "resourceId": resource_id,
            "thumbnailSize": self.thumbnail_size,
        }));
        match self.call(intent).await {
            Ok(response) => response
                .get("url")
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(str::to_string),
            Err(err) => {
                logging::warn!("thumbnail for {resource_id} unavailable: {err}");
                None
            }
        }
    }

    /// Uploads a batch of files in one intent.
    ///
    /// # Errors
    ///
    /// Fails when the intent cannot be delivered or the response carries an `error` member.
    pub async fn upload(&self, files: Vec<RawFile>) -> Result<(), StorageError> {
        let count = files.len();
        let response = self
            .call(Intent::new(STORAGE_NAMESPACE, UPLOAD).with_attachments(files))
            .await?;
        if let Some(error) = response.get("error").filter(|e| !e.is_null()) {
            return Err(StorageError::Remote {
                intent: format!("{STORAGE_NAMESPACE}/{UPLOAD}"),
                detail: error.to_string(),
            });
        }
        logging::log!("uploaded {count} file(s) to application storage");
        Ok(())
    }

    /// Deletes one resource.
    ///
    /// # Errors
    ///
    /// Fails when the intent cannot be delivered or the response reports `error.status`.
    pub async fn delete(&self, resource_id: &str) -> Result<(), StorageError> {
        let response = self
            .call(
                Intent::new(STORAGE_NAMESPACE, DELETE)
                    .with_params(json!({ "resourceId": resource_id })),
            )
            .await?;
        match response.pointer("/error/status").filter(|s| !s.is_null()) {
            Some(status) => Err(StorageError::Remote {
                intent: format!("{STORAGE_NAMESPACE}/{DELETE}"),
                detail: status.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Asks the host for a shareable URL of one resource.
    ///
    /// Resolves `None` when the host answers without a usable URL.
    ///
    /// # Errors
    ///
    /// Fails when the intent cannot be delivered.
    pub async fn public_url(&self, resource_id: &str) -> Result<Option<String>, StorageError> {
        let response = self
            .call(
                Intent::new(RESOURCES_NAMESPACE, PUBLIC_URL)
                    .with_params(json!({ "resourceId": resource_id })),
            )
            .await?;
        let url = match &response {
            Value::String(url) => Some(url.as_str()),
            other => other.get("url").and_then(Value::as_str),
        };
        Ok(url.filter(|url| !url.is_empty()).map(str::to_string))
    }
}

fn resource_id(resource: &Value) -> Option<String> {
    match resource.get("id")? {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Number(id) => Some(id.to_string()),
        _ => None,
    }
}

fn map_resource(id: String, resource: &Value, thumbnail: Option<String>) -> FileRecord {
    let metadata = resource.get("metadata");
    let size_bytes = metadata
        .and_then(|m| m.get("fileSize"))
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let mime_type = metadata
        .and_then(|m| m.get("contentType"))
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_MIME_TYPE)
        .to_string();
    FileRecord {
        id,
        name: resource
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
        size_bytes,
        mime_type,
        uploaded_at: resource
            .get("updated")
            .and_then(parse_timestamp)
            .unwrap_or_else(Utc::now),
        payload: thumbnail,
    }
}

fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(raw) => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|at| at.with_timezone(&Utc)),
        Value::Number(millis) => Utc.timestamp_millis_opt(millis.as_i64()?).single(),
        _ => None,
    }
}
