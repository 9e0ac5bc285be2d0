//! # Durable Store
//!
//! The last-published configuration. Two backends:
//!
//! - [`FileDurableStore`]: a JSON file on disk, for single-process setups
//!   and for the server side of the HTTP endpoint
//! - [`HttpDurableStore`]: the `GET`/`POST /api/config` endpoint served by
//!   `siteconf-workspace`

use crate::atomic::write_atomic;
use crate::error::{PublishError, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use siteconf_schema::{PublishResponse, SiteConfiguration};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Successful publish as reported by the durable store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Server-assigned timestamp (RFC 3339)
    pub timestamp: String,

    /// The serving process restarted as a side effect of the write
    pub server_restarted: bool,

    /// New port of the serving process, when it moved
    pub new_port: Option<u16>,
}

impl PublishReceipt {
    /// Interpret an endpoint response
    pub fn from_response(response: PublishResponse) -> Result<Self, PublishError> {
        if !response.success {
            return Err(PublishError::Rejected(
                response
                    .message
                    .unwrap_or_else(|| "Publish failed".to_string()),
            ));
        }

        Ok(Self {
            // Older servers omit the timestamp; fall back to the client clock
            timestamp: response.timestamp.unwrap_or_else(now_rfc3339),
            server_restarted: response.server_restarted.unwrap_or(false),
            new_port: response.new_port,
        })
    }
}

/// Storage holding the last-published configuration
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Raw stored document, `None` when nothing was published yet
    async fn load(&self) -> Result<Option<Value>, StoreError>;

    /// Replace the stored document
    async fn publish(&self, config: &SiteConfiguration) -> Result<PublishReceipt, PublishError>;
}

/// JSON file on local disk
#[derive(Debug, Clone)]
pub struct FileDurableStore {
    path: PathBuf,
}

impl FileDurableStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write a configuration and return the assigned timestamp
    pub async fn write(&self, config: &SiteConfiguration) -> Result<String, StoreError> {
        let text = config.to_json_pretty()?;
        let path = self.path.clone();

        tokio::task::spawn_blocking(move || write_atomic(&path, text.as_bytes()))
            .await
            .map_err(|e| StoreError::io(&self.path, std::io::Error::other(e)))??;

        Ok(now_rfc3339())
    }
}

#[async_trait]
impl DurableStore for FileDurableStore {
    async fn load(&self) -> Result<Option<Value>, StoreError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => Ok(Some(serde_json::from_str(&text)?)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    async fn publish(&self, config: &SiteConfiguration) -> Result<PublishReceipt, PublishError> {
        let timestamp = self.write(config).await?;
        tracing::info!(path = %self.path.display(), %timestamp, "Published configuration to file");

        Ok(PublishReceipt {
            timestamp,
            server_restarted: false,
            new_port: None,
        })
    }
}

/// Durable store endpoint of a running workspace server
#[derive(Debug, Clone)]
pub struct HttpDurableStore {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpDurableStore {
    /// Path of the config endpoint below the server base URL
    pub const ENDPOINT_PATH: &'static str = "/api/config";

    pub fn new(base_url: &str) -> Result<Self, StoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.trim_end_matches('/'), Self::ENDPOINT_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl DurableStore for HttpDurableStore {
    async fn load(&self) -> Result<Option<Value>, StoreError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(StoreError::Unreachable(format!(
                "GET {} returned {}",
                self.endpoint,
                response.status()
            )));
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;
        Ok(Some(value))
    }

    async fn publish(&self, config: &SiteConfiguration) -> Result<PublishReceipt, PublishError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(config)
            .send()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PublishError::Network(e.to_string()))?;

        // Failure bodies still follow the response shape when the server produced them
        match serde_json::from_str::<PublishResponse>(&body) {
            Ok(parsed) => PublishReceipt::from_response(parsed),
            Err(_) if !status.is_success() => Err(PublishError::Status {
                status: status.as_u16(),
                body: truncate(&body, 200),
            }),
            Err(e) => Err(PublishError::InvalidResponse(e.to_string())),
        }
    }
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}…", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_receipt_from_failed_response() {
        let result = PublishReceipt::from_response(PublishResponse::failure("build failed"));
        assert_eq!(result, Err(PublishError::Rejected("build failed".to_string())));

        let result = PublishReceipt::from_response(PublishResponse::default());
        assert_eq!(result, Err(PublishError::Rejected("Publish failed".to_string())));
    }

    #[test]
    fn test_receipt_from_restart_response() {
        let receipt = PublishReceipt::from_response(PublishResponse {
            success: true,
            timestamp: Some("2024-05-01T10:00:00Z".to_string()),
            server_restarted: Some(true),
            new_port: Some(4000),
            message: None,
        })
        .unwrap();

        assert_eq!(receipt.timestamp, "2024-05-01T10:00:00Z");
        assert!(receipt.server_restarted);
        assert_eq!(receipt.new_port, Some(4000));
    }

    #[test]
    fn test_http_endpoint_joins_base_url() {
        let store = HttpDurableStore::new("http://localhost:3030/").unwrap();
        assert_eq!(store.endpoint(), "http://localhost:3030/api/config");
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("héllo", 2), "hé…");
        assert_eq!(truncate("ok", 5), "ok");
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileDurableStore::new(dir.path().join("site-config.json"));

        assert!(store.load().await.unwrap().is_none());

        let config = SiteConfiguration::from_value(json!({ "siteName": "Shop" })).unwrap();
        let receipt = store.publish(&config).await.unwrap();
        assert!(!receipt.server_restarted);

        assert_eq!(store.load().await.unwrap(), Some(json!({ "siteName": "Shop" })));
    }
}
