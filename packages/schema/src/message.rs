//! # Wire Messages
//!
//! Shapes that cross a process or context boundary as JSON text.

use crate::config::SiteConfiguration;
use crate::error::SchemaError;
use serde::{Deserialize, Serialize};

/// Kind tag of a [`PreviewMessage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreviewMessageKind {
    #[serde(rename = "configUpdate")]
    ConfigUpdate,
}

/// Full-replacement update sent to preview surfaces.
///
/// Receivers replace their working copy with `config`; the sender has
/// already merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewMessage {
    #[serde(rename = "type")]
    pub kind: PreviewMessageKind,
    pub config: SiteConfiguration,
    pub theme_color: String,
}

impl PreviewMessage {
    /// Build an update carrying the config's own theme color
    pub fn config_update(config: SiteConfiguration) -> Self {
        let theme_color = config.theme_color().to_string();
        Self {
            kind: PreviewMessageKind::ConfigUpdate,
            config,
            theme_color,
        }
    }

    pub fn with_theme_color(mut self, theme_color: impl Into<String>) -> Self {
        self.theme_color = theme_color.into();
        self
    }

    pub fn to_json(&self) -> Result<String, SchemaError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self, SchemaError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Cross-context frame: the sender's origin plus the serialized message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub origin: String,
    pub payload: String,
}

impl Envelope {
    pub fn new(origin: impl Into<String>, message: &PreviewMessage) -> Result<Self, SchemaError> {
        Ok(Self {
            origin: origin.into(),
            payload: message.to_json()?,
        })
    }
}

/// Response body of the durable-store write endpoint.
///
/// Every field but `success` may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PublishResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server_restarted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl PublishResponse {
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: Some(message.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_preview_message_wire_shape() {
        let config = SiteConfiguration::from_value(json!({ "themeColor": "#123456" })).unwrap();
        let message = PreviewMessage::config_update(config);

        let value: serde_json::Value = serde_json::from_str(&message.to_json().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "configUpdate",
                "config": { "themeColor": "#123456" },
                "themeColor": "#123456"
            })
        );
    }

    #[test]
    fn test_unknown_message_type_is_rejected() {
        let text = r##"{"type":"reload","config":{},"themeColor":"#000"}"##;
        assert!(PreviewMessage::from_json(text).is_err());
    }

    #[test]
    fn test_publish_response_accepts_minimal_body() {
        let response: PublishResponse = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(response.success);
        assert!(response.timestamp.is_none());
        assert!(response.new_port.is_none());

        let response: PublishResponse = serde_json::from_str(
            r#"{"success":true,"timestamp":"t","serverRestarted":true,"newPort":4000}"#,
        )
        .unwrap();
        assert_eq!(response.server_restarted, Some(true));
        assert_eq!(response.new_port, Some(4000));
    }
}
