//! # Local Store
//!
//! Transient copies of the configuration, kept in two storage scopes.
//!
//! | Key                      | Scope      | Content                              |
//! |--------------------------|------------|--------------------------------------|
//! | `siteConfig`             | persistent | full configuration                   |
//! | `siteConfig_backup`      | persistent | `{ savedAt, config }`                |
//! | `siteConfig_emergency`   | session    | full configuration                   |
//! | `previewConfig`          | session    | handoff copy for preview bootstrap   |
//! | `themeColor`             | persistent | active theme color (JSON string)     |
//! | `editorExpandedSections` | persistent | UI expansion state (JSON array)      |
//! | `editorSession`          | persistent | last save metadata                   |
//!
//! Reads tolerate absence and malformed JSON: both come back as `None`.

use crate::error::StoreError;
use crate::storage::KeyValueStorage;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use siteconf_schema::SiteConfiguration;
use std::sync::Arc;

/// Storage keys shared by the editor and preview
pub mod keys {
    pub const PRIMARY: &str = "siteConfig";
    pub const BACKUP: &str = "siteConfig_backup";
    pub const EMERGENCY: &str = "siteConfig_emergency";
    pub const PREVIEW_HANDOFF: &str = "previewConfig";
    pub const THEME_COLOR: &str = "themeColor";
    pub const EXPANDED_SECTIONS: &str = "editorExpandedSections";
    pub const SESSION_META: &str = "editorSession";
}

/// Timestamped backup copy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupEntry {
    pub saved_at: DateTime<Utc>,
    pub config: SiteConfiguration,
}

/// Metadata recorded by the editor's Save action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionMeta {
    pub saved_at: DateTime<Utc>,
    pub theme_color: String,
    #[serde(default)]
    pub expanded_sections: Vec<String>,
}

/// Both local storage scopes behind one interface
#[derive(Clone)]
pub struct LocalStore {
    local: Arc<dyn KeyValueStorage>,
    session: Arc<dyn KeyValueStorage>,
}

impl LocalStore {
    pub fn new(local: Arc<dyn KeyValueStorage>, session: Arc<dyn KeyValueStorage>) -> Self {
        Self { local, session }
    }

    /// Persistent scope
    pub fn local(&self) -> &dyn KeyValueStorage {
        self.local.as_ref()
    }

    /// Session scope
    pub fn session(&self) -> &dyn KeyValueStorage {
        self.session.as_ref()
    }

    /// Write the configuration to the primary, backup and emergency keys.
    ///
    /// Every key is attempted; the first failure is returned after the rest
    /// have been tried, so one full scope does not block the others.
    pub fn save(&self, config: &SiteConfiguration) -> Result<(), StoreError> {
        let text = config.to_json()?;
        let backup = serde_json::to_string(&BackupEntry {
            saved_at: Utc::now(),
            config: config.clone(),
        })?;

        let results = [
            self.local.set(keys::PRIMARY, &text),
            self.local.set(keys::BACKUP, &backup),
            self.session.set(keys::EMERGENCY, &text),
        ];

        let mut first_error = None;
        for result in results {
            if let Err(e) = result {
                tracing::warn!(error = %e, "Local save failed for one key");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Primary copy, if present and well-formed (not resolved)
    pub fn primary(&self) -> Option<SiteConfiguration> {
        read_config(self.local(), keys::PRIMARY)
    }

    /// First readable copy among primary, backup and emergency keys
    pub fn recover(&self) -> Option<SiteConfiguration> {
        self.primary()
            .or_else(|| read_json::<BackupEntry>(self.local(), keys::BACKUP).map(|b| b.config))
            .or_else(|| read_config(self.session(), keys::EMERGENCY))
    }

    pub fn backup(&self) -> Option<BackupEntry> {
        read_json(self.local(), keys::BACKUP)
    }

    /// Handoff copy written for a preview that is about to bootstrap
    pub fn write_preview_handoff(&self, config: &SiteConfiguration) -> Result<(), StoreError> {
        self.session.set(keys::PREVIEW_HANDOFF, &config.to_json()?)
    }

    pub fn preview_handoff(&self) -> Option<SiteConfiguration> {
        read_config(self.session(), keys::PREVIEW_HANDOFF)
    }

    pub fn theme_color(&self) -> Option<String> {
        read_json(self.local(), keys::THEME_COLOR)
    }

    pub fn set_theme_color(&self, color: &str) -> Result<(), StoreError> {
        self.local
            .set(keys::THEME_COLOR, &serde_json::to_string(color)?)
    }

    pub fn expanded_sections(&self) -> Vec<String> {
        read_json(self.local(), keys::EXPANDED_SECTIONS).unwrap_or_default()
    }

    pub fn set_expanded_sections(&self, sections: &[String]) -> Result<(), StoreError> {
        self.local
            .set(keys::EXPANDED_SECTIONS, &serde_json::to_string(sections)?)
    }

    pub fn session_meta(&self) -> Option<SessionMeta> {
        read_json(self.local(), keys::SESSION_META)
    }

    pub fn set_session_meta(&self, meta: &SessionMeta) -> Result<(), StoreError> {
        self.local
            .set(keys::SESSION_META, &serde_json::to_string(meta)?)
    }
}

/// Read a configuration blob, treating malformed content as absent
pub fn read_config(storage: &dyn KeyValueStorage, key: &str) -> Option<SiteConfiguration> {
    read_json(storage, key)
}

/// Read and parse a JSON blob, treating errors and malformed content as absent
pub fn read_json<T: DeserializeOwned>(storage: &dyn KeyValueStorage, key: &str) -> Option<T> {
    let text = match storage.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(key, error = %e, "Failed to read local storage key");
            return None;
        }
    };

    match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(key, error = %e, "Ignoring malformed local storage value");
            None
        }
    }
}
