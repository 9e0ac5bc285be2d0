//! # Config Store Adapter
//!
//! Uniform access to the durable and local copies of the configuration.
//!
//! - `load_durable` never fails: it logs and falls back to defaults
//! - `save_local` only touches local storage (no network I/O)
//! - `publish_durable` is the only operation that can fail for reasons
//!   outside the editor's control

use crate::durable::{DurableStore, PublishReceipt};
use crate::error::{PublishError, StoreError};
use crate::local::LocalStore;
use siteconf_schema::{resolve, SiteConfiguration};
use std::sync::Arc;

#[derive(Clone)]
pub struct ConfigStore {
    local: LocalStore,
    durable: Arc<dyn DurableStore>,
}

impl ConfigStore {
    pub fn new(local: LocalStore, durable: Arc<dyn DurableStore>) -> Self {
        Self { local, durable }
    }

    pub fn local(&self) -> &LocalStore {
        &self.local
    }

    /// Last-published configuration, resolved; defaults when absent or unreadable
    pub async fn load_durable(&self) -> SiteConfiguration {
        match self.durable.load().await {
            Ok(Some(value)) => resolve(&value),
            Ok(None) => {
                tracing::info!("No published configuration yet, using defaults");
                SiteConfiguration::defaults()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load published configuration, using defaults");
                SiteConfiguration::defaults()
            }
        }
    }

    /// Write to local storage (primary, backup and emergency keys)
    pub fn save_local(&self, config: &SiteConfiguration) -> Result<(), StoreError> {
        self.local.save(config)
    }

    /// Local draft resolved against the schema, if one exists
    pub fn load_local(&self) -> Option<SiteConfiguration> {
        self.local.recover().map(|config| resolve(&config.to_value()))
    }

    /// Send the configuration to the durable store
    pub async fn publish_durable(
        &self,
        config: &SiteConfiguration,
    ) -> Result<PublishReceipt, PublishError> {
        self.durable.publish(config).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::durable::FileDurableStore;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    fn config_store(dir: &std::path::Path) -> ConfigStore {
        let local = LocalStore::new(Arc::new(MemoryStorage::new()), Arc::new(MemoryStorage::new()));
        ConfigStore::new(local, Arc::new(FileDurableStore::new(dir.join("site-config.json"))))
    }

    #[tokio::test]
    async fn test_load_durable_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = config_store(dir.path());

        assert_eq!(store.load_durable().await, SiteConfiguration::defaults());
    }

    #[tokio::test]
    async fn test_load_durable_defaults_when_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site-config.json"), "{ nope").unwrap();
        let store = config_store(dir.path());

        assert_eq!(store.load_durable().await, SiteConfiguration::defaults());
    }

    #[tokio::test]
    async fn test_load_durable_resolves_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("site-config.json"), r##"{"themeColor":"#111111"}"##).unwrap();
        let store = config_store(dir.path());

        let config = store.load_durable().await;
        assert_eq!(config.theme_color(), "#111111");
        assert!(config.footer_style().is_some());
    }

    #[test]
    fn test_save_local_then_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = config_store(dir.path());
        let config = SiteConfiguration::from_value(json!({ "footerLinks": [] })).unwrap();

        store.save_local(&config).unwrap();

        let loaded = store.load_local().unwrap();
        assert_eq!(loaded, resolve(&config.to_value()));
    }
}
