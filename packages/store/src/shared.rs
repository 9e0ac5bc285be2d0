//! In-process copy of the editor's configuration that embedded previews
//! read at bootstrap (the parent context of a preview frame).

use siteconf_schema::SiteConfiguration;
use std::sync::Arc;
use tokio::sync::watch;

/// Observable configuration shared between an editor and the previews it
/// embeds
#[derive(Debug, Clone)]
pub struct SharedConfig {
    sender: Arc<watch::Sender<Option<SiteConfiguration>>>,
}

impl SharedConfig {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn set(&self, config: SiteConfiguration) {
        self.sender.send_replace(Some(config));
    }

    pub fn get(&self) -> Option<SiteConfiguration> {
        self.sender.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<SiteConfiguration>> {
        self.sender.subscribe()
    }
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_clones_see_the_latest_value() {
        let shared = SharedConfig::new();
        let reader = shared.clone();
        let mut changes = shared.subscribe();
        assert!(reader.get().is_none());

        let config = SiteConfiguration::from_value(json!({ "siteName": "Embedded" })).unwrap();
        shared.set(config.clone());

        assert_eq!(reader.get(), Some(config));
        assert!(changes.has_changed().unwrap());
    }
}
