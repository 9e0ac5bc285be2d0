//! # Bootstrap Sources
//!
//! Where a preview finds its first configuration. Sources are tried in
//! order and the first hit wins (a priority chain, not a merge):
//!
//! 1. [`HandoffSource`]: session-scope copy written for the preview
//! 2. [`LocalDraftSource`]: the editor's primary local copy
//! 3. [`ParentSource`]: the embedding editor's shared configuration
//! 4. [`DefaultsSource`]: schema defaults, always succeeds
//!
//! A source that finds malformed data reports a miss; the chain moves on.

use siteconf_schema::{resolve, SiteConfiguration};
use siteconf_store::{LocalStore, SharedConfig};

pub trait BootstrapSource: Send + Sync {
    fn name(&self) -> &'static str;

    fn load(&self) -> Option<SiteConfiguration>;
}

pub struct HandoffSource {
    local: LocalStore,
}

impl HandoffSource {
    pub fn new(local: LocalStore) -> Self {
        Self { local }
    }
}

impl BootstrapSource for HandoffSource {
    fn name(&self) -> &'static str {
        "handoff"
    }

    fn load(&self) -> Option<SiteConfiguration> {
        self.local.preview_handoff()
    }
}

pub struct LocalDraftSource {
    local: LocalStore,
}

impl LocalDraftSource {
    pub fn new(local: LocalStore) -> Self {
        Self { local }
    }
}

impl BootstrapSource for LocalDraftSource {
    fn name(&self) -> &'static str {
        "local"
    }

    fn load(&self) -> Option<SiteConfiguration> {
        self.local.primary()
    }
}

pub struct ParentSource {
    shared: SharedConfig,
}

impl ParentSource {
    pub fn new(shared: SharedConfig) -> Self {
        Self { shared }
    }
}

impl BootstrapSource for ParentSource {
    fn name(&self) -> &'static str {
        "parent"
    }

    fn load(&self) -> Option<SiteConfiguration> {
        self.shared.get()
    }
}

pub struct DefaultsSource;

impl BootstrapSource for DefaultsSource {
    fn name(&self) -> &'static str {
        "defaults"
    }

    fn load(&self) -> Option<SiteConfiguration> {
        Some(SiteConfiguration::defaults())
    }
}

/// Ordered list of sources
pub struct BootstrapChain {
    sources: Vec<Box<dyn BootstrapSource>>,
}

impl BootstrapChain {
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Handoff, local draft, parent (when embedded), defaults
    pub fn standard(local: LocalStore, parent: Option<SharedConfig>) -> Self {
        let mut chain = Self::new()
            .with(HandoffSource::new(local.clone()))
            .with(LocalDraftSource::new(local));
        if let Some(shared) = parent {
            chain = chain.with(ParentSource::new(shared));
        }
        chain.with(DefaultsSource)
    }

    pub fn with(mut self, source: impl BootstrapSource + 'static) -> Self {
        self.sources.push(Box::new(source));
        self
    }

    pub fn source_names(&self) -> Vec<&'static str> {
        self.sources.iter().map(|source| source.name()).collect()
    }

    /// First configuration found, resolved against the schema, with the
    /// name of the source it came from. Falls back to defaults when no
    /// source hits.
    pub fn resolve(&self) -> (SiteConfiguration, &'static str) {
        for source in &self.sources {
            match source.load() {
                Some(config) => {
                    tracing::info!(source = source.name(), "Preview bootstrapped");
                    return (resolve(&config.to_value()), source.name());
                }
                None => tracing::debug!(source = source.name(), "Bootstrap source missed"),
            }
        }

        tracing::warn!("No bootstrap source produced a configuration, using defaults");
        (SiteConfiguration::defaults(), DefaultsSource.name())
    }
}

impl Default for BootstrapChain {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use siteconf_store::{keys, KeyValueStorage, MemoryStorage};
    use std::sync::Arc;

    fn stores() -> (LocalStore, Arc<MemoryStorage>, Arc<MemoryStorage>) {
        let local = Arc::new(MemoryStorage::new());
        let session = Arc::new(MemoryStorage::new());
        (LocalStore::new(local.clone(), session.clone()), local, session)
    }

    fn named(name: &str) -> SiteConfiguration {
        SiteConfiguration::from_value(json!({ "siteName": name })).unwrap()
    }

    fn site_name(config: &SiteConfiguration) -> Option<&str> {
        config.get("siteName").and_then(|n| n.as_str())
    }

    #[test]
    fn test_handoff_wins_over_local_draft() {
        let (store, _, _) = stores();
        store.save(&named("draft")).unwrap();
        store.write_preview_handoff(&named("handoff")).unwrap();

        let (config, source) = BootstrapChain::standard(store, None).resolve();
        assert_eq!(source, "handoff");
        assert_eq!(site_name(&config), Some("handoff"));
    }

    #[test]
    fn test_malformed_handoff_falls_through() {
        let (store, _, session) = stores();
        store.save(&named("draft")).unwrap();
        session.set(keys::PREVIEW_HANDOFF, "{\"siteName\": ").unwrap();

        let (config, source) = BootstrapChain::standard(store, None).resolve();
        assert_eq!(source, "local");
        assert_eq!(site_name(&config), Some("draft"));
    }

    #[test]
    fn test_parent_then_defaults() {
        let (store, _, _) = stores();
        let shared = SharedConfig::new();

        let (_, source) = BootstrapChain::standard(store.clone(), Some(shared.clone())).resolve();
        assert_eq!(source, "defaults");

        shared.set(named("parent"));
        let (config, source) = BootstrapChain::standard(store, Some(shared)).resolve();
        assert_eq!(source, "parent");
        assert_eq!(site_name(&config), Some("parent"));
    }

    #[test]
    fn test_bootstrap_result_is_resolved() {
        let (store, _, _) = stores();
        store.write_preview_handoff(&named("partial")).unwrap();

        let (config, _) = BootstrapChain::standard(store, None).resolve();
        assert!(config.footer_style().is_some());
        assert!(config.get("pages").is_some());
    }

    #[test]
    fn test_empty_chain_uses_defaults() {
        let (config, source) = BootstrapChain::new().resolve();
        assert_eq!(source, "defaults");
        assert_eq!(config, SiteConfiguration::defaults());
    }
}
