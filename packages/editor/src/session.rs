//! # Edit Session
//!
//! The editor's single in-memory configuration and everything that reacts
//! to it changing.
//!
//! Every edit follows the same order:
//!
//! ```text
//! patch ─▶ apply (new tree) ─▶ history ─▶ save_local ─▶ bus (events + preview)
//! ```
//!
//! The local write happens before the broadcast, so a listener that reads
//! storage on receipt sees the value that triggered the event. A failed
//! local write is reported as an error toast; editing continues.

use crate::bus::{DocumentEvent, PropagationBus};
use crate::guard::NavigationGuard;
use crate::notify::Notifier;
use crate::patch::{apply_patches, ConfigPatch, PatchError};
use crate::undo_stack::UndoStack;
use siteconf_schema::SiteConfiguration;
use siteconf_store::ConfigStore;

pub struct EditSession {
    config: SiteConfiguration,
    store: ConfigStore,
    bus: PropagationBus,
    history: UndoStack,
    notifier: Notifier,
    guard: NavigationGuard,
    expanded_sections: Vec<String>,
}

impl EditSession {
    /// Start a session from the last-published configuration
    pub async fn open(store: ConfigStore, bus: PropagationBus, notifier: Notifier) -> Self {
        let config = store.load_durable().await;
        tracing::info!(theme = config.theme_color(), "Editor session opened");

        let session = Self::with_config(config, store, bus, notifier);
        session.bus.announce(DocumentEvent::ConfigLoaded {
            config: session.config.clone(),
        });
        session
    }

    /// Start a session from a known configuration (e.g. a local draft)
    pub fn with_config(
        config: SiteConfiguration,
        store: ConfigStore,
        bus: PropagationBus,
        notifier: Notifier,
    ) -> Self {
        let expanded_sections = store.local().expanded_sections();
        let session = Self {
            config,
            store,
            bus,
            history: UndoStack::new(),
            notifier,
            guard: NavigationGuard::new(),
            expanded_sections,
        };

        // A theme key left by an earlier session must not outrank this one
        session.write_theme_key();
        session.write_preview_handoff();
        session
    }

    pub fn config(&self) -> &SiteConfiguration {
        &self.config
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    pub fn bus(&self) -> &PropagationBus {
        &self.bus
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn guard(&self) -> &NavigationGuard {
        &self.guard
    }

    pub fn history(&self) -> &UndoStack {
        &self.history
    }

    /// Apply one patch from a form component
    pub fn apply(&mut self, patch: ConfigPatch) -> Result<&SiteConfiguration, PatchError> {
        self.history.apply(&patch, &mut self.config)?;
        self.persist(std::slice::from_ref(&patch));
        self.bus.publish_change(&patch, &self.config);
        Ok(&self.config)
    }

    /// Apply patches as one edit (one undo step, one local write).
    ///
    /// All or nothing: if any patch fails the session is unchanged.
    pub fn apply_all(&mut self, patches: Vec<ConfigPatch>) -> Result<&SiteConfiguration, PatchError> {
        if patches.is_empty() {
            return Ok(&self.config);
        }

        let next = apply_patches(&self.config, &patches)?;

        let batching = self.history.is_batching();
        if !batching {
            self.history.begin_batch();
        }
        for patch in &patches {
            self.history.record(patch, &self.config, &next);
        }
        if !batching {
            self.history.end_batch();
        }

        self.config = next;
        self.persist(&patches);
        self.bus.publish_changes(&patches, &self.config);
        Ok(&self.config)
    }

    pub fn undo(&mut self) -> bool {
        let changed = self.history.undo(&mut self.config);
        if changed {
            self.refresh();
        }
        tracing::debug!(
            changed,
            undo_levels = self.history.undo_levels(),
            redo_levels = self.history.redo_levels(),
            "Undo"
        );
        changed
    }

    pub fn redo(&mut self) -> bool {
        let changed = self.history.redo(&mut self.config);
        if changed {
            self.refresh();
        }
        tracing::debug!(
            changed,
            undo_levels = self.history.undo_levels(),
            redo_levels = self.history.redo_levels(),
            "Redo"
        );
        changed
    }

    pub fn expanded_sections(&self) -> &[String] {
        &self.expanded_sections
    }

    pub fn is_expanded(&self, section: &str) -> bool {
        self.expanded_sections.iter().any(|s| s == section)
    }

    /// Record a panel's expansion state (a UI preference worth persisting)
    pub fn set_expanded(&mut self, section: &str, expanded: bool) {
        let present = self.is_expanded(section);
        match (expanded, present) {
            (true, false) => self.expanded_sections.push(section.to_string()),
            (false, true) => self.expanded_sections.retain(|s| s != section),
            _ => return,
        }

        if let Err(e) = self
            .store
            .local()
            .set_expanded_sections(&self.expanded_sections)
        {
            tracing::warn!(error = %e, "Failed to persist expanded sections");
        }
    }

    /// Swap in a configuration produced outside the patch path (publish
    /// timestamps, reverts). Not recorded in history.
    pub(crate) fn replace_config(&mut self, config: SiteConfiguration) {
        self.config = config;
    }

    fn refresh(&mut self) {
        self.persist(&[]);
        self.bus.announce(DocumentEvent::ConfigLoaded {
            config: self.config.clone(),
        });
    }

    fn persist(&self, patches: &[ConfigPatch]) {
        self.guard.mark_dirty();

        if let Err(e) = self.store.save_local(&self.config) {
            self.notifier
                .error(format!("Changes could not be saved locally: {}", e));
        }
        self.write_preview_handoff();

        let touches_theme = patches.is_empty()
            || patches
                .iter()
                .any(|patch| patch.root_key() == Some("themeColor"));
        if touches_theme {
            self.write_theme_key();
        }
    }

    fn write_theme_key(&self) {
        if let Err(e) = self
            .store
            .local()
            .set_theme_color(self.config.theme_color())
        {
            tracing::warn!(error = %e, "Failed to persist theme color");
        }
    }

    /// Session-scope copy a preview opened from this editor bootstraps from
    fn write_preview_handoff(&self) {
        if let Err(e) = self.store.local().write_preview_handoff(&self.config) {
            tracing::warn!(error = %e, "Failed to write preview handoff");
        }
    }
}
