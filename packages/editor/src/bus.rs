//! # Propagation Bus
//!
//! Fans every configuration change out over two channels:
//!
//! ```text
//!                    ┌──────────────────────────┐
//!   patch applied ──▶│      PropagationBus      │
//!                    └────────────┬─────────────┘
//!                 ┌───────────────┴────────────────┐
//!                 ▼                                ▼
//!   ┌──────────────────────────┐    ┌──────────────────────────────┐
//!   │ EventBus (same document) │    │ PreviewChannel (cross-context│
//!   │ sync, dispatch order     │    │ broadcast of JSON envelopes) │
//!   └──────────────────────────┘    └──────────────────────────────┘
//! ```
//!
//! The same-document channel delivers synchronously, in dispatch order, to
//! the subscribers registered when dispatch starts. The cross-context
//! channel is independent and eventually consistent: a receiver that lags
//! loses old frames, never the newest one.

use crate::patch::ConfigPatch;
use serde_json::Value;
use siteconf_schema::{Envelope, PreviewMessage, SiteConfiguration};
use siteconf_store::SharedConfig;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Event delivered on the same-document channel
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentEvent {
    /// Generic refresh: re-read everything from `config`
    ConfigLoaded { config: SiteConfiguration },

    /// The durable copy changed
    ConfigPublished {
        config: SiteConfiguration,
        timestamp: String,
    },

    FooterConfigUpdated {
        /// Dotted path (or root key) that changed
        target: String,
        value: Value,
        config: SiteConfiguration,
    },

    FooterCompanyNameUpdated { value: Value },

    FooterDescriptionUpdated { value: Value },

    InfoBarColorChanged { property: String, color: Value },

    PublishingStarted,
}

impl DocumentEvent {
    /// Event name as seen by document-level listeners
    pub fn name(&self) -> &'static str {
        match self {
            DocumentEvent::ConfigLoaded { .. } => "config-loaded",
            DocumentEvent::ConfigPublished { .. } => "config-published",
            DocumentEvent::FooterConfigUpdated { .. } => "footer-config-updated",
            DocumentEvent::FooterCompanyNameUpdated { .. } => "footer-company-name-updated",
            DocumentEvent::FooterDescriptionUpdated { .. } => "footer-description-updated",
            DocumentEvent::InfoBarColorChanged { .. } => "infobar-color-changed",
            DocumentEvent::PublishingStarted => "publishing-started",
        }
    }

    /// Full configuration carried by the event, if any
    pub fn config(&self) -> Option<&SiteConfiguration> {
        match self {
            DocumentEvent::ConfigLoaded { config }
            | DocumentEvent::ConfigPublished { config, .. }
            | DocumentEvent::FooterConfigUpdated { config, .. } => Some(config),
            _ => None,
        }
    }
}

/// Same-document events raised by one applied patch
pub fn events_for_patch(patch: &ConfigPatch, config: &SiteConfiguration) -> Vec<DocumentEvent> {
    let root = patch.root_key().unwrap_or_default();
    let value = patch.value().clone();

    if root.starts_with("footer") {
        let mut events = vec![DocumentEvent::FooterConfigUpdated {
            target: patch.target(),
            value: value.clone(),
            config: config.clone(),
        }];
        match (root, patch.is_flat()) {
            ("footerCompanyName", true) => {
                events.push(DocumentEvent::FooterCompanyNameUpdated { value })
            }
            ("footerDescription", true) => {
                events.push(DocumentEvent::FooterDescriptionUpdated { value })
            }
            _ => {}
        }
        return events;
    }

    if root == "infoBar" {
        if patch.is_flat() {
            return vec![DocumentEvent::InfoBarColorChanged {
                property: root.to_string(),
                color: value,
            }];
        }
        if let Some(leaf) = patch.leaf_key().filter(|leaf| leaf.ends_with("Color")) {
            return vec![DocumentEvent::InfoBarColorChanged {
                property: leaf.to_string(),
                color: value,
            }];
        }
    }

    vec![DocumentEvent::ConfigLoaded {
        config: config.clone(),
    }]
}

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Arc<dyn Fn(&DocumentEvent) + Send + Sync>;

/// Synchronous same-document publish/subscribe service
#[derive(Default)]
pub struct EventBus {
    listeners: Mutex<Vec<(SubscriptionId, Listener)>>,
    next_id: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&DocumentEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(listener)));
        id
    }

    /// Returns false when the id was not subscribed
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut listeners = self.lock();
        let before = listeners.len();
        listeners.retain(|(existing, _)| *existing != id);
        listeners.len() != before
    }

    /// Deliver to every current subscriber, in subscription order.
    ///
    /// The subscriber list is snapshotted first: listeners may subscribe or
    /// unsubscribe from inside a callback without affecting this dispatch.
    pub fn dispatch(&self, event: &DocumentEvent) -> usize {
        let snapshot: Vec<Listener> = self
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        tracing::debug!(event = event.name(), listeners = snapshot.len(), "Dispatching document event");
        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Listener)>> {
        // Listeners run outside the lock
        self.listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Cross-context message channel towards preview surfaces
#[derive(Debug, Clone)]
pub struct PreviewChannel {
    origin: String,
    sender: broadcast::Sender<Envelope>,
}

impl PreviewChannel {
    pub fn new(origin: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self::from_sender(origin, sender)
    }

    /// Post into an existing broadcast channel (e.g. the server's SSE feed)
    pub fn from_sender(origin: impl Into<String>, sender: broadcast::Sender<Envelope>) -> Self {
        Self {
            origin: origin.into(),
            sender,
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.sender.subscribe()
    }

    /// At least one preview surface is listening
    pub fn is_active(&self) -> bool {
        self.sender.receiver_count() > 0
    }

    /// Serialize and post a message; returns the number of receivers.
    ///
    /// Never fails the caller: with no receivers the frame is dropped.
    pub fn post(&self, message: &PreviewMessage) -> usize {
        let envelope = match Envelope::new(self.origin.clone(), message) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize preview message");
                return 0;
            }
        };

        match self.sender.send(envelope) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::trace!("No preview surface attached, dropping message");
                0
            }
        }
    }
}

/// Fan-out over both channels
#[derive(Clone)]
pub struct PropagationBus {
    events: Arc<EventBus>,
    preview: Option<PreviewChannel>,
    shared: Option<SharedConfig>,
}

impl PropagationBus {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            events,
            preview: None,
            shared: None,
        }
    }

    pub fn with_preview(mut self, channel: PreviewChannel) -> Self {
        self.preview = Some(channel);
        self
    }

    /// Keep `shared` at the latest configuration for previews embedded in
    /// this process
    pub fn with_shared(mut self, shared: SharedConfig) -> Self {
        self.shared = Some(shared);
        self
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn preview(&self) -> Option<&PreviewChannel> {
        self.preview.as_ref()
    }

    /// Announce the result of an applied patch on both channels
    pub fn publish_change(&self, patch: &ConfigPatch, config: &SiteConfiguration) {
        for event in events_for_patch(patch, config) {
            self.events.dispatch(&event);
        }
        self.post_config(config);
    }

    /// Announce several patches that produced `config`; previews get one frame
    pub fn publish_changes(&self, patches: &[ConfigPatch], config: &SiteConfiguration) {
        for patch in patches {
            for event in events_for_patch(patch, config) {
                self.events.dispatch(&event);
            }
        }
        self.post_config(config);
    }

    /// Dispatch an event; events carrying a configuration also reach previews
    pub fn announce(&self, event: DocumentEvent) {
        self.events.dispatch(&event);
        if let Some(config) = event.config() {
            self.post_config(config);
        }
    }

    fn post_config(&self, config: &SiteConfiguration) {
        if let Some(shared) = &self.shared {
            shared.set(config.clone());
        }
        if let Some(channel) = &self.preview {
            channel.post(&PreviewMessage::config_update(config.clone()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn names(events: &[DocumentEvent]) -> Vec<&'static str> {
        events.iter().map(DocumentEvent::name).collect()
    }

    #[test]
    fn test_footer_patches_raise_footer_events() {
        let config = SiteConfiguration::defaults();

        let patch = ConfigPatch::set("footerCompanyName", json!("Acme"));
        assert_eq!(
            names(&events_for_patch(&patch, &config)),
            vec!["footer-config-updated", "footer-company-name-updated"]
        );

        let patch = ConfigPatch::set_path(["footerStyle", "titleColor"], json!("#112233"));
        let events = events_for_patch(&patch, &config);
        assert_eq!(names(&events), vec!["footer-config-updated"]);
        assert!(matches!(
            &events[0],
            DocumentEvent::FooterConfigUpdated { target, .. } if target == "footerStyle.titleColor"
        ));
    }

    #[test]
    fn test_infobar_color_and_generic_events() {
        let config = SiteConfiguration::defaults();

        let patch = ConfigPatch::set_path(["infoBar", "backgroundColor"], json!("#000"));
        assert_eq!(
            events_for_patch(&patch, &config),
            vec![DocumentEvent::InfoBarColorChanged {
                property: "backgroundColor".to_string(),
                color: json!("#000"),
            }]
        );

        let patch = ConfigPatch::set_path(["infoBar", "text"], json!("Open today"));
        assert_eq!(names(&events_for_patch(&patch, &config)), vec!["config-loaded"]);

        let patch = ConfigPatch::set("siteName", json!("Shop"));
        assert_eq!(names(&events_for_patch(&patch, &config)), vec!["config-loaded"]);
    }

    #[test]
    fn test_dispatch_reaches_subscribers_in_order() {
        let bus = EventBus::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let log = Arc::clone(&log);
            bus.subscribe(move |event| log.lock().unwrap().push(format!("{}:{}", tag, event.name())));
        }

        assert_eq!(bus.dispatch(&DocumentEvent::PublishingStarted), 2);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["first:publishing-started", "second:publishing-started"]
        );
    }

    #[test]
    fn test_subscribers_added_during_dispatch_miss_that_event() {
        let bus = Arc::new(EventBus::new());
        let late_calls = Arc::new(AtomicU64::new(0));

        let bus_inner = Arc::clone(&bus);
        let late = Arc::clone(&late_calls);
        bus.subscribe(move |_| {
            let late = Arc::clone(&late);
            bus_inner.subscribe(move |_| {
                late.fetch_add(1, Ordering::SeqCst);
            });
        });

        bus.dispatch(&DocumentEvent::PublishingStarted);
        assert_eq!(late_calls.load(Ordering::SeqCst), 0);
        assert_eq!(bus.subscriber_count(), 2);
    }

    #[test]
    fn test_unsubscribe() {
        let bus = EventBus::new();
        let id = bus.subscribe(|_| {});

        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.dispatch(&DocumentEvent::PublishingStarted), 0);
    }

    #[test]
    fn test_publish_change_fans_out_to_both_channels() {
        let events = Arc::new(EventBus::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        events.subscribe(move |event| sink.lock().unwrap().push(event.name()));

        let channel = PreviewChannel::new("http://localhost:3000", 8);
        let mut receiver = channel.subscribe();
        let bus = PropagationBus::new(events).with_preview(channel);

        let config = SiteConfiguration::from_value(json!({ "siteName": "Shop" })).unwrap();
        bus.publish_change(&ConfigPatch::set("siteName", json!("Shop")), &config);

        assert_eq!(*seen.lock().unwrap(), vec!["config-loaded"]);

        let envelope = receiver.try_recv().unwrap();
        assert_eq!(envelope.origin, "http://localhost:3000");
        let message = PreviewMessage::from_json(&envelope.payload).unwrap();
        assert_eq!(message.config, config);
    }

    #[test]
    fn test_post_without_receivers_is_not_an_error() {
        let channel = PreviewChannel::new("http://localhost:3000", 8);
        assert!(!channel.is_active());
        assert_eq!(channel.post(&PreviewMessage::config_update(SiteConfiguration::defaults())), 0);
    }

    #[test]
    fn test_shared_config_follows_changes_and_announcements() {
        let shared = SharedConfig::new();
        let bus = PropagationBus::new(Arc::new(EventBus::new())).with_shared(shared.clone());

        let config = SiteConfiguration::from_value(json!({ "siteName": "Shop" })).unwrap();
        bus.publish_change(&ConfigPatch::set("siteName", json!("Shop")), &config);
        assert_eq!(shared.get(), Some(config));

        bus.announce(DocumentEvent::PublishingStarted);
        assert!(shared.get().is_some());

        let loaded = SiteConfiguration::defaults();
        bus.announce(DocumentEvent::ConfigLoaded { config: loaded.clone() });
        assert_eq!(shared.get(), Some(loaded));
    }
}
