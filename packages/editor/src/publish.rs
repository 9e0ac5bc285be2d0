//! # Save / Publish
//!
//! Coordinates the two persistence actions.
//!
//! ```text
//!          save()                      publish()
//!   Idle ──────▶ Saving ──▶ Idle   Idle ──────▶ Publishing
//!                                                  │
//!                          ┌───────────────────────┴──────────────┐
//!                          ▼                                      ▼
//!                   PublishSucceeded ──▶ ReloadPending      PublishFailed ──▶ Idle
//! ```
//!
//! ## Save
//! Local only. Snapshots the configuration with session metadata and shows
//! a short acknowledgment. Never touches the network.
//!
//! ## Publish
//! 1. Suppress the navigation prompt for [`SUPPRESSION_WINDOW`]
//! 2. Snapshot the configuration, taking the freshest theme color from
//!    local storage
//! 3. Write the snapshot locally (pre-publish safety copy)
//! 4. Send it to the durable store
//! 5. On success: stamp `lastPublished`, write locally again, announce
//!    `config-published`, schedule a reload of the editor
//! 6. On failure: show the error and return to `Idle`
//!
//! A successful publish may restart the serving process, possibly on
//! another port. The reload is what makes the editor observe the new
//! durable state, so publish is only complete once it is scheduled.

use crate::bus::DocumentEvent;
use crate::errors::EditorError;
use crate::guard::SUPPRESSION_WINDOW;
use crate::patch::{apply_patch, ConfigPatch};
use crate::session::EditSession;
use chrono::Utc;
use serde_json::json;
use siteconf_schema::SiteConfiguration;
use siteconf_store::{PublishError, PublishReceipt, SessionMeta};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Reload delay when the server kept running
pub const RELOAD_DELAY: Duration = Duration::from_millis(1500);

/// Reload delay when the server restarted
pub const RESTART_RELOAD_DELAY: Duration = Duration::from_secs(3);

/// Query parameter used to bust caches on reload
pub const CACHE_BUST_PARAM: &str = "_t";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishState {
    Idle,
    Saving,
    Publishing,
    PublishSucceeded,
    ReloadPending,
    PublishFailed,
}

/// Performs the reload scheduled after a publish
pub trait Navigator: Send + Sync {
    fn navigate(&self, target: &Url);
}

/// Reload scheduled by a successful publish
#[derive(Debug, Clone, PartialEq)]
pub struct ReloadPlan {
    pub target: Url,
    pub delay: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PublishOutcome {
    Published {
        receipt: PublishReceipt,
        reload: ReloadPlan,
    },
    Failed {
        error: PublishError,
    },
}

impl PublishOutcome {
    pub fn is_published(&self) -> bool {
        matches!(self, PublishOutcome::Published { .. })
    }
}

/// Where to send the editor after a publish: same address, or the new
/// port when the server restarted elsewhere, plus a cache-busting param.
pub fn reload_target(editor_url: &Url, receipt: &PublishReceipt, now_millis: i64) -> Url {
    let mut target = editor_url.clone();

    if receipt.server_restarted {
        if let Some(port) = receipt.new_port {
            if target.set_port(Some(port)).is_err() {
                tracing::warn!(url = %editor_url, port, "Cannot move editor URL to new port");
            }
        }
    }

    let kept: Vec<(String, String)> = target
        .query_pairs()
        .filter(|(key, _)| key != CACHE_BUST_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    target
        .query_pairs_mut()
        .clear()
        .extend_pairs(&kept)
        .append_pair(CACHE_BUST_PARAM, &now_millis.to_string());

    target
}

pub fn reload_delay(receipt: &PublishReceipt) -> Duration {
    if receipt.server_restarted {
        RESTART_RELOAD_DELAY
    } else {
        RELOAD_DELAY
    }
}

pub struct PublishController {
    state: PublishState,
    editor_url: Url,
    navigator: Arc<dyn Navigator>,
}

impl PublishController {
    pub fn new(editor_url: Url, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            state: PublishState::Idle,
            editor_url,
            navigator,
        }
    }

    pub fn state(&self) -> PublishState {
        self.state
    }

    pub fn editor_url(&self) -> &Url {
        &self.editor_url
    }

    fn transition(&mut self, next: PublishState) {
        tracing::debug!(from = ?self.state, to = ?next, "Publish state");
        self.state = next;
    }

    /// Save the current configuration locally with session metadata
    pub fn save(&mut self, session: &EditSession) -> Result<SessionMeta, EditorError> {
        if self.state == PublishState::Publishing {
            return Err(EditorError::PublishInProgress);
        }
        self.transition(PublishState::Saving);

        let local = session.store().local();
        let meta = SessionMeta {
            saved_at: Utc::now(),
            theme_color: local
                .theme_color()
                .unwrap_or_else(|| session.config().theme_color().to_string()),
            expanded_sections: session.expanded_sections().to_vec(),
        };

        let result = session
            .store()
            .save_local(session.config())
            .and_then(|()| local.set_session_meta(&meta));
        self.transition(PublishState::Idle);

        match result {
            Ok(()) => {
                session.guard().mark_clean();
                session.notifier().success("Configuration saved");
                Ok(meta)
            }
            Err(e) => {
                session.notifier().error(format!("Save failed: {}", e));
                Err(e.into())
            }
        }
    }

    /// Publish the session's configuration to the durable store
    pub async fn publish(&mut self, session: &mut EditSession) -> Result<PublishOutcome, EditorError> {
        if self.state == PublishState::Publishing {
            return Err(EditorError::PublishInProgress);
        }
        self.transition(PublishState::Publishing);

        // 1
        session.guard().suppress(SUPPRESSION_WINDOW);
        session.bus().announce(DocumentEvent::PublishingStarted);

        // 2
        let snapshot = freshest_snapshot(session);

        // 3
        if let Err(e) = session.store().save_local(&snapshot) {
            tracing::warn!(error = %e, "Pre-publish local copy failed");
        }

        // 4
        let result = session.store().publish_durable(&snapshot).await;
        match result {
            Ok(receipt) => Ok(self.finish_published(session, snapshot, receipt)),
            Err(error) => {
                self.transition(PublishState::PublishFailed);
                session.notifier().error(format!("Publish failed: {}", error));
                session.guard().lift();
                self.transition(PublishState::Idle);
                Ok(PublishOutcome::Failed { error })
            }
        }
    }

    fn finish_published(
        &mut self,
        session: &mut EditSession,
        snapshot: SiteConfiguration,
        receipt: PublishReceipt,
    ) -> PublishOutcome {
        self.transition(PublishState::PublishSucceeded);

        let stamp = ConfigPatch::set("lastPublished", json!(receipt.timestamp));
        let published = apply_patch(&snapshot, &stamp).unwrap_or(snapshot);

        if let Err(e) = session.store().save_local(&published) {
            tracing::warn!(error = %e, "Post-publish local copy failed");
        }
        session.replace_config(published.clone());
        session.guard().mark_clean();
        session.bus().announce(DocumentEvent::ConfigPublished {
            config: published,
            timestamp: receipt.timestamp.clone(),
        });

        let reload = ReloadPlan {
            target: reload_target(&self.editor_url, &receipt, Utc::now().timestamp_millis()),
            delay: reload_delay(&receipt),
        };
        tracing::info!(
            target_url = %reload.target,
            delay_ms = reload.delay.as_millis() as u64,
            restarted = receipt.server_restarted,
            "Published, reload scheduled"
        );
        session.notifier().success("Published! Reloading…");

        self.schedule_reload(&reload);
        self.transition(PublishState::ReloadPending);

        PublishOutcome::Published { receipt, reload }
    }

    fn schedule_reload(&self, reload: &ReloadPlan) {
        let navigator = Arc::clone(&self.navigator);
        let ReloadPlan { target, delay } = reload.clone();

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    navigator.navigate(&target);
                });
            }
            Err(_) => navigator.navigate(&target),
        }
    }
}

/// The session's configuration with the theme color from local storage,
/// which a sibling component may have changed more recently
fn freshest_snapshot(session: &EditSession) -> SiteConfiguration {
    let config = session.config().clone();
    match session.store().local().theme_color() {
        Some(theme) if theme != config.theme_color() => {
            apply_patch(&config, &ConfigPatch::set("themeColor", json!(theme))).unwrap_or(config)
        }
        _ => config,
    }
}
