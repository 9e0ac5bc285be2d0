//! # Preview Controller
//!
//! ```text
//!  Uninitialized ──bootstrap()──▶ Bootstrapping ──▶ Live
//!        │                                           ▲
//!        └───────────── accepted message ────────────┘
//! ```
//!
//! - `Uninitialized` renders the placeholder, never defaults
//! - `bootstrap()` walks the [`BootstrapChain`]
//! - `Live` accepts full-replacement [`PreviewMessage`]s and re-renders
//!   synchronously on receipt
//!
//! An accepted message before bootstrap completes is the freshest state
//! available, so it moves the controller straight to `Live`.
//!
//! Incoming messages are authoritative: the working copy becomes exactly
//! the message's configuration, never a merge. Rejected or malformed
//! messages are logged and dropped.

use crate::bootstrap::BootstrapChain;
use crate::error::DropReason;
use crate::origin::OriginPolicy;
use crate::style::{apply_colors, StyleScope};
use siteconf_schema::{Envelope, PreviewMessage, SiteConfiguration};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewState {
    Uninitialized,
    Bootstrapping,
    Live,
}

/// Consumer of the working configuration (`None` renders the placeholder)
pub trait Renderer {
    fn render(&mut self, config: Option<&SiteConfiguration>);
}

/// Result of handing a frame to the controller
#[derive(Debug, Clone, PartialEq)]
pub enum Delivery {
    Applied,
    Dropped(DropReason),
}

pub struct PreviewController<R, S> {
    state: PreviewState,
    config: Option<SiteConfiguration>,
    theme_color: Option<String>,
    policy: OriginPolicy,
    chain: BootstrapChain,
    renderer: R,
    style: S,
}

impl<R: Renderer, S: StyleScope> PreviewController<R, S> {
    pub fn new(policy: OriginPolicy, chain: BootstrapChain, renderer: R, style: S) -> Self {
        let mut controller = Self {
            state: PreviewState::Uninitialized,
            config: None,
            theme_color: None,
            policy,
            chain,
            renderer,
            style,
        };
        controller.renderer.render(None);
        controller
    }

    pub fn state(&self) -> PreviewState {
        self.state
    }

    /// Working configuration; `None` until bootstrapped
    pub fn config(&self) -> Option<&SiteConfiguration> {
        self.config.as_ref()
    }

    pub fn theme_color(&self) -> Option<&str> {
        self.theme_color.as_deref()
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn style(&self) -> &S {
        &self.style
    }

    /// Load the initial configuration from the bootstrap chain.
    ///
    /// Only acts in `Uninitialized`; returns the working configuration.
    pub fn bootstrap(&mut self) -> Option<&SiteConfiguration> {
        if self.state == PreviewState::Uninitialized {
            self.state = PreviewState::Bootstrapping;
            let (config, _source) = self.chain.resolve();
            let theme = config.theme_color().to_string();
            self.replace(config, theme);
        }
        self.config.as_ref()
    }

    /// Accept or drop a cross-context frame
    pub fn receive(&mut self, envelope: &Envelope) -> Delivery {
        if !self.policy.allows(&envelope.origin) {
            return self.drop_frame(DropReason::Origin(envelope.origin.clone()));
        }

        match PreviewMessage::from_json(&envelope.payload) {
            Ok(message) => {
                self.replace(message.config, message.theme_color);
                Delivery::Applied
            }
            Err(e) => self.drop_frame(DropReason::Malformed(e.to_string())),
        }
    }

    /// Accept or drop an envelope serialized as JSON text (SSE frames)
    pub fn receive_text(&mut self, text: &str) -> Delivery {
        match serde_json::from_str::<Envelope>(text) {
            Ok(envelope) => self.receive(&envelope),
            Err(e) => self.drop_frame(DropReason::Malformed(e.to_string())),
        }
    }

    /// Apply frames until the channel closes. Lagging skips to the newest
    /// frames; the next accepted one replaces everything anyway.
    pub async fn run(&mut self, mut receiver: broadcast::Receiver<Envelope>) {
        loop {
            match receiver.recv().await {
                Ok(envelope) => {
                    self.receive(&envelope);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Preview lagged behind the editor");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Preview channel closed");
                    break;
                }
            }
        }
    }

    fn replace(&mut self, config: SiteConfiguration, theme_color: String) {
        apply_colors(&mut self.style, &theme_color, &config);
        self.renderer.render(Some(&config));
        self.config = Some(config);
        self.theme_color = Some(theme_color);
        self.state = PreviewState::Live;
    }

    fn drop_frame(&self, reason: DropReason) -> Delivery {
        tracing::warn!(%reason, "Dropping preview message");
        Delivery::Dropped(reason)
    }
}
