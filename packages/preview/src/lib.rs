//! # Siteconf Preview
//!
//! Preview side of the site configuration pipeline: bootstraps a working
//! configuration, then follows the editor through full-replacement
//! messages.
//!
//! ```text
//! BootstrapChain ──▶ PreviewController ◀── Envelope (broadcast / SSE)
//!                        │        │
//!                        ▼        ▼
//!                    Renderer  StyleScope (--theme-color, ...)
//! ```

mod bootstrap;
mod controller;
mod error;
mod origin;
mod style;

pub use bootstrap::{
    BootstrapChain, BootstrapSource, DefaultsSource, HandoffSource, LocalDraftSource, ParentSource,
};
pub use siteconf_store::SharedConfig;
pub use controller::{Delivery, PreviewController, PreviewState, Renderer};
pub use error::DropReason;
pub use origin::OriginPolicy;
pub use style::{apply_colors, RootStyle, StyleScope, HERO_BADGE_COLOR_PROPERTY, THEME_COLOR_PROPERTY};
