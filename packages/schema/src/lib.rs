//! # Siteconf Schema
//!
//! Data model of the site configuration editor.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ sections: typed structs + Default impls     │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ schema: resolve(partial) → full config      │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ node/config: shared immutable tree          │
//! │ message: PreviewMessage, PublishResponse    │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use siteconf_schema::resolve;
//! use serde_json::json;
//!
//! let config = resolve(&json!({ "themeColor": "#0ea5e9" }));
//! assert_eq!(config.theme_color(), "#0ea5e9");
//! assert!(config.footer_style().is_some());
//! ```

mod config;
mod error;
mod message;
mod node;
mod schema;
pub mod sections;

pub use config::SiteConfiguration;
pub use error::SchemaError;
pub use message::{Envelope, PreviewMessage, PreviewMessageKind, PublishResponse};
pub use node::{ConfigNode, ObjectMap};
pub use schema::{resolve, resolve_config, Schema};
