//! # Siteconf Store
//!
//! Persistence for the site configuration.
//!
//! ```text
//! ┌──────────────┐   save_local    ┌──────────────────────────────┐
//! │              │ ──────────────→ │ LocalStore (two KV scopes)   │
//! │ ConfigStore  │                 └──────────────────────────────┘
//! │              │ publish_durable ┌──────────────────────────────┐
//! │              │ ──────────────→ │ DurableStore (file or HTTP)  │
//! └──────────────┘ ←────────────── └──────────────────────────────┘
//!                   load_durable
//! ```

mod adapter;
mod atomic;
mod durable;
mod error;
mod local;
mod shared;
mod storage;

pub use adapter::ConfigStore;
pub use atomic::write_atomic;
pub use durable::{DurableStore, FileDurableStore, HttpDurableStore, PublishReceipt};
pub use error::{PublishError, StoreError};
pub use local::{keys, read_config, read_json, BackupEntry, LocalStore, SessionMeta};
pub use shared::SharedConfig;
pub use storage::{FileStorage, KeyValueStorage, MemoryStorage};
