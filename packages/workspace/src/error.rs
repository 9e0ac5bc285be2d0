use crate::watcher::WatcherError;
use siteconf_store::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Rebuild failed: {0}")]
    Rebuild(String),

    #[error("Watcher error: {0}")]
    Watcher(#[from] WatcherError),

    #[error("Server is already running")]
    AlreadyServing,
}
