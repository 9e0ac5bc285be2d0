//! Error types for the editor

use siteconf_store::{PublishError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Patch error: {0}")]
    Patch(#[from] crate::patch::PatchError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Schema error: {0}")]
    Schema(#[from] siteconf_schema::SchemaError),

    #[error("A publish is already in progress")]
    PublishInProgress,
}
