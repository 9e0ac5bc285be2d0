//! Error types for the schema crate

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Configuration root must be an object")]
    NotAnObject,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
