use thiserror::Error;

/// Why an incoming frame was not applied
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    #[error("origin '{0}' is not allowed")]
    Origin(String),

    #[error("malformed message: {0}")]
    Malformed(String),
}
