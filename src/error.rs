//! Error types shared by the page runtime.

use thiserror::Error;

use crate::dom::NodeId;

/// A preference store rejected a write.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage quota exceeded writing '{key}'")]
    QuotaExceeded { key: String },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("clipboard access denied")]
    Denied,
    #[error("clipboard unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("reading config {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("parsing config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure inside a component initializer or event handler.
///
/// The page isolates these per component: one failing feature is logged
/// and the remaining components still run.
#[derive(Debug, Error)]
pub enum EnhanceError {
    #[error("event target {0:?} does not belong to this document")]
    UnknownTarget(NodeId),
    #[error("preference store: {0}")]
    Store(#[from] StoreError),
}
