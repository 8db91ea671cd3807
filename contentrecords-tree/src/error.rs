//! Error types for tree ingestion.

use thiserror::Error;

/// Result type for tree operations.
pub type TreeResult<T> = Result<T, TreeError>;

/// Errors that can occur while ingesting a template document.
#[derive(Debug, Error)]
pub enum TreeError {
    /// The document is not valid JSON.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The document is not valid YAML.
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
