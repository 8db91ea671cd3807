//! Error types for the rendering engine.

use contentrecords_store::StoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors collected while rendering a component instance.
///
/// Rendering never aborts on these: they are returned next to a placeholder
/// or partial result and the host decides what to do with them.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The component instance could not be decoded into a configuration.
    #[error("decode error at {path} ({key}): {message}")]
    Decode {
        path: String,
        key: String,
        message: String,
    },

    /// Required configuration is missing or has the wrong shape.
    #[error("invalid configuration: {0}")]
    Validation(String),

    /// A store operation failed.
    #[error("{operation} failed: {source}")]
    Store {
        operation: &'static str,
        #[source]
        source: StoreError,
    },

    /// An uploaded file could not be persisted.
    #[error("upload failed: {0}")]
    Upload(#[from] std::io::Error),

    /// A form action referenced a record id that is not an integer.
    #[error("invalid record_id")]
    InvalidRecordId,

    /// An inline-edit request body was not a JSON object.
    #[error("inline parse failed: {0}")]
    InlinePayload(#[from] serde_json::Error),

    /// A single-field inline update was rejected by the store.
    #[error("inline update failed: {0}")]
    InlineUpdate(StoreError),
}

impl EngineError {
    /// Returns a mapper that tags a store error with the failed operation.
    pub(crate) fn store(operation: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| EngineError::Store { operation, source }
    }
}
