//! Error types for the record store.

use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// No record with this id (and type, when scoped).
    #[error("record not found: {id}")]
    NotFound { id: i64 },

    /// Operation needs a non-zero record id.
    #[error("record id is required")]
    MissingId,

    /// Field update without a bind key.
    #[error("bind key is required")]
    MissingBindKey,

    /// Empty store path.
    #[error("store path is required")]
    MissingPath,

    /// IO error (creating the store directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Schema creation failed for this store path.
    #[error("schema initialization failed: {0}")]
    Schema(String),

    /// A thread panicked while holding the connection.
    #[error("store connection lock poisoned")]
    LockPoisoned,
}
