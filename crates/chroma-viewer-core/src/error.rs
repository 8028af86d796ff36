//! Error taxonomy shared by the store, pagination, and session layers.
//!
//! Every fallible domain operation returns a [`ViewerError`]. The HTTP layer
//! is the only place that turns a variant into a status code.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the database client, pagination engine, and session store.
#[derive(Debug, Error)]
pub enum ViewerError {
    /// The database path does not exist on disk.
    #[error("database path '{}' does not exist", path.display())]
    PathNotFound {
        /// Path as supplied by the caller
        path: PathBuf,
    },

    /// No collection with this name exists in the open database.
    #[error("collection not found: {name}")]
    CollectionNotFound {
        /// Collection name
        name: String,
    },

    /// The path exists but is not a recognised Chroma database.
    #[error("'{}' is not a Chroma database: {reason}", path.display())]
    InvalidFormat {
        /// Path as supplied by the caller
        path: PathBuf,
        /// What the check tripped on
        reason: String,
    },

    /// A request parameter or body field failed validation.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The operation needs an open connection and there is none.
    #[error("database not connected, connect to a database first")]
    NotConnected,

    /// Unexpected failure inside the database engine.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ViewerError {
    /// Shorthand for [`ViewerError::Validation`].
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Shorthand for [`ViewerError::Internal`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// `true` for the not-found family (path or collection).
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::PathNotFound { .. } | Self::CollectionNotFound { .. }
        )
    }
}
