//! Storage abstraction for Chroma Viewer.
//!
//! The [`Store`] trait is the read-only database client contract. The
//! SQLite-backed Chroma implementation lives in the app crate;
//! [`memory::InMemoryStore`] backs tests.
//!
//! Implementations must be `Send + Sync`: one open store is shared by every
//! concurrent request.

pub mod memory;

use async_trait::async_trait;

use crate::error::ViewerError;
use crate::models::{Collection, Document};

/// Read-only access to one opened database.
///
/// # Operations
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`list_collections`](Store::list_collections) | All collections with counts, stable order |
/// | [`count_documents`](Store::count_documents) | Size of one collection |
/// | [`fetch_documents`](Store::fetch_documents) | Offset/limit slice of one collection |
/// | [`close`](Store::close) | Release the underlying resource (idempotent) |
#[async_trait]
pub trait Store: Send + Sync {
    /// List every collection with its document count.
    ///
    /// The order is stable for the lifetime of the store.
    async fn list_collections(&self) -> Result<Vec<Collection>, ViewerError>;

    /// Count the documents of `collection`.
    ///
    /// Fails with [`ViewerError::CollectionNotFound`] for unknown names.
    async fn count_documents(&self, collection: &str) -> Result<u64, ViewerError>;

    /// Fetch at most `limit` documents starting at zero-based `offset`.
    ///
    /// An `offset` past the end yields an empty vector, not an error.
    async fn fetch_documents(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Document>, ViewerError>;

    /// Release the underlying resource. Calling it again is a no-op.
    async fn close(&self);
}
