//! In-memory [`Store`] implementation for tests.
//!
//! Collections are kept in insertion order behind a `std::sync::RwLock`.
//! After [`Store::close`] every read fails with an internal error, which
//! mirrors a closed connection pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::ViewerError;
use crate::models::{Collection, Document};

use super::Store;

struct StoredCollection {
    name: String,
    documents: Vec<Document>,
}

/// In-memory store for tests.
pub struct InMemoryStore {
    collections: RwLock<Vec<StoredCollection>>,
    closed: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(Vec::new()),
            closed: AtomicBool::new(false),
        }
    }

    /// Add (or replace) a collection with the given documents.
    pub fn insert_collection(&self, name: &str, documents: Vec<Document>) {
        let mut collections = self.collections.write().unwrap();
        match collections.iter_mut().find(|c| c.name == name) {
            Some(existing) => existing.documents = documents,
            None => collections.push(StoredCollection {
                name: name.to_string(),
                documents,
            }),
        }
    }

    /// Builder form of [`insert_collection`](Self::insert_collection).
    pub fn with_collection(self, name: &str, documents: Vec<Document>) -> Self {
        self.insert_collection(name, documents);
        self
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), ViewerError> {
        if self.is_closed() {
            Err(ViewerError::internal("store is closed"))
        } else {
            Ok(())
        }
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, ViewerError> {
        self.ensure_open()?;
        let collections = self.collections.read().unwrap();
        Ok(collections
            .iter()
            .map(|c| Collection {
                name: c.name.clone(),
                document_count: c.documents.len() as u64,
            })
            .collect())
    }

    async fn count_documents(&self, collection: &str) -> Result<u64, ViewerError> {
        self.ensure_open()?;
        let collections = self.collections.read().unwrap();
        collections
            .iter()
            .find(|c| c.name == collection)
            .map(|c| c.documents.len() as u64)
            .ok_or_else(|| ViewerError::CollectionNotFound {
                name: collection.to_string(),
            })
    }

    async fn fetch_documents(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Document>, ViewerError> {
        self.ensure_open()?;
        let collections = self.collections.read().unwrap();
        let stored = collections
            .iter()
            .find(|c| c.name == collection)
            .ok_or_else(|| ViewerError::CollectionNotFound {
                name: collection.to_string(),
            })?;
        Ok(stored
            .documents
            .iter()
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}
