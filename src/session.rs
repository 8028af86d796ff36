//! Process-wide session: at most one open database connection.
//!
//! The [`SessionStore`] owns the active [`Connection`] and serializes the
//! two mutating transitions, [`connect`](SessionStore::connect) and
//! [`disconnect`](SessionStore::disconnect), behind a single async mutex.
//! Readers take a cheap `Arc` clone of the current connection and never
//! wait on a transition longer than the pointer swap.
//!
//! # Lifecycle
//!
//! ```text
//! uninitialized ──connect──▶ connected ──disconnect──▶ disconnected
//!                              │   ▲
//!                              └───┘ connect (replace)
//! ```
//!
//! A second `connect` replaces the active connection. The new store is
//! opened first; only once it is open is the old one swapped out and
//! closed. A failed open leaves the session exactly as it was.
//!
//! There is no reconnection or health checking: a connection is assumed
//! valid until an operation against it fails, and that error is surfaced
//! to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};

use chroma_viewer_core::store::Store;
use chroma_viewer_core::ViewerError;

use crate::chroma_store::ChromaStore;
use crate::config::DbConfig;

/// Opens a [`Store`] for a filesystem path.
///
/// The production opener is [`ChromaOpener`]; tests plug in in-memory stores.
#[async_trait]
pub trait StoreOpener: Send + Sync {
    async fn open(&self, path: &Path) -> Result<Arc<dyn Store>, ViewerError>;
}

/// Opens Chroma persistent stores read-only.
pub struct ChromaOpener {
    config: DbConfig,
}

impl ChromaOpener {
    pub fn new(config: DbConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl StoreOpener for ChromaOpener {
    async fn open(&self, path: &Path) -> Result<Arc<dyn Store>, ViewerError> {
        let store = ChromaStore::open(path, &self.config).await?;
        Ok(Arc::new(store))
    }
}

/// A live handle to an opened database.
pub struct Connection {
    path: PathBuf,
    opened_at: DateTime<Utc>,
    store: Arc<dyn Store>,
}

impl Connection {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("path", &self.path)
            .field("opened_at", &self.opened_at)
            .finish_non_exhaustive()
    }
}

/// Holds zero or one [`Connection`] for the whole process.
pub struct SessionStore {
    opener: Arc<dyn StoreOpener>,
    current: RwLock<Option<Arc<Connection>>>,
    transition: Mutex<()>,
}

impl SessionStore {
    pub fn new(opener: Arc<dyn StoreOpener>) -> Self {
        Self {
            opener,
            current: RwLock::new(None),
            transition: Mutex::new(()),
        }
    }

    /// Open `path` and make it the active connection.
    ///
    /// Any previously active connection is closed after the new one is in
    /// place. On failure the previous connection (if any) stays active.
    pub async fn connect(&self, path: &Path) -> Result<Arc<Connection>, ViewerError> {
        let _guard = self.transition.lock().await;

        let store = self.opener.open(path).await?;
        let connection = Arc::new(Connection {
            path: path.to_path_buf(),
            opened_at: Utc::now(),
            store,
        });

        let previous = self.current.write().await.replace(connection.clone());

        if let Some(previous) = previous {
            tracing::info!(
                previous = %previous.path.display(),
                current = %connection.path.display(),
                "replacing database connection"
            );
            previous.store.close().await;
        } else {
            tracing::info!(path = %connection.path.display(), "database connected");
        }

        Ok(connection)
    }

    /// Close and clear the active connection.
    ///
    /// Returns `true` if a connection was open. Calling it while
    /// disconnected is a no-op.
    pub async fn disconnect(&self) -> bool {
        let _guard = self.transition.lock().await;

        let previous = self.current.write().await.take();
        match previous {
            Some(connection) => {
                connection.store.close().await;
                tracing::info!(path = %connection.path.display(), "database disconnected");
                true
            }
            None => {
                tracing::debug!("disconnect requested with no active connection");
                false
            }
        }
    }

    /// The active connection, if any.
    pub async fn current(&self) -> Option<Arc<Connection>> {
        self.current.read().await.clone()
    }

    /// The active connection, or [`ViewerError::NotConnected`].
    pub async fn require(&self) -> Result<Arc<Connection>, ViewerError> {
        self.current().await.ok_or(ViewerError::NotConnected)
    }
}
