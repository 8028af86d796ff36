//! Read-only SQLite connection management for Chroma stores.
//!
//! A Chroma persistent store is a directory holding `chroma.sqlite3`. The
//! caller may point at the directory or at the file itself. The database is
//! opened read-only and is never created: a path that does not resolve to
//! an existing Chroma SQLite file is rejected before any pool is built.
//!
//! # Connection Pool
//!
//! Uses `sqlx::SqlitePool` with `[db].max_connections` connections. SQLite
//! allows any number of concurrent readers, so requests share the pool
//! without further locking.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chroma_viewer_core::ViewerError;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::config::DbConfig;

/// File name of the SQLite database inside a Chroma persistent directory.
pub const CHROMA_SQLITE_FILE: &str = "chroma.sqlite3";

/// Tables every supported Chroma schema carries.
pub const REQUIRED_TABLES: [&str; 4] = [
    "collections",
    "segments",
    "embeddings",
    "embedding_metadata",
];

/// Resolve a user-supplied path to the Chroma SQLite file.
///
/// # Errors
///
/// - [`ViewerError::PathNotFound`] if `path` does not exist.
/// - [`ViewerError::InvalidFormat`] if `path` is a directory without
///   `chroma.sqlite3`, or neither a file nor a directory.
pub fn resolve_sqlite_path(path: &Path) -> Result<PathBuf, ViewerError> {
    if !path.exists() {
        return Err(ViewerError::PathNotFound {
            path: path.to_path_buf(),
        });
    }

    if path.is_dir() {
        let file = path.join(CHROMA_SQLITE_FILE);
        if file.is_file() {
            Ok(file)
        } else {
            Err(ViewerError::InvalidFormat {
                path: path.to_path_buf(),
                reason: format!("directory does not contain {}", CHROMA_SQLITE_FILE),
            })
        }
    } else if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(ViewerError::InvalidFormat {
            path: path.to_path_buf(),
            reason: "not a regular file or directory".to_string(),
        })
    }
}

/// Open a read-only connection pool and verify the Chroma schema.
///
/// Returns the pool together with the names of the tables present, so the
/// store can detect optional tables such as `embeddings_queue`.
pub async fn connect(
    path: &Path,
    config: &DbConfig,
) -> Result<(SqlitePool, Vec<String>), ViewerError> {
    let file = resolve_sqlite_path(path)?;

    let invalid = |reason: String| ViewerError::InvalidFormat {
        path: path.to_path_buf(),
        reason,
    };

    let options = SqliteConnectOptions::new()
        .filename(&file)
        .read_only(true)
        .create_if_missing(false);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect_with(options)
        .await
        .map_err(|e| invalid(e.to_string()))?;

    let tables: Vec<String> =
        match sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
            .fetch_all(&pool)
            .await
        {
            Ok(tables) => tables,
            Err(e) => {
                pool.close().await;
                return Err(invalid(e.to_string()));
            }
        };

    let missing: Vec<&str> = REQUIRED_TABLES
        .iter()
        .copied()
        .filter(|t| !tables.iter().any(|name| name == t))
        .collect();

    if !missing.is_empty() {
        pool.close().await;
        return Err(invalid(format!("missing tables: {}", missing.join(", "))));
    }

    Ok((pool, tables))
}
