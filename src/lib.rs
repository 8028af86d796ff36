//! # Chroma Viewer
//!
//! A local web application for browsing a Chroma persistent database:
//! list its collections and page through their documents (text, metadata,
//! and embedding vectors). The viewer is strictly read-only.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌──────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  HTTP    │──▶│ SessionStore │──▶│ ChromaStore  │──▶│ chroma.sqlite3│
//! │ (Axum)   │   │ 0..1 conn    │   │ (sqlx, RO)   │   └──────────────┘
//! └────┬─────┘   └──────────────┘   └──────────────┘
//!      │
//!      ▼
//! ┌──────────────┐
//! │ paginate()   │  (chroma-viewer-core)
//! └──────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! chroma-viewer ./chroma_db                 # connect and serve on 127.0.0.1:8000
//! chroma-viewer --port 9000                 # start without a database, connect from the UI
//! chroma-viewer ./chroma_db --config viewer.toml
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing and validation |
//! | [`db`] | Read-only SQLite pool and Chroma schema check |
//! | [`chroma_store`] | [`Store`](chroma_viewer_core::store::Store) over Chroma's SQLite schema |
//! | [`session`] | Process-wide connect/disconnect lifecycle |
//! | [`server`] | JSON API and HTML routes (Axum) with CORS |
//! | [`views`] | Server-rendered HTML |

pub mod chroma_store;
pub mod config;
pub mod db;
pub mod server;
pub mod session;
pub mod views;

pub use chroma_viewer_core::{models, pagination, store, ViewerError};
