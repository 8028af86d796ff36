//! # Chroma Viewer Core
//!
//! Shared, I/O-free logic for Chroma Viewer: data models, the error
//! taxonomy, the pagination engine, the [`store::Store`] abstraction and
//! embedding helpers.
//!
//! This crate contains no tokio, sqlx, filesystem I/O, or HTTP
//! dependencies. The SQLite-backed store, the session lifecycle, and the
//! HTTP server live in the `chroma-viewer` app crate.

pub mod embedding;
pub mod error;
pub mod models;
pub mod pagination;
pub mod store;

pub use error::ViewerError;
