//! Core data models for Chroma Viewer.
//!
//! These are read-only projections of what the database engine stores.
//! Absence is always explicit: a document that never had metadata or an
//! embedding carries `None`, not an empty map or vector. Why an embedding
//! is absent is recorded in [`EmbeddingStatus`].

use std::collections::BTreeMap;

use serde::Serialize;

use crate::embedding::EmbeddingPreview;

/// A named group of documents with its current size.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Collection {
    pub name: String,
    pub document_count: u64,
}

/// A single scalar metadata value.
///
/// Serialized untagged so the JSON payload carries plain scalars.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl MetadataValue {
    /// Plain-text rendering used by the HTML views.
    pub fn display(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Int(i) => i.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Null => "null".to_string(),
        }
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Document metadata, keyed and ordered by field name.
pub type Metadata = BTreeMap<String, MetadataValue>;

/// Whether a document's vector could be read from the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingStatus {
    /// `embedding` holds the vector.
    Stored,
    /// The engine holds no vector for this document.
    #[default]
    NotStored,
    /// The engine may hold a vector the viewer cannot read, e.g. one already
    /// compacted out of the write-ahead log into the vector index files.
    NotInWriteAheadLog,
}

/// One stored record of a collection.
///
/// `embedding` is `Some` exactly when `embedding_status` is
/// [`EmbeddingStatus::Stored`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub id: String,
    pub text: String,
    pub metadata: Option<Metadata>,
    pub embedding: Option<Vec<f32>>,
    pub embedding_status: EmbeddingStatus,
}

impl Document {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            metadata: None,
            embedding: None,
            embedding_status: EmbeddingStatus::NotStored,
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self.embedding_status = EmbeddingStatus::Stored;
        self
    }

    /// Mark the vector as held by the engine but unreadable.
    pub fn with_unreadable_embedding(mut self) -> Self {
        self.embedding = None;
        self.embedding_status = EmbeddingStatus::NotInWriteAheadLog;
        self
    }
}

/// Presentation settings for [`DocumentEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PreviewOptions {
    /// Characters of text kept in `preview`.
    pub text_chars: usize,
    /// Leading embedding values kept in `embedding_preview`.
    pub embedding_values: usize,
}

impl Default for PreviewOptions {
    fn default() -> Self {
        Self {
            text_chars: 200,
            embedding_values: 8,
        }
    }
}

/// A document as listed on a page: the stored record plus its absolute
/// position and display previews.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentEntry {
    /// 1-based position within the collection.
    pub index: u64,
    #[serde(flatten)]
    pub document: Document,
    pub preview: String,
    pub embedding_preview: Option<EmbeddingPreview>,
}

impl DocumentEntry {
    pub fn new(index: u64, document: Document, options: PreviewOptions) -> Self {
        let preview = text_preview(&document.text, options.text_chars);
        let embedding_preview = document
            .embedding
            .as_deref()
            .map(|e| EmbeddingPreview::new(e, options.embedding_values));
        Self {
            index,
            document,
            preview,
            embedding_preview,
        }
    }
}

/// Truncate `text` to `max_chars` characters, appending `...` when cut.
pub fn text_preview(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}
