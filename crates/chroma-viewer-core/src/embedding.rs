//! Embedding vector decoding and preview rendering.
//!
//! Chroma stores vectors as packed `f32` blobs. [`blob_to_vec`] decodes
//! them; [`EmbeddingPreview`] is the compact form shown next to each
//! document, since full vectors run to hundreds or thousands of values.

use serde::Serialize;

/// Decode a BLOB of little-endian `f32` values.
///
/// Returns `None` when the blob length is not a multiple of 4, which means
/// the bytes are not a float32 vector.
///
/// # Example
///
/// ```rust
/// use chroma_viewer_core::embedding::blob_to_vec;
///
/// let mut blob = Vec::new();
/// blob.extend_from_slice(&1.5f32.to_le_bytes());
/// blob.extend_from_slice(&(-2.0f32).to_le_bytes());
/// assert_eq!(blob_to_vec(&blob), Some(vec![1.5, -2.0]));
/// assert_eq!(blob_to_vec(&[0u8; 3]), None);
/// ```
pub fn blob_to_vec(blob: &[u8]) -> Option<Vec<f32>> {
    if blob.len() % 4 != 0 {
        return None;
    }
    Some(
        blob.chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect(),
    )
}

/// Leading values of an embedding plus its full dimensionality.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmbeddingPreview {
    pub dimensions: usize,
    pub head: Vec<f32>,
    pub truncated: bool,
}

impl EmbeddingPreview {
    /// Keep the first `max_values` entries of `embedding`.
    pub fn new(embedding: &[f32], max_values: usize) -> Self {
        let take = embedding.len().min(max_values);
        Self {
            dimensions: embedding.len(),
            head: embedding[..take].to_vec(),
            truncated: embedding.len() > take,
        }
    }

    /// `[0.1234, -0.5000, ...] (384 dims)`
    pub fn to_display_string(&self) -> String {
        let values: Vec<String> = self.head.iter().map(|v| format!("{:.4}", v)).collect();
        let ellipsis = if self.truncated { ", ..." } else { "" };
        format!(
            "[{}{}] ({} dims)",
            values.join(", "),
            ellipsis,
            self.dimensions
        )
    }
}
