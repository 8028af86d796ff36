//! SQLite-backed [`Store`] implementation for Chroma persistent stores.
//!
//! Maps each [`Store`] operation onto Chroma's SQLite schema:
//!
//! | Table | Used for |
//! |-------|----------|
//! | `collections` | names and ids |
//! | `segments` | the `METADATA` segment that owns a collection's records |
//! | `embeddings` | one row per document, ordered by `id` |
//! | `embedding_metadata` | document text (`chroma:document`) and user metadata |
//! | `embeddings_queue` | embedding vectors still held in the write-ahead log |
//!
//! Vectors that Chroma has already compacted out of `embeddings_queue`
//! into its HNSW segment files are reported as absent with
//! [`EmbeddingStatus::NotInWriteAheadLog`](chroma_viewer_core::models::EmbeddingStatus).
//!
//! Collection names are resolved to the lowest collection id carrying that
//! name; listing and lookup apply the same rule, so a name shared across
//! Chroma databases or tenants appears once.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

use chroma_viewer_core::embedding::blob_to_vec;
use chroma_viewer_core::models::{Collection, Document, Metadata, MetadataValue};
use chroma_viewer_core::store::Store;
use chroma_viewer_core::ViewerError;

use crate::config::DbConfig;
use crate::db;

/// Metadata key under which Chroma stores the document text.
const DOCUMENT_KEY: &str = "chroma:document";

/// Prefix of engine-internal metadata keys.
const RESERVED_PREFIX: &str = "chroma:";

/// `embeddings_queue.operation` value for deletes.
const OPERATION_DELETE: i64 = 3;

/// SQLite implementation of the [`Store`] trait over a Chroma database.
pub struct ChromaStore {
    pool: SqlitePool,
    has_queue: bool,
}

impl ChromaStore {
    /// Open the Chroma store at `path` (directory or `chroma.sqlite3` file).
    pub async fn open(path: &Path, config: &DbConfig) -> Result<Self, ViewerError> {
        let (pool, tables) = db::connect(path, config).await?;
        let has_queue = tables.iter().any(|t| t == "embeddings_queue");
        if !has_queue {
            tracing::debug!(
                path = %path.display(),
                "no embeddings_queue table, embeddings will be unavailable"
            );
        }
        Ok(Self::new(pool, has_queue))
    }

    pub fn new(pool: SqlitePool, has_queue: bool) -> Self {
        Self { pool, has_queue }
    }

    async fn collection_id(&self, name: &str) -> Result<String, ViewerError> {
        let id: Option<String> =
            sqlx::query_scalar("SELECT MIN(id) FROM collections WHERE name = ?")
                .bind(name)
                .fetch_one(&self.pool)
                .await
                .map_err(engine_error)?;

        id.ok_or_else(|| ViewerError::CollectionNotFound {
            name: name.to_string(),
        })
    }

    /// Text and user metadata for the given `embeddings.id` values.
    async fn load_metadata(
        &self,
        row_ids: &[i64],
    ) -> Result<HashMap<i64, (Option<String>, Metadata)>, ViewerError> {
        let sql = format!(
            "SELECT id, key, string_value, int_value, float_value, bool_value \
             FROM embedding_metadata WHERE id IN ({}) ORDER BY id, key",
            placeholders(row_ids.len())
        );
        let mut query = sqlx::query(&sql);
        for id in row_ids {
            query = query.bind(*id);
        }
        let rows = query.fetch_all(&self.pool).await.map_err(engine_error)?;

        let mut out: HashMap<i64, (Option<String>, Metadata)> = HashMap::new();
        for row in &rows {
            let id: i64 = row.try_get("id").map_err(engine_error)?;
            let key: String = row.try_get("key").map_err(engine_error)?;
            let entry = out.entry(id).or_default();

            if key == DOCUMENT_KEY {
                entry.0 = row.try_get("string_value").map_err(engine_error)?;
            } else if !key.starts_with(RESERVED_PREFIX) {
                entry.1.insert(key, metadata_value(row)?);
            }
        }
        Ok(out)
    }

    /// Latest vector-deciding write-ahead record per document id.
    ///
    /// `Some(vector)` for a readable add/update/upsert, `None` after a
    /// delete. Ids with no such record are missing from the map.
    async fn load_embeddings(
        &self,
        collection_id: &str,
        embedding_ids: &[String],
    ) -> Result<HashMap<String, Option<Vec<f32>>>, ViewerError> {
        if !self.has_queue {
            return Ok(HashMap::new());
        }

        let sql = format!(
            "SELECT id, vector, encoding, operation FROM embeddings_queue \
             WHERE (topic = ? OR substr(topic, -length(?)) = ?) AND id IN ({}) \
             ORDER BY seq_id",
            placeholders(embedding_ids.len())
        );
        let topic_suffix = format!("/{}", collection_id);
        let mut query = sqlx::query(&sql)
            .bind(collection_id)
            .bind(topic_suffix.as_str())
            .bind(topic_suffix.as_str());
        for id in embedding_ids {
            query = query.bind(id.as_str());
        }
        let rows = query.fetch_all(&self.pool).await.map_err(engine_error)?;

        let mut out = HashMap::new();
        for row in &rows {
            let id: String = row.try_get("id").map_err(engine_error)?;
            let operation: i64 = row.try_get("operation").map_err(engine_error)?;
            if operation == OPERATION_DELETE {
                out.insert(id, None);
                continue;
            }

            let vector: Option<Vec<u8>> = row.try_get("vector").map_err(engine_error)?;
            let encoding: Option<String> = row.try_get("encoding").map_err(engine_error)?;
            // Metadata-only update: the vector is unchanged.
            let Some(blob) = vector else { continue };

            match encoding.as_deref() {
                Some("FLOAT32") | None => match blob_to_vec(&blob) {
                    Some(v) => {
                        out.insert(id, Some(v));
                    }
                    None => {
                        tracing::warn!(id = %id, len = blob.len(), "malformed FLOAT32 vector blob")
                    }
                },
                Some(other) => tracing::debug!(
                    id = %id,
                    encoding = other,
                    "skipping unsupported vector encoding"
                ),
            }
        }
        Ok(out)
    }
}

#[async_trait]
impl Store for ChromaStore {
    async fn list_collections(&self) -> Result<Vec<Collection>, ViewerError> {
        let rows = sqlx::query(
            r#"
            SELECT c.name AS name,
                   (SELECT COUNT(*)
                      FROM embeddings e
                      JOIN segments s ON s.id = e.segment_id
                     WHERE s.collection = c.id AND s.scope = 'METADATA') AS document_count
            FROM collections c
            WHERE c.id = (SELECT MIN(d.id) FROM collections d WHERE d.name = c.name)
            ORDER BY c.name
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(engine_error)?;

        rows.iter()
            .map(|row| {
                let count: i64 = row.try_get("document_count").map_err(engine_error)?;
                Ok(Collection {
                    name: row.try_get("name").map_err(engine_error)?,
                    document_count: count.max(0) as u64,
                })
            })
            .collect()
    }

    async fn count_documents(&self, collection: &str) -> Result<u64, ViewerError> {
        let collection_id = self.collection_id(collection).await?;
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM embeddings e
            JOIN segments s ON s.id = e.segment_id
            WHERE s.collection = ? AND s.scope = 'METADATA'
            "#,
        )
        .bind(&collection_id)
        .fetch_one(&self.pool)
        .await
        .map_err(engine_error)?;

        Ok(count.max(0) as u64)
    }

    async fn fetch_documents(
        &self,
        collection: &str,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Document>, ViewerError> {
        let collection_id = self.collection_id(collection).await?;

        let rows = sqlx::query(
            r#"
            SELECT e.id AS row_id, e.embedding_id AS embedding_id
            FROM embeddings e
            JOIN segments s ON s.id = e.segment_id
            WHERE s.collection = ? AND s.scope = 'METADATA'
            ORDER BY e.id
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(&collection_id)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .bind(i64::try_from(offset).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await
        .map_err(engine_error)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut keys: Vec<(i64, String)> = Vec::with_capacity(rows.len());
        for row in &rows {
            keys.push((
                row.try_get("row_id").map_err(engine_error)?,
                row.try_get("embedding_id").map_err(engine_error)?,
            ));
        }

        let row_ids: Vec<i64> = keys.iter().map(|(id, _)| *id).collect();
        let embedding_ids: Vec<String> = keys.iter().map(|(_, id)| id.clone()).collect();

        let mut metadata = self.load_metadata(&row_ids).await?;
        let mut embeddings = self.load_embeddings(&collection_id, &embedding_ids).await?;

        Ok(keys
            .into_iter()
            .map(|(row_id, embedding_id)| {
                let (text, meta) = metadata.remove(&row_id).unwrap_or_default();
                let mut doc = Document::new(embedding_id, text.unwrap_or_default());
                if !meta.is_empty() {
                    doc = doc.with_metadata(meta);
                }
                let vector = embeddings.remove(&doc.id);
                match vector {
                    Some(Some(vector)) => doc.with_embedding(vector),
                    Some(None) => doc,
                    None => doc.with_unreadable_embedding(),
                }
            })
            .collect())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn engine_error(err: sqlx::Error) -> ViewerError {
    ViewerError::internal(err.to_string())
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Pick the populated typed column of an `embedding_metadata` row.
fn metadata_value(row: &SqliteRow) -> Result<MetadataValue, ViewerError> {
    if let Some(s) = row.try_get::<Option<String>, _>("string_value").map_err(engine_error)? {
        return Ok(MetadataValue::String(s));
    }
    if let Some(b) = row.try_get::<Option<i64>, _>("bool_value").map_err(engine_error)? {
        return Ok(MetadataValue::Bool(b != 0));
    }
    if let Some(i) = row.try_get::<Option<i64>, _>("int_value").map_err(engine_error)? {
        return Ok(MetadataValue::Int(i));
    }
    if let Some(f) = row.try_get::<Option<f64>, _>("float_value").map_err(engine_error)? {
        return Ok(MetadataValue::Float(f));
    }
    Ok(MetadataValue::Null)
}
