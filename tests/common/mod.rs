//! Chroma-format SQLite fixtures shared by the integration tests.
//!
//! Builds the subset of Chroma's schema the viewer reads, in a temporary
//! directory, using a writable sqlx connection that is closed before the
//! viewer opens the file read-only.

#![allow(dead_code)]

use std::path::PathBuf;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use tempfile::TempDir;

const SCHEMA: &[&str] = &[
    "CREATE TABLE collections (
        id TEXT PRIMARY KEY,
        name TEXT NOT NULL,
        dimension INTEGER,
        database_id TEXT NOT NULL DEFAULT '00000000-0000-0000-0000-000000000000',
        config_json_str TEXT
    )",
    "CREATE TABLE segments (
        id TEXT PRIMARY KEY,
        type TEXT NOT NULL,
        scope TEXT NOT NULL,
        collection TEXT
    )",
    "CREATE TABLE embeddings (
        id INTEGER PRIMARY KEY,
        segment_id TEXT NOT NULL,
        embedding_id TEXT NOT NULL,
        seq_id BLOB NOT NULL,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        UNIQUE (segment_id, embedding_id)
    )",
    "CREATE TABLE embedding_metadata (
        id INTEGER REFERENCES embeddings(id),
        key TEXT NOT NULL,
        string_value TEXT,
        int_value INTEGER,
        float_value REAL,
        bool_value INTEGER,
        PRIMARY KEY (id, key)
    )",
    "CREATE TABLE embeddings_queue (
        seq_id INTEGER PRIMARY KEY,
        created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
        operation INTEGER NOT NULL,
        topic TEXT NOT NULL,
        id TEXT NOT NULL,
        vector BLOB,
        encoding TEXT,
        metadata TEXT
    )",
];

/// A metadata value as Chroma writes it: exactly one typed column set.
#[derive(Debug, Clone)]
pub enum Value {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Null,
}

/// One document to seed.
#[derive(Debug, Clone)]
pub struct SeedDoc {
    pub id: String,
    pub text: Option<String>,
    pub metadata: Vec<(&'static str, Value)>,
    pub embedding: Option<Vec<f32>>,
}

impl SeedDoc {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: Some(text.into()),
            metadata: Vec::new(),
            embedding: None,
        }
    }

    pub fn meta(mut self, key: &'static str, value: Value) -> Self {
        self.metadata.push((key, value));
        self
    }

    pub fn embedding(mut self, v: Vec<f32>) -> Self {
        self.embedding = Some(v);
        self
    }
}

/// `count` numbered documents. Even positions carry a 4-dim embedding in the
/// write-ahead log; odd positions have no write-ahead record, as after
/// compaction.
pub fn numbered_docs(count: usize) -> Vec<SeedDoc> {
    (0..count)
        .map(|i| {
            let doc = SeedDoc::new(format!("doc-{:03}", i), format!("Document number {}", i))
                .meta("source", Value::Str("fixture".to_string()))
                .meta("position", Value::Int(i as i64));
            if i % 2 == 0 {
                doc.embedding(vec![i as f32, 0.5, -0.25, 1.0])
            } else {
                doc
            }
        })
        .collect()
}

pub fn vec_to_blob(v: &[f32]) -> Vec<u8> {
    v.iter().flat_map(|x| x.to_le_bytes()).collect()
}

pub fn topic(collection_id: &str) -> String {
    format!("persistent://default/default/{}", collection_id)
}

/// A temporary Chroma persistent directory.
pub struct ChromaFixture {
    pub dir: TempDir,
    pool: SqlitePool,
    next_row: i64,
}

impl ChromaFixture {
    pub async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("chroma.sqlite3");
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", file.display()))
            .unwrap()
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Delete);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        for stmt in SCHEMA {
            sqlx::query(stmt).execute(&pool).await.unwrap();
        }
        Self {
            dir,
            pool,
            next_row: 1,
        }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    pub fn sqlite_file(&self) -> PathBuf {
        self.dir.path().join("chroma.sqlite3")
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Insert a collection with its METADATA and VECTOR segments and documents.
    /// Returns the collection id.
    pub async fn add_collection(&mut self, name: &str, docs: &[SeedDoc]) -> String {
        let collection_id = format!("coll-{}", name);
        self.add_collection_with_id(&collection_id, name, docs).await;
        collection_id
    }

    /// [`add_collection`](Self::add_collection) with an explicit collection id,
    /// for fixtures where ids collide or names repeat.
    pub async fn add_collection_with_id(
        &mut self,
        collection_id: &str,
        name: &str,
        docs: &[SeedDoc],
    ) {
        let metadata_segment = format!("seg-meta-{}", collection_id);
        let vector_segment = format!("seg-vec-{}", collection_id);

        sqlx::query("INSERT INTO collections (id, name, dimension) VALUES (?, ?, 4)")
            .bind(collection_id)
            .bind(name)
            .execute(&self.pool)
            .await
            .unwrap();
        for (segment, kind, scope) in [
            (&metadata_segment, "urn:chroma:segment/metadata/sqlite", "METADATA"),
            (&vector_segment, "urn:chroma:segment/vector/hnsw-local-persisted", "VECTOR"),
        ] {
            sqlx::query("INSERT INTO segments (id, type, scope, collection) VALUES (?, ?, ?, ?)")
                .bind(segment)
                .bind(kind)
                .bind(scope)
                .bind(collection_id)
                .execute(&self.pool)
                .await
                .unwrap();
        }

        for doc in docs {
            let row_id = self.next_row;
            self.next_row += 1;

            sqlx::query(
                "INSERT INTO embeddings (id, segment_id, embedding_id, seq_id) VALUES (?, ?, ?, ?)",
            )
            .bind(row_id)
            .bind(&metadata_segment)
            .bind(&doc.id)
            .bind(row_id.to_be_bytes().to_vec())
            .execute(&self.pool)
            .await
            .unwrap();

            if let Some(text) = &doc.text {
                self.insert_metadata(row_id, "chroma:document", &Value::Str(text.clone()))
                    .await;
            }
            for (key, value) in &doc.metadata {
                self.insert_metadata(row_id, key, value).await;
            }

            if let Some(v) = &doc.embedding {
                self.queue(collection_id, &doc.id, 0, Some(v.as_slice())).await;
            }
        }
    }

    async fn insert_metadata(&self, row_id: i64, key: &str, value: &Value) {
        let (s, i, f, b): (Option<&str>, Option<i64>, Option<f64>, Option<i64>) = match value {
            Value::Str(s) => (Some(s.as_str()), None, None, None),
            Value::Int(i) => (None, Some(*i), None, None),
            Value::Float(f) => (None, None, Some(*f), None),
            Value::Bool(b) => (None, None, None, Some(*b as i64)),
            Value::Null => (None, None, None, None),
        };
        sqlx::query(
            "INSERT INTO embedding_metadata \
             (id, key, string_value, int_value, float_value, bool_value) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(row_id)
        .bind(key)
        .bind(s)
        .bind(i)
        .bind(f)
        .bind(b)
        .execute(&self.pool)
        .await
        .unwrap();
    }

    /// Append a write-ahead record (`operation`: 0 add, 1 update, 2 upsert, 3 delete).
    pub async fn queue(
        &self,
        collection_id: &str,
        id: &str,
        operation: i64,
        vector: Option<&[f32]>,
    ) {
        sqlx::query(
            "INSERT INTO embeddings_queue (operation, topic, id, vector, encoding) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(operation)
        .bind(topic(collection_id))
        .bind(id)
        .bind(vector.map(vec_to_blob))
        .bind(vector.map(|_| "FLOAT32"))
        .execute(&self.pool)
        .await
        .unwrap();
    }

    /// Close the writable pool so the viewer sees a settled file.
    pub async fn finish(self) -> TempDir {
        self.pool.close().await;
        self.dir
    }
}

/// Standard fixture: `docs` (23 numbered documents) and `empty`.
pub async fn standard_fixture() -> TempDir {
    let mut fixture = ChromaFixture::new().await;
    fixture.add_collection("docs", &numbered_docs(23)).await;
    fixture.add_collection("empty", &[]).await;
    fixture.finish().await
}
