//! Integration tests for [`ChromaStore`] against Chroma-format SQLite fixtures.

mod common;

use chroma_viewer::chroma_store::ChromaStore;
use chroma_viewer::config::DbConfig;
use chroma_viewer::models::{EmbeddingStatus, MetadataValue};
use chroma_viewer::store::Store;
use chroma_viewer::ViewerError;
use common::{numbered_docs, standard_fixture, ChromaFixture, SeedDoc, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::path::Path;
use std::str::FromStr;
use tempfile::TempDir;

async fn open(path: &Path) -> Result<ChromaStore, ViewerError> {
    ChromaStore::open(path, &DbConfig::default()).await
}

#[tokio::test]
async fn test_open_missing_path() {
    let err = open(Path::new("/definitely/not/a/chroma/db")).await.err().unwrap();
    assert!(matches!(err, ViewerError::PathNotFound { .. }));
}

#[tokio::test]
async fn test_open_directory_without_database() {
    let tmp = TempDir::new().unwrap();
    let err = open(tmp.path()).await.err().unwrap();
    assert!(matches!(err, ViewerError::InvalidFormat { .. }));
}

#[tokio::test]
async fn test_open_sqlite_without_chroma_tables() {
    let tmp = TempDir::new().unwrap();
    let file = tmp.path().join("chroma.sqlite3");
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", file.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new().connect_with(options).await.unwrap();
    sqlx::query("CREATE TABLE notes (id INTEGER PRIMARY KEY, body TEXT)")
        .execute(&pool)
        .await
        .unwrap();
    pool.close().await;

    let err = open(tmp.path()).await.err().unwrap();
    match err {
        ViewerError::InvalidFormat { reason, .. } => {
            assert!(reason.contains("collections"), "reason: {}", reason)
        }
        other => panic!("expected InvalidFormat, got {:?}", other),
    }
}

#[tokio::test]
async fn test_open_by_file_path() {
    let dir = standard_fixture().await;
    let store = open(&dir.path().join("chroma.sqlite3")).await.unwrap();
    assert_eq!(store.count_documents("docs").await.unwrap(), 23);
}

#[tokio::test]
async fn test_list_collections_sorted_with_counts() {
    let mut fixture = ChromaFixture::new().await;
    fixture.add_collection("zeta", &numbered_docs(2)).await;
    fixture.add_collection("alpha", &numbered_docs(5)).await;
    fixture.add_collection("empty", &[]).await;
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    let collections = store.list_collections().await.unwrap();
    let summary: Vec<(String, u64)> = collections
        .into_iter()
        .map(|c| (c.name, c.document_count))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("alpha".to_string(), 5),
            ("empty".to_string(), 0),
            ("zeta".to_string(), 2),
        ]
    );

    // Stable across calls on the same connection.
    let again: Vec<String> = store
        .list_collections()
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(again, vec!["alpha", "empty", "zeta"]);
}

#[tokio::test]
async fn test_fetch_documents_window() {
    let dir = standard_fixture().await;
    let store = open(dir.path()).await.unwrap();

    let first = store.fetch_documents("docs", 0, 10).await.unwrap();
    assert_eq!(first.len(), 10);
    assert_eq!(first[0].id, "doc-000");
    assert_eq!(first[9].id, "doc-009");

    let last = store.fetch_documents("docs", 20, 10).await.unwrap();
    let ids: Vec<&str> = last.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["doc-020", "doc-021", "doc-022"]);
}

#[tokio::test]
async fn test_fetch_past_end_is_empty() {
    let dir = standard_fixture().await;
    let store = open(dir.path()).await.unwrap();

    assert!(store.fetch_documents("docs", 23, 10).await.unwrap().is_empty());
    assert!(store.fetch_documents("docs", 10_000, 100).await.unwrap().is_empty());
    assert!(store.fetch_documents("empty", 0, 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_collection() {
    let dir = standard_fixture().await;
    let store = open(dir.path()).await.unwrap();

    let err = store.count_documents("unknown").await.unwrap_err();
    assert!(matches!(err, ViewerError::CollectionNotFound { ref name } if name == "unknown"));

    let err = store.fetch_documents("unknown", 0, 10).await.unwrap_err();
    assert!(matches!(err, ViewerError::CollectionNotFound { .. }));
}

#[tokio::test]
async fn test_document_fields() {
    let dir = standard_fixture().await;
    let store = open(dir.path()).await.unwrap();

    let docs = store.fetch_documents("docs", 0, 2).await.unwrap();

    let even = &docs[0];
    assert_eq!(even.text, "Document number 0");
    let meta = even.metadata.as_ref().unwrap();
    assert_eq!(meta["source"], MetadataValue::String("fixture".to_string()));
    assert_eq!(meta["position"], MetadataValue::Int(0));
    assert!(!meta.contains_key("chroma:document"));
    assert_eq!(even.embedding, Some(vec![0.0, 0.5, -0.25, 1.0]));
    assert_eq!(even.embedding_status, EmbeddingStatus::Stored);

    // Odd positions have no write-ahead record: absent, not empty.
    assert_eq!(docs[1].embedding, None);
}

#[tokio::test]
async fn test_compacted_vector_is_not_reported_as_never_stored() {
    let mut fixture = ChromaFixture::new().await;
    let docs = vec![
        SeedDoc::new("in-log", "still in the write-ahead log").embedding(vec![0.25, 0.75]),
        SeedDoc::new("compacted", "vector lives in the index files only"),
    ];
    fixture.add_collection("mixed", &docs).await;
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    let docs = store.fetch_documents("mixed", 0, 10).await.unwrap();
    assert_eq!(docs[0].embedding_status, EmbeddingStatus::Stored);
    assert_eq!(docs[1].embedding, None);
    assert_eq!(docs[1].embedding_status, EmbeddingStatus::NotInWriteAheadLog);
}

#[tokio::test]
async fn test_metadata_scalar_kinds() {
    let mut fixture = ChromaFixture::new().await;
    let docs = vec![
        SeedDoc::new("typed", "typed values")
            .meta("title", Value::Str("Guide".to_string()))
            .meta("pages", Value::Int(12))
            .meta("score", Value::Float(0.75))
            .meta("draft", Value::Bool(true))
            .meta("owner", Value::Null)
            .meta("chroma:internal", Value::Str("hidden".to_string())),
        SeedDoc::new("bare", "no metadata at all"),
    ];
    fixture.add_collection("typed", &docs).await;
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    let docs = store.fetch_documents("typed", 0, 10).await.unwrap();

    let meta = docs[0].metadata.as_ref().unwrap();
    assert_eq!(meta.len(), 5);
    assert_eq!(meta["title"], MetadataValue::String("Guide".to_string()));
    assert_eq!(meta["pages"], MetadataValue::Int(12));
    assert_eq!(meta["score"], MetadataValue::Float(0.75));
    assert_eq!(meta["draft"], MetadataValue::Bool(true));
    assert_eq!(meta["owner"], MetadataValue::Null);

    assert_eq!(docs[1].metadata, None);
    assert_eq!(docs[1].text, "no metadata at all");
}

#[tokio::test]
async fn test_latest_vector_wins_and_deletes_clear() {
    let mut fixture = ChromaFixture::new().await;
    let docs = vec![
        SeedDoc::new("updated", "a").embedding(vec![1.0, 1.0]),
        SeedDoc::new("deleted", "b").embedding(vec![2.0, 2.0]),
        SeedDoc::new("metadata-only-update", "c").embedding(vec![3.0, 3.0]),
    ];
    let collection_id = fixture.add_collection("wal", &docs).await;
    fixture
        .queue(&collection_id, "updated", 1, Some(&[9.0, 9.0]))
        .await;
    fixture.queue(&collection_id, "deleted", 3, None).await;
    fixture
        .queue(&collection_id, "metadata-only-update", 1, None)
        .await;
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    let docs = store.fetch_documents("wal", 0, 10).await.unwrap();
    assert_eq!(docs[0].embedding, Some(vec![9.0, 9.0]));
    assert_eq!(docs[1].embedding, None);
    assert_eq!(docs[1].embedding_status, EmbeddingStatus::NotStored);
    assert_eq!(docs[2].embedding, Some(vec![3.0, 3.0]));
}

#[tokio::test]
async fn test_vectors_scoped_to_collection() {
    let mut fixture = ChromaFixture::new().await;
    fixture
        .add_collection("one", &[SeedDoc::new("shared-id", "x").embedding(vec![1.0])])
        .await;
    fixture
        .add_collection("two", &[SeedDoc::new("shared-id", "y")])
        .await;
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    let one = store.fetch_documents("one", 0, 10).await.unwrap();
    let two = store.fetch_documents("two", 0, 10).await.unwrap();
    assert_eq!(one[0].embedding, Some(vec![1.0]));
    assert_eq!(two[0].embedding, None);
}

#[tokio::test]
async fn test_vectors_match_whole_collection_id() {
    let mut fixture = ChromaFixture::new().await;
    // "xc1" ends with "c1"; "c_2" would match "cx2" as a LIKE pattern.
    fixture
        .add_collection_with_id("c1", "short", &[SeedDoc::new("shared", "a")])
        .await;
    fixture
        .add_collection_with_id("xc1", "long", &[SeedDoc::new("shared", "b").embedding(vec![1.0])])
        .await;
    fixture
        .add_collection_with_id("c_2", "underscore", &[SeedDoc::new("shared", "c")])
        .await;
    fixture
        .add_collection_with_id("cx2", "plain", &[SeedDoc::new("shared", "d").embedding(vec![2.0])])
        .await;
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    for name in ["short", "underscore"] {
        let docs = store.fetch_documents(name, 0, 10).await.unwrap();
        assert_eq!(docs[0].embedding, None, "collection {}", name);
        assert_eq!(docs[0].embedding_status, EmbeddingStatus::NotInWriteAheadLog);
    }
    let long = store.fetch_documents("long", 0, 10).await.unwrap();
    assert_eq!(long[0].embedding, Some(vec![1.0]));
}

#[tokio::test]
async fn test_duplicate_collection_names_list_once() {
    let mut fixture = ChromaFixture::new().await;
    fixture
        .add_collection_with_id("a-first", "notes", &numbered_docs(3))
        .await;
    fixture
        .add_collection_with_id("b-second", "notes", &numbered_docs(7))
        .await;
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    let listed = store.list_collections().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].name, "notes");
    // The listed count is the one the name resolves to.
    assert_eq!(listed[0].document_count, 3);
    assert_eq!(store.count_documents("notes").await.unwrap(), 3);
    assert_eq!(store.fetch_documents("notes", 0, 10).await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_missing_queue_table_means_absent_embeddings() {
    let mut fixture = ChromaFixture::new().await;
    fixture.add_collection("docs", &numbered_docs(3)).await;
    sqlx::query("DROP TABLE embeddings_queue")
        .execute(fixture.pool())
        .await
        .unwrap();
    let dir = fixture.finish().await;

    let store = open(dir.path()).await.unwrap();
    let docs = store.fetch_documents("docs", 0, 10).await.unwrap();
    assert_eq!(docs.len(), 3);
    assert!(docs.iter().all(|d| d.embedding.is_none()));
    assert!(docs
        .iter()
        .all(|d| d.embedding_status == EmbeddingStatus::NotInWriteAheadLog));
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let dir = standard_fixture().await;
    let store = open(dir.path()).await.unwrap();
    store.close().await;
    store.close().await;
    assert!(store.list_collections().await.is_err());
}

#[tokio::test]
async fn test_database_is_not_modified() {
    let dir = standard_fixture().await;
    let file = dir.path().join("chroma.sqlite3");
    let before = std::fs::read(&file).unwrap();

    let store = open(dir.path()).await.unwrap();
    store.list_collections().await.unwrap();
    store.fetch_documents("docs", 0, 100).await.unwrap();
    store.close().await;

    assert_eq!(std::fs::read(&file).unwrap(), before);
}
