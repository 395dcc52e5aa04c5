//! Common test utilities and helpers

#![allow(dead_code)]

use axum::Router;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use uqureader_core::{storage::MapDictionary, SqliteStore};

/// Three-token corpus: one plain noun, one ambiguous word, one unmapped tag
pub const SAMPLE_CORPUS: &str = concat!(
    r#"{"prefix": "", "surface": "сүз", "analysis": "сүз+N+Sg+Nom;"}"#,
    "\n",
    r#"{"prefix": " ", "surface": "бар", "analysis": "бар+N+Sg+Nom;бар+PN;"}"#,
    "\n",
    r#"{"prefix": " ", "surface": "Рус", "analysis": "Rus"}"#,
    "\n"
);

/// Dictionary matching [`SAMPLE_CORPUS`]
pub fn sample_dictionary() -> MapDictionary {
    [("сүз", "слово"), ("бар", "есть"), ("бар", "каждый")]
        .into_iter()
        .collect()
}

/// Temporary corpus directory holding `book.jsonl` with `content`
pub fn create_corpus_dir(content: &str) -> (TempDir, PathBuf) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let path = dir.path().join("book.jsonl");
    std::fs::write(&path, content).expect("Failed to write corpus");
    (dir, path)
}

/// SQLite dictionary file with the `tat_rus_dictionary` table
pub fn create_dictionary_db(dir: &Path, pairs: &[(&str, &str)]) -> PathBuf {
    let path = dir.join("dictionary.db");
    let conn = rusqlite::Connection::open(&path).expect("Failed to create dictionary");
    conn.execute_batch(
        "CREATE TABLE tat_rus_dictionary (tat_lemma TEXT NOT NULL, rus_lemma TEXT NOT NULL);",
    )
    .expect("Failed to create table");
    for (tat, rus) in pairs {
        conn.execute(
            "INSERT INTO tat_rus_dictionary (tat_lemma, rus_lemma) VALUES (?1, ?2)",
            rusqlite::params![tat, rus],
        )
        .expect("Failed to insert dictionary row");
    }
    path
}

/// File-backed store in a fresh temporary directory
pub async fn create_test_store() -> (TempDir, SqliteStore) {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let store = SqliteStore::open(dir.path().join("reader.db"))
        .await
        .expect("Failed to open test store");
    (dir, store)
}

/// Serve `router` on an ephemeral local port, returning its base URL
pub async fn spawn_server(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("No local address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.ok();
    });
    format!("http://{}", addr)
}
