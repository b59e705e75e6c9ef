use rusqlite::params;
use tempfile::TempDir;

use crate::archive::Archive;
use crate::store::{Store, StoreSource};

pub fn source() -> (TempDir, StoreSource) {
    let dir = tempfile::tempdir().unwrap();
    let source = StoreSource::create(dir.path().join("archive.db")).unwrap();
    (dir, source)
}

pub fn archive() -> (TempDir, Archive) {
    let dir = tempfile::tempdir().unwrap();
    let archive = Archive::open(dir.path().join("archive.db")).unwrap();
    (dir, archive)
}

pub fn artist(store: &Store, name: &str) -> i64 {
    store
        .connection()
        .execute("INSERT INTO Artist (name) VALUES (?)", [name])
        .unwrap();
    store.connection().last_insert_rowid()
}

pub fn album(store: &Store, artist_id: i64, title: &str, year: Option<i64>) -> i64 {
    store
        .connection()
        .execute(
            "INSERT INTO Album (artist_id, title, year) VALUES (?, ?, ?)",
            params![artist_id, title, year],
        )
        .unwrap();
    store.connection().last_insert_rowid()
}

pub fn review(store: &Store, album_id: i64, published_at: Option<&str>) -> i64 {
    store
        .connection()
        .execute(
            "INSERT INTO Review (album_id, published_at, review_text) VALUES (?, ?, 'text')",
            params![album_id, published_at],
        )
        .unwrap();
    store.connection().last_insert_rowid()
}

pub fn count(store: &Store, table: &str) -> i64 {
    store
        .connection()
        .query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
            row.get(0)
        })
        .unwrap()
}
