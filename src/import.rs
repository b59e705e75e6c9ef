use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{album_from_row, Album, Store, ALBUM_COLUMNS};

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportReview {
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub rating: Option<i64>,
    /// Maximum of the scale `rating` was given on; 5 when absent.
    #[serde(default)]
    pub rating_scale: Option<u32>,
    #[serde(default)]
    pub published_at: Option<NaiveDate>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ImportRecord {
    #[serde(default)]
    pub artist: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub year: Option<i64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub review_url: Option<String>,
    #[serde(default)]
    pub review: Option<ImportReview>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImportStats {
    pub artists_created: usize,
    pub albums_created: usize,
    pub albums_updated: usize,
    pub reviews_created: usize,
    pub reviews_updated: usize,
    pub skipped: usize,
}

/// Maps a rating given on a `1..=scale` scale onto 1..=5. Halves round to
/// even, and the result is always clamped.
pub fn normalize_rating(rating: i64, scale: Option<u32>) -> i64 {
    let scaled = match scale {
        Some(scale) if scale != 0 && scale as i64 != MAX_RATING => {
            (rating as f64 * MAX_RATING as f64 / scale as f64).round_ties_even() as i64
        }
        _ => rating,
    };

    scaled.clamp(MIN_RATING, MAX_RATING)
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    match value {
        Some(s) if !s.trim().is_empty() => Some(s.trim()),
        _ => None,
    }
}

fn get_or_create_artist(tx: &Connection, name: &str, stats: &mut ImportStats) -> Result<i64> {
    let artist_id: Option<i64> = tx
        .query_row("SELECT artist_id FROM Artist WHERE name = ?", [name], |row| {
            row.get(0)
        })
        .optional()?;

    if let Some(artist_id) = artist_id {
        return Ok(artist_id);
    }

    tx.execute("INSERT INTO Artist (name) VALUES (?)", [name])?;
    let artist_id = tx.last_insert_rowid();

    debug!("create artist artist_id={} name={}", artist_id, name);
    stats.artists_created += 1;

    Ok(artist_id)
}

fn fill_missing<T: Clone>(current: &mut Option<T>, incoming: &Option<T>) -> bool {
    if current.is_none() && incoming.is_some() {
        *current = incoming.clone();
        true
    } else {
        false
    }
}

fn upsert_album(
    tx: &Connection,
    artist_id: i64,
    title: &str,
    record: &ImportRecord,
    stats: &mut ImportStats,
) -> Result<i64> {
    let existing: Option<Album> = tx
        .query_row(
            &format!(
                "SELECT {} FROM Album WHERE artist_id = ? AND title = ? ORDER BY album_id LIMIT 1",
                ALBUM_COLUMNS
            ),
            params![artist_id, title],
            |row| album_from_row(row, 0),
        )
        .optional()?;

    let mut album = match existing {
        Some(album) => album,
        None => {
            tx.execute(
                "INSERT INTO Album (artist_id, title, year, label, genre, review_url, cover_url)
                VALUES (?, ?, ?, ?, ?, ?, ?)",
                params![
                    artist_id,
                    title,
                    record.year,
                    record.label,
                    record.genre,
                    record.review_url,
                    record.cover_url
                ],
            )?;
            let album_id = tx.last_insert_rowid();

            debug!("create album album_id={} title={}", album_id, title);
            stats.albums_created += 1;

            return Ok(album_id);
        }
    };

    let mut changed = false;
    changed |= fill_missing(&mut album.year, &record.year);
    changed |= fill_missing(&mut album.label, &record.label);
    changed |= fill_missing(&mut album.genre, &record.genre);
    changed |= fill_missing(&mut album.review_url, &record.review_url);
    changed |= fill_missing(&mut album.cover_url, &record.cover_url);

    if changed {
        tx.execute(
            "UPDATE Album
            SET year = ?, label = ?, genre = ?, review_url = ?, cover_url = ?
            WHERE album_id = ?",
            params![
                album.year,
                album.label,
                album.genre,
                album.review_url,
                album.cover_url,
                album.album_id
            ],
        )?;

        debug!("fill missing fields album_id={}", album.album_id);
        stats.albums_updated += 1;
    }

    Ok(album.album_id)
}

/// Reviews are identified by album, author and publication date, so a
/// re-import refreshes rating and text instead of duplicating.
fn upsert_review(
    tx: &Connection,
    album_id: i64,
    review: &ImportReview,
    stats: &mut ImportStats,
) -> Result<()> {
    let author = non_blank(&review.author);
    let rating = review
        .rating
        .map(|r| normalize_rating(r, review.rating_scale));
    let text = review.text.as_deref().unwrap_or("").trim();

    let existing: Option<(i64, Option<i64>, String)> = tx
        .query_row(
            "SELECT review_id, rating, review_text
            FROM Review
            WHERE album_id = ? AND author IS ? AND published_at IS ?
            ORDER BY review_id
            LIMIT 1",
            params![album_id, author, review.published_at],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;

    match existing {
        None => {
            tx.execute(
                "INSERT INTO Review (album_id, author, rating, published_at, review_text)
                VALUES (?, ?, ?, ?, ?)",
                params![album_id, author, rating, review.published_at, text],
            )?;

            trace!("create review album_id={}", album_id);
            stats.reviews_created += 1;
        }
        Some((review_id, old_rating, old_text)) => {
            let new_rating = rating.or(old_rating);
            let new_text = if text.is_empty() { old_text.as_str() } else { text };

            if new_rating != old_rating || new_text != old_text {
                tx.execute(
                    "UPDATE Review SET rating = ?, review_text = ? WHERE review_id = ?",
                    params![new_rating, new_text, review_id],
                )?;

                trace!("update review review_id={}", review_id);
                stats.reviews_updated += 1;
            }
        }
    }

    Ok(())
}

fn import_record(tx: &Transaction, record: &ImportRecord, stats: &mut ImportStats) -> Result<()> {
    let artist_name = non_blank(&record.artist).unwrap_or_default();
    let title = non_blank(&record.title).unwrap_or_default();

    let artist_id = get_or_create_artist(tx, artist_name, stats)?;
    let album_id = upsert_album(tx, artist_id, title, record, stats)?;

    if let Some(review) = &record.review {
        upsert_review(tx, album_id, review, stats)?;
    }

    Ok(())
}

/// Writes each record in its own transaction. Records without artist or
/// title, and records whose write fails, are skipped and counted.
pub fn import_records(store: &mut Store, records: &[ImportRecord]) -> Result<ImportStats> {
    let mut stats = ImportStats::default();

    for (i, record) in records.iter().enumerate() {
        if non_blank(&record.artist).is_none() || non_blank(&record.title).is_none() {
            debug!("skip record {}: missing artist or title", i);
            stats.skipped += 1;
            continue;
        }

        let tx = store.connection_mut().transaction()?;
        let mut record_stats = stats.clone();

        match import_record(&tx, record, &mut record_stats) {
            Ok(()) => {
                tx.commit()?;
                stats = record_stats;
            }
            Err(e) => {
                error!("skip record {}: {}", i, e);
                stats.skipped += 1;
            }
        }
    }

    info!(
        "import done: {} artists, {} albums created, {} albums updated, \
         {} reviews created, {} reviews updated, {} skipped",
        stats.artists_created,
        stats.albums_created,
        stats.albums_updated,
        stats.reviews_created,
        stats.reviews_updated,
        stats.skipped
    );

    Ok(stats)
}

/// Reads a JSON array of records. Entries that do not deserialize count as
/// skipped rather than failing the whole file.
pub fn import_file(store: &mut Store, path: &Path) -> Result<ImportStats> {
    info!("import '{}'", path.to_string_lossy());

    let reader = BufReader::new(File::open(path)?);
    let values: Vec<serde_json::Value> = serde_json::from_reader(reader)?;

    let mut records = Vec::with_capacity(values.len());
    let mut malformed = 0;

    for (i, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<ImportRecord>(value) {
            Ok(record) => records.push(record),
            Err(e) => {
                debug!("skip entry {}: {}", i, e);
                malformed += 1;
            }
        }
    }

    let mut stats = import_records(store, &records)?;
    stats.skipped += malformed;

    Ok(stats)
}

pub fn delete_album(store: &Store, album_id: i64) -> Result<bool> {
    let deleted = store
        .connection()
        .execute("DELETE FROM Album WHERE album_id = ?", [album_id])?;

    debug!("delete album album_id={} deleted={}", album_id, deleted);

    Ok(deleted > 0)
}
