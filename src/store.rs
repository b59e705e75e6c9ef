use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row};
use serde::Serialize;

use crate::db_meta;
use crate::error::Result;
use crate::schema;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct UserId(pub i64);

impl UserId {
    pub const DEFAULT: UserId = UserId(1);
}

impl Default for UserId {
    fn default() -> UserId {
        UserId::DEFAULT
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Artist {
    pub artist_id: i64,
    pub name: String,
    pub country: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Album {
    pub album_id: i64,
    pub artist_id: i64,
    pub title: String,
    pub year: Option<i64>,
    pub label: Option<String>,
    pub genre: Option<String>,
    pub review_url: Option<String>,
    pub cover_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Review {
    pub review_id: i64,
    pub album_id: i64,
    pub author: Option<String>,
    pub rating: Option<i64>,
    pub published_at: Option<NaiveDate>,
    pub review_text: String,
}

impl Review {
    pub fn paragraphs(&self) -> Vec<&str> {
        self.review_text
            .split("\n\n")
            .map(|p| p.trim())
            .filter(|p| !p.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumLink {
    pub link_id: i64,
    pub album_id: i64,
    pub source: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumEntry {
    pub album: Album,
    pub artist: Artist,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumDetail {
    pub album: Album,
    pub artist: Option<Artist>,
    pub reviews: Vec<Review>,
}

impl AlbumDetail {
    pub fn artist_name(&self) -> &str {
        match &self.artist {
            Some(artist) => &artist.name,
            None => "Unknown artist",
        }
    }
}

pub const ARTIST_COLUMNS: &str = "Artist.artist_id, Artist.name, Artist.country, Artist.notes";

pub const ALBUM_COLUMNS: &str = "Album.album_id, Album.artist_id, Album.title, Album.year, \
    Album.label, Album.genre, Album.review_url, Album.cover_url";

pub const REVIEW_COLUMNS: &str = "Review.review_id, Review.album_id, Review.author, \
    Review.rating, Review.published_at, Review.review_text";

pub const ALBUM_COLUMN_COUNT: usize = 8;

pub fn artist_from_row(row: &Row, offset: usize) -> rusqlite::Result<Artist> {
    Ok(Artist {
        artist_id: row.get(offset)?,
        name: row.get(offset + 1)?,
        country: row.get(offset + 2)?,
        notes: row.get(offset + 3)?,
    })
}

pub fn album_from_row(row: &Row, offset: usize) -> rusqlite::Result<Album> {
    Ok(Album {
        album_id: row.get(offset)?,
        artist_id: row.get(offset + 1)?,
        title: row.get(offset + 2)?,
        year: row.get(offset + 3)?,
        label: row.get(offset + 4)?,
        genre: row.get(offset + 5)?,
        review_url: row.get(offset + 6)?,
        cover_url: row.get(offset + 7)?,
    })
}

/// Reads the leading `YYYY-MM-DD` of a stored date, so full timestamps
/// written by other importers still resolve. Anything else reads as undated.
pub fn parse_published_at(value: &str) -> Option<NaiveDate> {
    let date = value.trim().get(..10)?;

    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

pub fn review_from_row(row: &Row) -> rusqlite::Result<Review> {
    let review_id: i64 = row.get(0)?;
    let raw_published_at: Option<String> = row.get(4)?;

    let published_at = raw_published_at.as_deref().and_then(|raw| {
        let date = parse_published_at(raw);
        if date.is_none() {
            debug!("review {} has unreadable date '{}'", review_id, raw);
        }
        date
    });

    Ok(Review {
        review_id,
        album_id: row.get(1)?,
        author: row.get(2)?,
        rating: row.get(3)?,
        published_at,
        review_text: row.get(5)?,
    })
}

pub struct StoreSource {
    db_path: PathBuf,
}

pub struct Store {
    conn: Connection,
}

impl StoreSource {
    pub fn create(db_path: PathBuf) -> Result<StoreSource> {
        info!("using '{}'", db_path.to_string_lossy());

        let source = StoreSource { db_path };

        let mut store = source.get()?;
        db_meta::ensure_schema(&mut store.conn, schema::ARCHIVE_SCHEMA)?;

        Ok(source)
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn get(&self) -> Result<Store> {
        let conn = match Connection::open(&self.db_path) {
            Ok(c) => c,
            Err(e) => {
                error!(
                    "can't open sqlite database '{}': {}",
                    self.db_path.to_string_lossy(),
                    e
                );
                return Err(e.into());
            }
        };

        conn.busy_timeout(Duration::from_secs(5))?;
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
            PRAGMA journal_mode = WAL;",
        )?;

        Ok(Store { conn })
    }
}

impl Store {
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn connection_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }

    pub fn artist(&self, artist_id: i64) -> Result<Option<Artist>> {
        trace!("get artist artist_id={}", artist_id);

        let artist = self
            .conn
            .query_row(
                &format!("SELECT {} FROM Artist WHERE artist_id = ?", ARTIST_COLUMNS),
                [artist_id],
                |row| artist_from_row(row, 0),
            )
            .optional()?;

        Ok(artist)
    }

    pub fn album(&self, album_id: i64) -> Result<Option<Album>> {
        trace!("get album album_id={}", album_id);

        let album = self
            .conn
            .query_row(
                &format!("SELECT {} FROM Album WHERE album_id = ?", ALBUM_COLUMNS),
                [album_id],
                |row| album_from_row(row, 0),
            )
            .optional()?;

        Ok(album)
    }

    /// Album with artist and reviews. The artist is joined outer, so an
    /// album whose artist row is gone still resolves.
    pub fn album_detail(&self, album_id: i64) -> Result<Option<AlbumDetail>> {
        trace!("get album detail album_id={}", album_id);

        let found = self
            .conn
            .query_row(
                &format!(
                    "SELECT {}, {}
                    FROM Album
                    LEFT OUTER JOIN Artist ON Artist.artist_id = Album.artist_id
                    WHERE Album.album_id = ?",
                    ALBUM_COLUMNS, ARTIST_COLUMNS
                ),
                [album_id],
                |row| {
                    let album = album_from_row(row, 0)?;
                    let artist_id: Option<i64> = row.get(ALBUM_COLUMN_COUNT)?;
                    let artist = match artist_id {
                        Some(_) => Some(artist_from_row(row, ALBUM_COLUMN_COUNT)?),
                        None => None,
                    };
                    Ok((album, artist))
                },
            )
            .optional()?;

        match found {
            Some((album, artist)) => {
                let reviews = self.reviews(album.album_id)?;
                Ok(Some(AlbumDetail {
                    album,
                    artist,
                    reviews,
                }))
            }
            None => Ok(None),
        }
    }

    pub fn reviews(&self, album_id: i64) -> Result<Vec<Review>> {
        trace!("list reviews album_id={}", album_id);

        let mut st = self.conn.prepare(&format!(
            "SELECT {}
            FROM Review
            WHERE Review.album_id = ?
            ORDER BY
                Review.published_at IS NULL ASC,
                Review.published_at ASC,
                Review.review_id ASC",
            REVIEW_COLUMNS
        ))?;

        let mut rows = st.query([album_id])?;
        let mut result = Vec::new();

        while let Some(row) = rows.next()? {
            result.push(review_from_row(row)?);
        }

        Ok(result)
    }

    pub fn links(&self, album_id: i64) -> Result<Vec<AlbumLink>> {
        trace!("list links album_id={}", album_id);

        let mut st = self.conn.prepare(
            "SELECT link_id, album_id, source, url
            FROM AlbumLink
            WHERE album_id = ?
            ORDER BY link_id ASC",
        )?;

        let mut rows = st.query([album_id])?;
        let mut result = Vec::new();

        while let Some(row) = rows.next()? {
            result.push(AlbumLink {
                link_id: row.get(0)?,
                album_id: row.get(1)?,
                source: row.get(2)?,
                url: row.get(3)?,
            });
        }

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn album_detail_attaches_artist_and_ordered_reviews() {
        let (_dir, source) = testutil::source();
        let store = source.get().unwrap();

        let artist_id = testutil::artist(&store, "Clan of Xymox");
        let album_id = testutil::album(&store, artist_id, "Medusa", Some(1986));
        let undated = testutil::review(&store, album_id, None);
        let late = testutil::review(&store, album_id, Some("2004-05-01"));
        let early = testutil::review(&store, album_id, Some("1999-01-20"));

        let detail = store.album_detail(album_id).unwrap().unwrap();
        assert_eq!(detail.album.title, "Medusa");
        assert_eq!(detail.artist_name(), "Clan of Xymox");

        let ids: Vec<i64> = detail.reviews.iter().map(|r| r.review_id).collect();
        assert_eq!(ids, vec![early, late, undated]);
        assert_eq!(
            detail.reviews[0].published_at,
            NaiveDate::from_ymd_opt(1999, 1, 20)
        );
    }

    #[test]
    fn album_detail_absent_for_unknown_id() {
        let (_dir, source) = testutil::source();
        let store = source.get().unwrap();

        assert!(store.album_detail(404).unwrap().is_none());
        assert!(store.album(404).unwrap().is_none());
        assert!(store.reviews(404).unwrap().is_empty());
    }

    #[test]
    fn undated_reviews_tie_break_by_id() {
        let (_dir, source) = testutil::source();
        let store = source.get().unwrap();

        let artist_id = testutil::artist(&store, "Lycia");
        let album_id = testutil::album(&store, artist_id, "Cold", None);
        let first = testutil::review(&store, album_id, None);
        let second = testutil::review(&store, album_id, None);

        let ids: Vec<i64> = store
            .reviews(album_id)
            .unwrap()
            .iter()
            .map(|r| r.review_id)
            .collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[test]
    fn timestamp_dates_read_as_their_day() {
        let (_dir, source) = testutil::source();
        let store = source.get().unwrap();

        let artist_id = testutil::artist(&store, "Sopor Aeternus");
        let album_id = testutil::album(&store, artist_id, "Dead Lovers' Sarabande", Some(1999));
        let stamped = testutil::review(&store, album_id, Some("2004-05-01 00:00:00"));
        let garbled = testutil::review(&store, album_id, Some("spring 2004"));

        let detail = store.album_detail(album_id).unwrap().unwrap();
        let dates: Vec<(i64, Option<NaiveDate>)> = detail
            .reviews
            .iter()
            .map(|r| (r.review_id, r.published_at))
            .collect();

        assert!(dates.contains(&(stamped, NaiveDate::from_ymd_opt(2004, 5, 1))));
        assert!(dates.contains(&(garbled, None)));
    }

    #[test]
    fn published_at_parsing_is_lenient() {
        assert_eq!(
            parse_published_at("2004-05-01T10:00:00"),
            NaiveDate::from_ymd_opt(2004, 5, 1)
        );
        assert_eq!(parse_published_at("2004-05-01"), NaiveDate::from_ymd_opt(2004, 5, 1));
        assert_eq!(parse_published_at("2004-13-01"), None);
        assert_eq!(parse_published_at("May"), None);
        assert_eq!(parse_published_at(""), None);
    }

    #[test]
    fn paragraphs_split_on_blank_lines() {
        let review = Review {
            review_id: 1,
            album_id: 1,
            author: None,
            rating: None,
            published_at: None,
            review_text: "First.\n\n  Second.\n\n\n\nThird.".to_string(),
        };

        assert_eq!(review.paragraphs(), vec!["First.", "Second.", "Third."]);
    }
}
