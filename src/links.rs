use rusqlite::{ffi, params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::Store;

pub const YOUTUBE_SEARCH: &str = "youtube_search";

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct LinkStats {
    pub created: usize,
    pub skipped_missing: usize,
}

fn has_link(conn: &Connection, album_id: i64, source: &str) -> Result<bool> {
    let link_id: Option<i64> = conn
        .query_row(
            "SELECT link_id FROM AlbumLink WHERE album_id = ? AND source = ? LIMIT 1",
            params![album_id, source],
            |row| row.get(0),
        )
        .optional()?;

    Ok(link_id.is_some())
}

fn insert_link(conn: &Connection, album_id: i64, source: &str, url: &str) -> Result<()> {
    let inserted = conn.execute(
        "INSERT INTO AlbumLink (album_id, source, url) VALUES (?, ?, ?)",
        params![album_id, source, url],
    );

    match inserted {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            return Err(Error::UnknownAlbum(album_id));
        }
        Err(e) => return Err(e.into()),
    }

    debug!("create link album_id={} source={}", album_id, source);

    Ok(())
}

/// Adds a link unless the album already has one from `source`. The check
/// and the insert share one write transaction.
pub fn add_link(store: &mut Store, album_id: i64, source: &str, url: &str) -> Result<bool> {
    let tx = store
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    if has_link(&tx, album_id, source)? {
        trace!("link album_id={} source={} exists", album_id, source);
        return Ok(false);
    }

    insert_link(&tx, album_id, source, url)?;
    tx.commit()?;

    Ok(true)
}

/// Form-encodes like a browser would, spaces as `+`.
pub fn youtube_search_url(artist: &str, title: &str) -> String {
    let query = format!("{} {} full album", artist, title);

    format!(
        "https://www.youtube.com/results?search_query={}",
        urlencoding::encode(&query).replace("%20", "+")
    )
}

pub fn generate_search_links(store: &mut Store) -> Result<LinkStats> {
    let mut stats = LinkStats::default();

    let tx = store
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    let albums: Vec<(i64, Option<String>, String)> = {
        let mut st = tx.prepare(
            "SELECT Album.album_id, Artist.name, Album.title
            FROM Album
            LEFT OUTER JOIN Artist ON Artist.artist_id = Album.artist_id
            ORDER BY Album.album_id",
        )?;

        let mut rows = st.query([])?;
        let mut albums = Vec::new();

        while let Some(row) = rows.next()? {
            albums.push((row.get(0)?, row.get(1)?, row.get(2)?));
        }

        albums
    };

    for (album_id, artist_name, title) in albums {
        let artist_name = match artist_name {
            Some(name) if !name.trim().is_empty() && !title.trim().is_empty() => name,
            _ => {
                stats.skipped_missing += 1;
                continue;
            }
        };

        if has_link(&tx, album_id, YOUTUBE_SEARCH)? {
            continue;
        }

        insert_link(
            &tx,
            album_id,
            YOUTUBE_SEARCH,
            &youtube_search_url(&artist_name, &title),
        )?;
        stats.created += 1;
    }

    tx.commit()?;

    info!(
        "created {} {} links, skipped {} albums without artist or title",
        stats.created, YOUTUBE_SEARCH, stats.skipped_missing
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn search_url_is_form_encoded() {
        assert_eq!(
            youtube_search_url("The 69 Eyes", "Blessed Be"),
            "https://www.youtube.com/results?search_query=The+69+Eyes+Blessed+Be+full+album"
        );
        assert_eq!(
            youtube_search_url("AC/DC", "Rock & Roll"),
            "https://www.youtube.com/results?search_query=AC%2FDC+Rock+%26+Roll+full+album"
        );
    }

    #[test]
    fn add_link_rejects_second_link_from_same_source() {
        let (_dir, source) = testutil::source();
        let mut store = source.get().unwrap();

        let artist = testutil::artist(&store, "Pink Turns Blue");
        let album = testutil::album(&store, artist, "If Two Worlds Kiss", Some(1987));

        assert!(add_link(&mut store, album, "bandcamp", "https://a").unwrap());
        assert!(!add_link(&mut store, album, "bandcamp", "https://b").unwrap());
        assert!(add_link(&mut store, album, "spotify", "https://c").unwrap());

        let links = store.links(album).unwrap();
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].url, "https://a");
    }

    #[test]
    fn add_link_to_unknown_album_fails() {
        let (_dir, source) = testutil::source();
        let mut store = source.get().unwrap();

        match add_link(&mut store, 777, "bandcamp", "https://a") {
            Err(Error::UnknownAlbum(777)) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(testutil::count(&store, "AlbumLink"), 0);
    }

    #[test]
    fn generate_search_links_is_idempotent() {
        let (_dir, source) = testutil::source();
        let mut store = source.get().unwrap();

        let artist = testutil::artist(&store, "Gitane Demone");
        testutil::album(&store, artist, "Love for Sale", Some(1993));
        testutil::album(&store, artist, " ", None);

        let stats = generate_search_links(&mut store).unwrap();
        assert_eq!(
            stats,
            LinkStats {
                created: 1,
                skipped_missing: 1,
            }
        );

        let stats = generate_search_links(&mut store).unwrap();
        assert_eq!(stats.created, 0);
        assert_eq!(testutil::count(&store, "AlbumLink"), 1);
    }
}
