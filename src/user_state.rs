use std::fmt;
use std::str::FromStr;

use rusqlite::{ffi, params, Connection, OptionalExtension, TransactionBehavior};
use serde::Serialize;

use crate::error::{Error, Result};
use crate::store::{Store, UserId};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum Flag {
    Listened,
    Favorite,
    Wishlist,
}

impl Flag {
    fn column(self) -> &'static str {
        match self {
            Flag::Listened => "listened",
            Flag::Favorite => "favorite",
            Flag::Wishlist => "wishlist",
        }
    }
}

impl FromStr for Flag {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Flag, Error> {
        match s {
            "listened" => Ok(Flag::Listened),
            "favorite" => Ok(Flag::Favorite),
            "wishlist" => Ok(Flag::Wishlist),
            other => Err(Error::InvalidFlag(other.to_string())),
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// Per-album flags of one user. A missing row reads as all false.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct AlbumState {
    pub listened: bool,
    pub favorite: bool,
    pub wishlist: bool,
}

impl AlbumState {
    pub fn get(&self, flag: Flag) -> bool {
        match flag {
            Flag::Listened => self.listened,
            Flag::Favorite => self.favorite,
            Flag::Wishlist => self.wishlist,
        }
    }
}

pub fn get_state(store: &Store, user: UserId, album_id: i64) -> Result<AlbumState> {
    trace!("get state user_id={} album_id={}", user.0, album_id);

    let state = store
        .connection()
        .query_row(
            "SELECT listened, favorite, wishlist
            FROM UserAlbum
            WHERE user_id = ? AND album_id = ?",
            params![user.0, album_id],
            |row| {
                let listened: i64 = row.get(0)?;
                let favorite: i64 = row.get(1)?;
                let wishlist: i64 = row.get(2)?;
                Ok(AlbumState {
                    listened: listened != 0,
                    favorite: favorite != 0,
                    wishlist: wishlist != 0,
                })
            },
        )
        .optional()?;

    Ok(state.unwrap_or_default())
}

fn state_row_exists(conn: &Connection, user: UserId, album_id: i64) -> Result<bool> {
    let user_album_id: Option<i64> = conn
        .query_row(
            "SELECT user_album_id FROM UserAlbum WHERE user_id = ? AND album_id = ?",
            params![user.0, album_id],
            |row| row.get(0),
        )
        .optional()?;

    Ok(user_album_id.is_some())
}

/// Makes sure a default row exists. A unique violation on insert means
/// another writer created it first.
fn ensure_state_row(conn: &Connection, user: UserId, album_id: i64) -> Result<()> {
    if state_row_exists(conn, user, album_id)? {
        return Ok(());
    }

    let inserted = conn.execute(
        "INSERT INTO UserAlbum (user_id, album_id, listened, favorite, wishlist, updated_at)
        VALUES (?, ?, 0, 0, 0, strftime('%s','now'))",
        params![user.0, album_id],
    );

    match inserted {
        Ok(_) => {
            debug!("create state row user_id={} album_id={}", user.0, album_id);
            Ok(())
        }
        Err(rusqlite::Error::SqliteFailure(e, msg))
            if e.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            debug!(
                "state row user_id={} album_id={} already exists, reading again",
                user.0, album_id
            );
            if state_row_exists(conn, user, album_id)? {
                Ok(())
            } else {
                Err(rusqlite::Error::SqliteFailure(e, msg).into())
            }
        }
        Err(rusqlite::Error::SqliteFailure(e, _))
            if e.extended_code == ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
        {
            Err(Error::UnknownAlbum(album_id))
        }
        Err(e) => Err(e.into()),
    }
}

/// Flips one flag and returns its new value. The first toggle of an album
/// creates its row, so it always yields `true`.
pub fn toggle(store: &mut Store, user: UserId, album_id: i64, flag: Flag) -> Result<bool> {
    let tx = store
        .connection_mut()
        .transaction_with_behavior(TransactionBehavior::Immediate)?;

    ensure_state_row(&tx, user, album_id)?;

    let column = flag.column();

    tx.execute(
        &format!(
            "UPDATE UserAlbum
            SET {col} = CASE WHEN {col} = 0 THEN 1 ELSE 0 END,
                updated_at = strftime('%s','now')
            WHERE user_id = ? AND album_id = ?",
            col = column
        ),
        params![user.0, album_id],
    )?;

    let value: i64 = tx.query_row(
        &format!(
            "SELECT {} FROM UserAlbum WHERE user_id = ? AND album_id = ?",
            column
        ),
        params![user.0, album_id],
        |row| row.get(0),
    )?;

    tx.commit()?;

    debug!(
        "toggle user_id={} album_id={} {}={}",
        user.0, album_id, flag, value
    );

    Ok(value != 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil;

    #[test]
    fn missing_state_reads_as_false_without_creating_row() {
        let (_dir, source) = testutil::source();
        let store = source.get().unwrap();

        let artist = testutil::artist(&store, "Cocteau Twins");
        let album = testutil::album(&store, artist, "Treasure", Some(1984));

        assert_eq!(
            get_state(&store, UserId::DEFAULT, album).unwrap(),
            AlbumState::default()
        );
        assert_eq!(get_state(&store, UserId::DEFAULT, 999).unwrap(), AlbumState::default());
        assert_eq!(testutil::count(&store, "UserAlbum"), 0);
    }

    #[test]
    fn toggle_twice_returns_to_original() {
        let (_dir, source) = testutil::source();
        let mut store = source.get().unwrap();

        let artist = testutil::artist(&store, "Sisters of Mercy");
        let album = testutil::album(&store, artist, "Floodland", Some(1987));

        assert!(toggle(&mut store, UserId::DEFAULT, album, Flag::Listened).unwrap());
        assert!(!toggle(&mut store, UserId::DEFAULT, album, Flag::Listened).unwrap());
        assert_eq!(testutil::count(&store, "UserAlbum"), 1);
    }

    #[test]
    fn toggles_are_independent() {
        let (_dir, source) = testutil::source();
        let mut store = source.get().unwrap();

        let artist = testutil::artist(&store, "Fields of the Nephilim");
        let album = testutil::album(&store, artist, "Elizium", Some(1990));

        toggle(&mut store, UserId::DEFAULT, album, Flag::Listened).unwrap();
        toggle(&mut store, UserId::DEFAULT, album, Flag::Wishlist).unwrap();
        toggle(&mut store, UserId::DEFAULT, album, Flag::Favorite).unwrap();
        toggle(&mut store, UserId::DEFAULT, album, Flag::Favorite).unwrap();

        let state = get_state(&store, UserId::DEFAULT, album).unwrap();
        assert_eq!(
            state,
            AlbumState {
                listened: true,
                favorite: false,
                wishlist: true,
            }
        );
        assert!(state.get(Flag::Wishlist));
    }

    #[test]
    fn toggle_unknown_album_fails() {
        let (_dir, source) = testutil::source();
        let mut store = source.get().unwrap();

        match toggle(&mut store, UserId::DEFAULT, 12345, Flag::Listened) {
            Err(Error::UnknownAlbum(12345)) => {}
            other => panic!("unexpected result {:?}", other),
        }
        assert_eq!(testutil::count(&store, "UserAlbum"), 0);
    }

    #[test]
    fn concurrent_first_toggles_create_one_row() {
        let (_dir, source) = testutil::source();
        let album = {
            let store = source.get().unwrap();
            let artist = testutil::artist(&store, "Christian Death");
            testutil::album(&store, artist, "Only Theatre of Pain", Some(1982))
        };

        let mut results: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..2)
                .map(|_| {
                    s.spawn(|| {
                        let mut store = source.get().unwrap();
                        toggle(&mut store, UserId::DEFAULT, album, Flag::Favorite).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        results.sort();

        assert_eq!(results, vec![false, true]);
        let store = source.get().unwrap();
        assert_eq!(testutil::count(&store, "UserAlbum"), 1);
    }

    #[test]
    fn flag_parses_known_names_only() {
        assert_eq!("favorite".parse::<Flag>().unwrap(), Flag::Favorite);
        assert!(matches!("loved".parse::<Flag>(), Err(Error::InvalidFlag(_))));
    }
}
