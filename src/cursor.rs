use rusqlite::{params, OptionalExtension};

use crate::error::Result;
use crate::store::{AlbumDetail, Store, UserId};

/// Remembers `album_id` as the last viewed album. The id is not checked
/// against the catalog.
pub fn set_last(store: &Store, user: UserId, album_id: i64) -> Result<()> {
    debug!("set last user_id={} album_id={}", user.0, album_id);

    store.connection().execute(
        "INSERT INTO UserSettings (user_id, last_album_id, random_mode_enabled, updated_at)
        VALUES (?, ?, 1, strftime('%s','now'))
        ON CONFLICT(user_id) DO UPDATE SET
            last_album_id = excluded.last_album_id,
            updated_at = excluded.updated_at",
        params![user.0, album_id],
    )?;

    Ok(())
}

pub fn last_album_id(store: &Store, user: UserId) -> Result<Option<i64>> {
    let last: Option<Option<i64>> = store
        .connection()
        .query_row(
            "SELECT last_album_id FROM UserSettings WHERE user_id = ?",
            [user.0],
            |row| row.get(0),
        )
        .optional()?;

    Ok(last.flatten())
}

/// The last viewed album, or None when nothing was recorded or the album
/// is gone.
pub fn get_last(store: &Store, user: UserId) -> Result<Option<AlbumDetail>> {
    let album_id = match last_album_id(store, user)? {
        Some(id) => id,
        None => return Ok(None),
    };

    let detail = store.album_detail(album_id)?;

    if detail.is_none() {
        debug!("last album album_id={} no longer resolves", album_id);
    }

    Ok(detail)
}

pub fn random_mode(store: &Store, user: UserId) -> Result<bool> {
    let enabled: Option<i64> = store
        .connection()
        .query_row(
            "SELECT random_mode_enabled FROM UserSettings WHERE user_id = ?",
            [user.0],
            |row| row.get(0),
        )
        .optional()?;

    Ok(enabled.map_or(true, |v| v != 0))
}

pub fn set_random_mode(store: &Store, user: UserId, enabled: bool) -> Result<()> {
    debug!("set random mode user_id={} enabled={}", user.0, enabled);

    store.connection().execute(
        "INSERT INTO UserSettings (user_id, last_album_id, random_mode_enabled, updated_at)
        VALUES (?, NULL, ?, strftime('%s','now'))
        ON CONFLICT(user_id) DO UPDATE SET
            random_mode_enabled = excluded.random_mode_enabled,
            updated_at = excluded.updated_at",
        params![user.0, enabled as i64],
    )?;

    Ok(())
}
