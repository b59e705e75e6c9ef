use rand::seq::IndexedRandom;

use crate::error::Result;
use crate::query::{album_query, AlbumFilter, Scope};
use crate::store::{
    album_from_row, artist_from_row, Album, AlbumDetail, AlbumEntry, Store, UserId, ALBUM_COLUMNS,
    ALBUM_COLUMN_COUNT, ARTIST_COLUMNS,
};

/// Albums matching scope and filter, artist attached, ordered by artist
/// name, title, then year with unknown years last. Albums whose artist does
/// not resolve are left out.
pub fn list_for_scope(
    store: &Store,
    user: UserId,
    scope: Scope,
    filter: AlbumFilter,
) -> Result<Vec<AlbumEntry>> {
    debug!("list scope={} filter={:?}", scope, filter);

    let mut opts = album_query(user, scope, filter);
    opts.join("INNER JOIN Artist ON Artist.artist_id = Album.artist_id");
    opts.order_string(
        "Artist.name ASC, Album.title ASC, Album.year IS NULL ASC, Album.year ASC",
    );

    let mut st = opts.prepare(
        store.connection(),
        &format!("SELECT {}, {} FROM Album", ALBUM_COLUMNS, ARTIST_COLUMNS),
    )?;

    let mut rows = st.query(opts.params())?;
    let mut items: Vec<AlbumEntry> = Vec::new();

    while let Some(row) = rows.next()? {
        items.push(AlbumEntry {
            album: album_from_row(row, 0)?,
            artist: artist_from_row(row, ALBUM_COLUMN_COUNT)?,
        });
    }

    Ok(items)
}

/// Number of albums `list_for_scope` returns for the same arguments.
pub fn count_for_scope(
    store: &Store,
    user: UserId,
    scope: Scope,
    filter: AlbumFilter,
) -> Result<i64> {
    let mut opts = album_query(user, scope, filter);
    opts.join("INNER JOIN Artist ON Artist.artist_id = Album.artist_id");

    Ok(opts.get_total(store.connection(), "SELECT COUNT(Album.album_id) FROM Album")?)
}

pub fn ids_for_scope(
    store: &Store,
    user: UserId,
    scope: Scope,
    filter: AlbumFilter,
) -> Result<Vec<i64>> {
    let mut opts = album_query(user, scope, filter);
    opts.order_string("Album.album_id ASC");

    let mut st = opts.prepare(store.connection(), "SELECT Album.album_id FROM Album")?;
    let mut rows = st.query(opts.params())?;
    let mut ids = Vec::new();

    while let Some(row) = rows.next()? {
        ids.push(row.get(0)?);
    }

    Ok(ids)
}

fn neighbour(
    store: &Store,
    user: UserId,
    scope: Scope,
    filter: AlbumFilter,
    clause: &str,
    current_id: i64,
    order: &str,
) -> Result<Option<Album>> {
    let mut opts = album_query(user, scope, filter);
    opts.filter_value(clause, current_id);
    opts.order_string(order);
    opts.limit(1);

    let mut st = opts.prepare(
        store.connection(),
        &format!("SELECT {} FROM Album", ALBUM_COLUMNS),
    )?;
    let mut rows = st.query(opts.params())?;

    if let Some(row) = rows.next()? {
        Ok(Some(album_from_row(row, 0)?))
    } else {
        Ok(None)
    }
}

/// Next album by numeric id within the scope. This follows id order, not
/// the artist/title order of `list_for_scope`.
pub fn get_next(
    store: &Store,
    user: UserId,
    current_id: i64,
    scope: Scope,
    filter: AlbumFilter,
) -> Result<Option<Album>> {
    trace!("next album current_id={}", current_id);

    neighbour(
        store,
        user,
        scope,
        filter,
        "Album.album_id > ?",
        current_id,
        "Album.album_id ASC",
    )
}

pub fn get_prev(
    store: &Store,
    user: UserId,
    current_id: i64,
    scope: Scope,
    filter: AlbumFilter,
) -> Result<Option<Album>> {
    trace!("prev album current_id={}", current_id);

    neighbour(
        store,
        user,
        scope,
        filter,
        "Album.album_id < ?",
        current_id,
        "Album.album_id DESC",
    )
}

pub fn get_random(
    store: &Store,
    user: UserId,
    scope: Scope,
    filter: AlbumFilter,
) -> Result<Option<AlbumDetail>> {
    let ids = ids_for_scope(store, user, scope, filter)?;

    let album_id = match ids.choose(&mut rand::rng()) {
        Some(&id) => id,
        None => {
            debug!("random: nothing matches scope={} filter={:?}", scope, filter);
            return Ok(None);
        }
    };

    trace!("random picked album_id={} of {}", album_id, ids.len());

    store.album_detail(album_id)
}
