use std::io::Write;
use std::path::{Path, PathBuf};

use crate::catalog;
use crate::cursor;
use crate::error::Result;
use crate::export;
use crate::import::{self, ImportRecord, ImportStats};
use crate::links::{self, LinkStats};
use crate::query::{AlbumFilter, Scope};
use crate::store::{Album, AlbumDetail, AlbumEntry, AlbumLink, Review, StoreSource, UserId};
use crate::user_state::{self, AlbumState, Flag};

/// Entry point for front ends. Every method opens its own connection, runs
/// a single operation and closes it again.
pub struct Archive {
    source: StoreSource,
}

impl Archive {
    /// Opens the archive at `db_path`, creating missing tables.
    pub fn open(db_path: PathBuf) -> Result<Archive> {
        Ok(Archive {
            source: StoreSource::create(db_path)?,
        })
    }

    pub fn db_path(&self) -> &Path {
        self.source.db_path()
    }

    pub fn list_for_scope(
        &self,
        user: UserId,
        scope: Scope,
        filter: AlbumFilter,
    ) -> Result<Vec<AlbumEntry>> {
        catalog::list_for_scope(&self.source.get()?, user, scope, filter)
    }

    pub fn count_for_scope(&self, user: UserId, scope: Scope, filter: AlbumFilter) -> Result<i64> {
        catalog::count_for_scope(&self.source.get()?, user, scope, filter)
    }

    pub fn get_album(&self, album_id: i64) -> Result<Option<AlbumDetail>> {
        self.source.get()?.album_detail(album_id)
    }

    pub fn get_reviews(&self, album_id: i64) -> Result<Vec<Review>> {
        self.source.get()?.reviews(album_id)
    }

    pub fn get_links(&self, album_id: i64) -> Result<Vec<AlbumLink>> {
        self.source.get()?.links(album_id)
    }

    pub fn add_link(&self, album_id: i64, source: &str, url: &str) -> Result<bool> {
        links::add_link(&mut self.source.get()?, album_id, source, url)
    }

    pub fn get_next(
        &self,
        user: UserId,
        current_id: i64,
        scope: Scope,
        filter: AlbumFilter,
    ) -> Result<Option<Album>> {
        catalog::get_next(&self.source.get()?, user, current_id, scope, filter)
    }

    pub fn get_prev(
        &self,
        user: UserId,
        current_id: i64,
        scope: Scope,
        filter: AlbumFilter,
    ) -> Result<Option<Album>> {
        catalog::get_prev(&self.source.get()?, user, current_id, scope, filter)
    }

    pub fn get_random(
        &self,
        user: UserId,
        scope: Scope,
        filter: AlbumFilter,
    ) -> Result<Option<AlbumDetail>> {
        catalog::get_random(&self.source.get()?, user, scope, filter)
    }

    pub fn get_state(&self, user: UserId, album_id: i64) -> Result<AlbumState> {
        user_state::get_state(&self.source.get()?, user, album_id)
    }

    pub fn toggle(&self, user: UserId, album_id: i64, flag: Flag) -> Result<bool> {
        user_state::toggle(&mut self.source.get()?, user, album_id, flag)
    }

    pub fn toggle_listened(&self, user: UserId, album_id: i64) -> Result<bool> {
        self.toggle(user, album_id, Flag::Listened)
    }

    pub fn toggle_favorite(&self, user: UserId, album_id: i64) -> Result<bool> {
        self.toggle(user, album_id, Flag::Favorite)
    }

    pub fn toggle_wishlist(&self, user: UserId, album_id: i64) -> Result<bool> {
        self.toggle(user, album_id, Flag::Wishlist)
    }

    pub fn set_last(&self, user: UserId, album_id: i64) -> Result<()> {
        cursor::set_last(&self.source.get()?, user, album_id)
    }

    pub fn get_last(&self, user: UserId) -> Result<Option<AlbumDetail>> {
        cursor::get_last(&self.source.get()?, user)
    }

    pub fn random_mode(&self, user: UserId) -> Result<bool> {
        cursor::random_mode(&self.source.get()?, user)
    }

    pub fn set_random_mode(&self, user: UserId, enabled: bool) -> Result<()> {
        cursor::set_random_mode(&self.source.get()?, user, enabled)
    }

    pub fn import_records(&self, records: &[ImportRecord]) -> Result<ImportStats> {
        import::import_records(&mut self.source.get()?, records)
    }

    pub fn import_file(&self, path: &Path) -> Result<ImportStats> {
        import::import_file(&mut self.source.get()?, path)
    }

    pub fn delete_album(&self, album_id: i64) -> Result<bool> {
        import::delete_album(&self.source.get()?, album_id)
    }

    pub fn generate_search_links(&self) -> Result<LinkStats> {
        links::generate_search_links(&mut self.source.get()?)
    }

    pub fn export_metadata<W: Write>(&self, source: &str, out: &mut W) -> Result<usize> {
        export::export_metadata(&self.source.get()?, source, out)
    }
}
