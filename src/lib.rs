#[macro_use]
extern crate log;

pub mod archive;
pub mod catalog;
pub mod config;
pub mod cursor;
pub mod db_meta;
pub mod error;
pub mod export;
pub mod import;
pub mod links;
pub mod logger;
pub mod query;
pub mod schema;
pub mod store;
pub mod user_state;

#[cfg(test)]
mod testutil;

pub use archive::Archive;
pub use error::{Error, Result};
pub use query::{AlbumFilter, Scope};
pub use store::{Album, AlbumDetail, AlbumEntry, AlbumLink, Artist, Review, UserId};
pub use user_state::{AlbumState, Flag};

pub const REVARCHIVE_VERSION: &str = env!("CARGO_PKG_VERSION");
