use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    DatabaseError(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("unsupported schema version: got {found}, expected {expected}")]
    SchemaVersion { found: u32, expected: u32 },

    #[error("album {0} does not exist")]
    UnknownAlbum(i64),

    #[error("invalid scope '{0}', expected 'all' or 'listened'")]
    InvalidScope(String),

    #[error("invalid flag '{0}', expected 'listened', 'favorite' or 'wishlist'")]
    InvalidFlag(String),
}

pub type Result<T> = std::result::Result<T, Error>;
