pub const SCHEMA_VERSION: u32 = 1;

pub const META_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Meta (
    key TEXT PRIMARY KEY,
    value);
";

pub const ARCHIVE_SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS Artist (
    artist_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    country TEXT,
    notes TEXT);

CREATE TABLE IF NOT EXISTS Album (
    album_id INTEGER PRIMARY KEY AUTOINCREMENT,
    artist_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    year INTEGER,
    label TEXT,
    genre TEXT,
    review_url TEXT,
    cover_url TEXT,
    FOREIGN KEY(artist_id) REFERENCES Artist(artist_id));

CREATE INDEX IF NOT EXISTS Album_artist_id ON Album (artist_id);
CREATE INDEX IF NOT EXISTS Album_title ON Album (title);

CREATE TABLE IF NOT EXISTS Review (
    review_id INTEGER PRIMARY KEY AUTOINCREMENT,
    album_id INTEGER NOT NULL,
    author TEXT,
    rating INTEGER,
    published_at TEXT,
    review_text TEXT NOT NULL DEFAULT '',
    FOREIGN KEY(album_id) REFERENCES Album(album_id) ON DELETE CASCADE);

CREATE INDEX IF NOT EXISTS Review_album_id ON Review (album_id);

CREATE TABLE IF NOT EXISTS AlbumLink (
    link_id INTEGER PRIMARY KEY AUTOINCREMENT,
    album_id INTEGER NOT NULL,
    source TEXT NOT NULL,
    url TEXT NOT NULL,
    FOREIGN KEY(album_id) REFERENCES Album(album_id) ON DELETE CASCADE);

CREATE INDEX IF NOT EXISTS AlbumLink_album_id ON AlbumLink (album_id);

CREATE TABLE IF NOT EXISTS UserAlbum (
    user_album_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL DEFAULT 1,
    album_id INTEGER NOT NULL,
    listened INTEGER NOT NULL DEFAULT 0,
    favorite INTEGER NOT NULL DEFAULT 0,
    wishlist INTEGER NOT NULL DEFAULT 0,
    updated_at INTEGER NOT NULL,
    UNIQUE(user_id, album_id),
    FOREIGN KEY(album_id) REFERENCES Album(album_id) ON DELETE CASCADE);

CREATE INDEX IF NOT EXISTS UserAlbum_album_id ON UserAlbum (album_id);

CREATE TABLE IF NOT EXISTS UserSettings (
    user_settings_id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL UNIQUE DEFAULT 1,
    last_album_id INTEGER,
    random_mode_enabled INTEGER NOT NULL DEFAULT 1,
    updated_at INTEGER NOT NULL);
";
