//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the Flickr-Harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- One row per harvested account
CREATE TABLE IF NOT EXISTS users (
    nsid TEXT PRIMARY KEY,
    username TEXT NOT NULL,
    path_alias TEXT,
    total_items INTEGER NOT NULL,
    total_pages INTEGER NOT NULL,
    favorite_count INTEGER NOT NULL,
    favorite_pages INTEGER NOT NULL,
    is_pro INTEGER NOT NULL,
    is_ad_free INTEGER NOT NULL,
    is_deleted INTEGER NOT NULL,
    date_created TEXT,
    added_at TEXT NOT NULL
);

-- Media found on listing pages
CREATE TABLE IF NOT EXISTS media (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    owner TEXT NOT NULL,
    title TEXT NOT NULL,
    is_public INTEGER NOT NULL,
    is_safe INTEGER NOT NULL,
    download_link TEXT NOT NULL UNIQUE,
    extracted INTEGER NOT NULL DEFAULT 0,
    collected_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_media_extracted ON media(extracted);
CREATE INDEX IF NOT EXISTS idx_media_owner ON media(owner);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
