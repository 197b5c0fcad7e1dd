//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.

use crate::model::{MediaRecord, UserProfile};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageResult};
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Creates a new SqliteStore instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn open_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn count(&self, sql: &str) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

impl Store for SqliteStore {
    // ===== Users =====

    fn upsert_user_if_absent(&mut self, profile: &UserProfile) -> StorageResult<bool> {
        let tx = self.conn.transaction()?;

        let existing: Option<String> = tx
            .query_row(
                "SELECT nsid FROM users WHERE nsid = ?1",
                params![profile.nsid],
                |row| row.get(0),
            )
            .optional()?;

        if existing.is_some() {
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        tx.execute(
            "INSERT INTO users (nsid, username, path_alias, total_items, total_pages,
             favorite_count, favorite_pages, is_pro, is_ad_free, is_deleted, date_created, added_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
            params![
                profile.nsid,
                profile.username,
                profile.path_alias,
                profile.total_items as i64,
                profile.total_pages,
                profile.favorite_count as i64,
                profile.favorite_pages,
                profile.is_pro,
                profile.is_ad_free,
                profile.is_deleted,
                profile.date_created,
                now
            ],
        )?;
        tx.commit()?;

        Ok(true)
    }

    // ===== Media =====

    fn insert_media_batch(&mut self, records: &[MediaRecord]) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO media
                 (owner, title, is_public, is_safe, download_link, extracted, collected_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6)",
            )?;

            for record in records {
                inserted += stmt.execute(params![
                    record.owner,
                    record.title,
                    record.is_public,
                    record.is_safe,
                    record.download_link,
                    now
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }

    fn select_unextracted_links(&self) -> StorageResult<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT DISTINCT download_link FROM media WHERE extracted = 0 ORDER BY id",
        )?;

        let links = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;

        Ok(links)
    }

    fn mark_extracted(&mut self, links: &[String]) -> StorageResult<usize> {
        let tx = self.conn.transaction()?;

        let mut changed = 0;
        {
            let mut stmt = tx.prepare(
                "UPDATE media SET extracted = 1 WHERE download_link = ?1 AND extracted = 0",
            )?;

            for link in links {
                changed += stmt.execute(params![link])?;
            }
        }

        tx.commit()?;
        Ok(changed)
    }

    // ===== Statistics =====

    fn count_users(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM users")
    }

    fn count_media(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM media")
    }

    fn count_unextracted(&self) -> StorageResult<u64> {
        self.count("SELECT COUNT(*) FROM media WHERE extracted = 0")
    }
}
