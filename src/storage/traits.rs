//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{MediaRecord, UserProfile};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Store is unavailable: {0}")]
    Unavailable(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Callers serialize access (one writer at a time), so implementations
/// only need to be `Send`.
pub trait Store: Send {
    // ===== Users =====

    /// Inserts a profile unless one with the same nsid already exists
    ///
    /// # Returns
    ///
    /// `true` if a row was inserted, `false` if the profile was already stored
    fn upsert_user_if_absent(&mut self, profile: &UserProfile) -> StorageResult<bool>;

    // ===== Media =====

    /// Inserts a batch of media records, all or nothing
    ///
    /// Every inserted row starts with `extracted = false`. Links that are
    /// already stored are skipped, so re-harvesting an account is idempotent.
    ///
    /// # Returns
    ///
    /// The number of new rows
    fn insert_media_batch(&mut self, records: &[MediaRecord]) -> StorageResult<usize>;

    /// Gets the distinct download links that have not been exported yet
    fn select_unextracted_links(&self) -> StorageResult<Vec<String>>;

    /// Marks the given links as exported
    ///
    /// # Returns
    ///
    /// The number of rows that changed
    fn mark_extracted(&mut self, links: &[String]) -> StorageResult<usize>;

    // ===== Statistics =====

    /// Counts stored user profiles
    fn count_users(&self) -> StorageResult<u64>;

    /// Counts stored media rows
    fn count_media(&self) -> StorageResult<u64>;

    /// Counts media rows not yet exported
    fn count_unextracted(&self) -> StorageResult<u64>;
}
