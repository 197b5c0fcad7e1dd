//! Shared accumulation of media records for one crawl session

use crate::model::MediaRecord;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only, lock-guarded collection of media records
///
/// Fetch tasks append their page's records and keep no reference to them
/// afterwards. The dispatcher takes the whole collection once, at flush.
#[derive(Debug, Default)]
pub struct CollectedMedia {
    records: Mutex<Vec<MediaRecord>>,
}

impl CollectedMedia {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<MediaRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends one page's records
    pub fn extend(&self, records: Vec<MediaRecord>) {
        self.lock().extend(records);
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Copies the current records
    pub fn snapshot(&self) -> Vec<MediaRecord> {
        self.lock().clone()
    }

    /// Moves every record out, leaving the collection empty
    pub fn take(&self) -> Vec<MediaRecord> {
        std::mem::take(&mut *self.lock())
    }
}
