//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! harvest statistics from the storage layer.

use crate::storage::Store;
use crate::HarvestError;

/// Harvest statistics summary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HarvestStatistics {
    /// Number of stored user profiles
    pub users: u64,

    /// Number of stored media records
    pub media: u64,

    /// Media records whose link has not been exported yet
    pub unextracted: u64,
}

impl HarvestStatistics {
    /// Media records already exported
    pub fn extracted(&self) -> u64 {
        self.media.saturating_sub(self.unextracted)
    }
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `store` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(store: &dyn Store) -> Result<HarvestStatistics, HarvestError> {
    let users = store
        .count_users()
        .map_err(|e| HarvestError::store("count users", e))?;
    let media = store
        .count_media()
        .map_err(|e| HarvestError::store("count media", e))?;
    let unextracted = store
        .count_unextracted()
        .map_err(|e| HarvestError::store("count unextracted media", e))?;

    Ok(HarvestStatistics {
        users,
        media,
        unextracted,
    })
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Users stored: {}", stats.users);
    println!("  Media stored: {}", stats.media);
    println!();

    let exported_rate = if stats.media > 0 {
        (stats.extracted() as f64 / stats.media as f64) * 100.0
    } else {
        0.0
    };

    println!("Export:");
    println!("  Exported: {}", stats.extracted());
    println!("  Pending: {}", stats.unextracted);
    println!(
        "  Export Rate: {:.1}% ({} / {} links exported)",
        exported_rate,
        stats.extracted(),
        stats.media
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaRecord, UserProfile};
    use crate::storage::SqliteStore;

    fn profile(nsid: &str) -> UserProfile {
        UserProfile {
            nsid: nsid.to_string(),
            username: nsid.to_string(),
            path_alias: None,
            is_pro: false,
            is_ad_free: false,
            is_deleted: false,
            total_items: 0,
            total_pages: 0,
            favorite_count: 0,
            favorite_pages: 0,
            date_created: None,
        }
    }

    fn record(link: &str) -> MediaRecord {
        MediaRecord::new("1@N01", "t", true, true, link)
    }

    #[test]
    fn test_extracted_never_underflows() {
        let stats = HarvestStatistics {
            users: 1,
            media: 2,
            unextracted: 5,
        };
        assert_eq!(stats.extracted(), 0);
    }

    #[test]
    fn test_load_statistics() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.upsert_user_if_absent(&profile("1@N01")).unwrap();
        store.upsert_user_if_absent(&profile("2@N01")).unwrap();
        store
            .insert_media_batch(&[record("http://a/1"), record("http://a/2"), record("http://a/3")])
            .unwrap();
        store.mark_extracted(&["http://a/2".to_string()]).unwrap();

        let stats = load_statistics(&store).unwrap();

        assert_eq!(
            stats,
            HarvestStatistics {
                users: 2,
                media: 3,
                unextracted: 2,
            }
        );
        assert_eq!(stats.extracted(), 1);
    }

    #[test]
    fn test_empty_database() {
        let store = SqliteStore::open_in_memory().unwrap();
        assert_eq!(load_statistics(&store).unwrap(), HarvestStatistics::default());
    }
}
