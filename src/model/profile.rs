//! Account-level definitions for a crawl
//!
//! A crawl reads one listing (photos or favourites) of one account.

use serde::Deserialize;
use std::fmt;

/// The listing of an account that a session pages through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    /// The account's own uploads
    #[serde(alias = "pic")]
    Photos,

    /// Media the account has marked as favourite
    #[serde(alias = "fav")]
    Favorites,
}

impl CrawlMode {
    /// Returns the REST method that lists this mode's media
    pub fn api_method(&self) -> &'static str {
        match self {
            Self::Photos => "flickr.people.getPhotos",
            Self::Favorites => "flickr.favorites.getList",
        }
    }
}

impl fmt::Display for CrawlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Photos => write!(f, "photos"),
            Self::Favorites => write!(f, "favorites"),
        }
    }
}

/// Identifies what a page fetch reads: one listing of one account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The account's nsid
    pub user_id: String,

    /// Which listing is paged
    pub mode: CrawlMode,
}

impl CrawlTarget {
    pub fn new(user_id: impl Into<String>, mode: CrawlMode) -> Self {
        Self {
            user_id: user_id.into(),
            mode,
        }
    }
}

/// Account metadata gathered before a crawl starts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    /// Stable account identifier (identity key in the store)
    pub nsid: String,
    pub username: String,
    pub path_alias: Option<String>,

    pub is_pro: bool,
    pub is_ad_free: bool,
    pub is_deleted: bool,

    /// Number of uploads
    pub total_items: u64,
    /// Pages needed to list the uploads
    pub total_pages: u32,
    /// Number of favourites
    pub favorite_count: u64,
    /// Pages needed to list the favourites
    pub favorite_pages: u32,

    pub date_created: Option<String>,
}

impl UserProfile {
    /// Returns the item count of the listing selected by `mode`
    pub fn item_count(&self, mode: CrawlMode) -> u64 {
        match mode {
            CrawlMode::Photos => self.total_items,
            CrawlMode::Favorites => self.favorite_count,
        }
    }

    /// Returns the page count of the listing selected by `mode`
    pub fn page_count(&self, mode: CrawlMode) -> u32 {
        match mode {
            CrawlMode::Photos => self.total_pages,
            CrawlMode::Favorites => self.favorite_pages,
        }
    }
}
