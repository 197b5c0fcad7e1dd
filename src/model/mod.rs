//! Domain model for a harvest
//!
//! This module defines the records that flow through a crawl session.
//!
//! # Components
//!
//! - `CrawlMode`: Which listing of an account is paged (photos or favourites)
//! - `CrawlTarget`: The account/listing pair a fetch reads from
//! - `UserProfile`: Account metadata written once per nsid
//! - `MediaRecord`: One media item extracted from a listing page

mod media;
mod profile;

// Re-export main types
pub use media::{build_download_link, MediaRecord};
pub use profile::{CrawlMode, CrawlTarget, UserProfile};
