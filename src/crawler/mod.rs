//! Crawler module for paged listing harvests
//!
//! This module contains the core harvesting logic, including:
//! - Page counting and the per-session job queue
//! - Bounded-concurrency page fetching with retry on failure
//! - API response parsing into media records
//! - Per-user session orchestration

mod collected;
mod coordinator;
mod dispatcher;
mod fetcher;
mod limiter;
mod pages;
mod parser;
mod profile;
mod queue;

pub use collected::CollectedMedia;
pub use coordinator::{Coordinator, SessionOutcome};
pub use dispatcher::{CrawlSession, Dispatcher, SessionReport};
pub use fetcher::{build_http_client, ApiClient, CallError, FetchOutcome, HttpFetcher, PageFetcher};
pub use limiter::{ConcurrencyLimiter, Permit};
pub use pages::pages_needed;
pub use parser::{extract_media, parse_response, ApiResponse, MissingListing};
pub use profile::{lookup_profile, LookupOutcome};
pub use queue::{InFlight, JobQueue, PageJob};

use crate::config::Config;
use crate::HarvestError;

/// Runs a complete harvest
///
/// This is the main entry point for harvesting. It will:
/// 1. Open the configured database
/// 2. Build the HTTP client
/// 3. Look up and store each user's profile
/// 4. Fetch every page of the configured listing
/// 5. Store the collected media
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `users` - Usernames or nsids to harvest, in order
///
/// # Returns
///
/// * `Ok(Vec<SessionOutcome>)` - One outcome per user
/// * `Err(HarvestError)` - Setup failed before any session ran
///
/// # Example
///
/// ```no_run
/// use flickr_harvest::config::load_config;
/// use flickr_harvest::crawler::harvest;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("harvest.toml"))?;
/// let users = config.crawler.users.clone();
/// for outcome in harvest(config, &users).await? {
///     println!("{}: {}", outcome.user, outcome.is_success());
/// }
/// # Ok(())
/// # }
/// ```
pub async fn harvest(config: Config, users: &[String]) -> Result<Vec<SessionOutcome>, HarvestError> {
    let coordinator = Coordinator::new(config)?;
    Ok(coordinator.run(users).await)
}

/// Looks up every user without crawling or touching the database
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `users` - Usernames or nsids to look up, in order
///
/// # Returns
///
/// * `Ok(Vec<LookupOutcome>)` - One outcome per user
/// * `Err(HarvestError)` - The HTTP client could not be built
pub async fn preview(config: &Config, users: &[String]) -> Result<Vec<LookupOutcome>, HarvestError> {
    let api = ApiClient::new(&config.api, config.crawler.request_timeout())?;

    let mut outcomes = Vec::with_capacity(users.len());
    for user in users {
        let result = lookup_profile(&api, user, config.crawler.page_size).await;
        if let Err(e) = &result {
            tracing::warn!("Lookup for {} failed: {}", user, e);
        }
        outcomes.push(LookupOutcome {
            user: user.clone(),
            result,
        });
    }
    Ok(outcomes)
}
