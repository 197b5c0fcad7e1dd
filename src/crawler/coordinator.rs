//! Crawler coordinator - per-user harvest orchestration
//!
//! For every user the coordinator looks up the account, stores its profile,
//! and hands a fresh [`CrawlSession`] to a [`Dispatcher`]. Users are handled
//! one after another; a failed session is reported and the next user starts.

use crate::config::Config;
use crate::crawler::dispatcher::{CrawlSession, Dispatcher, SessionReport};
use crate::crawler::fetcher::{ApiClient, HttpFetcher, PageFetcher};
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::profile::lookup_profile;
use crate::model::CrawlTarget;
use crate::storage::{SqliteStore, StorageError, Store};
use crate::HarvestError;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::Instrument;

/// Result of one user's session
#[derive(Debug)]
pub struct SessionOutcome {
    pub user: String,
    pub result: Result<SessionReport, HarvestError>,
}

impl SessionOutcome {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Main harvest coordinator
pub struct Coordinator<S: Store = SqliteStore> {
    config: Arc<Config>,
    store: Arc<Mutex<S>>,
    api: ApiClient,
    fetcher: Arc<dyn PageFetcher>,
}

impl Coordinator<SqliteStore> {
    /// Creates a coordinator backed by the configured SQLite database
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Store opened and HTTP client built
    /// * `Err(HarvestError)` - Failed to open the database or build the client
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let store = SqliteStore::new(Path::new(&config.output.database_path))?;
        Self::with_store(config, store)
    }
}

impl<S: Store> Coordinator<S> {
    /// Creates a coordinator writing to the given store
    pub fn with_store(config: Config, store: S) -> Result<Self, HarvestError> {
        let api = ApiClient::new(&config.api, config.crawler.request_timeout())?;
        let fetcher = HttpFetcher::new(
            api.clone(),
            config.crawler.page_size,
            config.api.media_base_url.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            store: Arc::new(Mutex::new(store)),
            api,
            fetcher: Arc::new(fetcher),
        })
    }

    /// Handle to the shared store
    pub fn store(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.store)
    }

    /// Runs the sessions for all users in order
    ///
    /// Every user gets an outcome, whether or not earlier sessions failed.
    pub async fn run(&self, users: &[String]) -> Vec<SessionOutcome> {
        let mut outcomes = Vec::with_capacity(users.len());

        for user in users {
            let result = self.run_session(user).await;
            if let Err(e) = &result {
                tracing::error!("Session for {} failed: {}", user, e);
            }
            outcomes.push(SessionOutcome {
                user: user.clone(),
                result,
            });
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        tracing::info!(
            "Harvest finished: {} sessions, {} failed",
            outcomes.len(),
            failed
        );
        outcomes
    }

    /// Harvests one user's listing in the configured mode
    pub async fn run_session(&self, user: &str) -> Result<SessionReport, HarvestError> {
        let span = tracing::info_span!("session", user = %user, mode = %self.config.crawler.mode);
        self.session(user).instrument(span).await
    }

    async fn session(&self, user: &str) -> Result<SessionReport, HarvestError> {
        let mode = self.config.crawler.mode;
        tracing::info!("Starting {} harvest", mode);

        let profile = lookup_profile(&self.api, user, self.config.crawler.page_size).await?;

        let stored = {
            let mut store = self.store.lock().map_err(|_| poisoned("upsert user"))?;
            store
                .upsert_user_if_absent(&profile)
                .map_err(|e| HarvestError::store("upsert user", e))?
        };
        if stored {
            tracing::info!("User {} stored", profile.nsid);
        } else {
            tracing::debug!("User {} already stored", profile.nsid);
        }

        let session = CrawlSession::new(CrawlTarget::new(profile.nsid.clone(), mode));
        let limiter = ConcurrencyLimiter::new(self.config.crawler.concurrency_limit);

        Dispatcher::new(Arc::clone(&self.fetcher), limiter)
            .with_page_size(self.config.crawler.page_size)
            .with_max_page_attempts(self.config.crawler.max_page_attempts)
            .run(session, profile.item_count(mode), self.store.as_ref())
            .await
    }
}

fn poisoned(operation: &str) -> HarvestError {
    HarvestError::store(
        operation,
        StorageError::Unavailable("store lock poisoned".to_string()),
    )
}
