//! Dispatcher - drives one crawl session to completion
//!
//! The dispatcher walks a session through
//! `Seeding -> Draining -> AwaitingCompletion -> Flushing -> Done`:
//!
//! - Seeding: page count from the listing size, pages `1..=n` enqueued
//! - Draining: every queued job is checked out and spawned as a fetch task
//! - AwaitingCompletion: wait for the next task to finish; a failed fetch
//!   puts its page back, which sends the session back to Draining
//! - Flushing: all collected records go to the store in one batch
//!
//! Fetch tasks live in a `JoinSet` owned by the session, and each task
//! settles its job in the queue before it exits. The set running dry after a
//! drain that found nothing to spawn therefore means the queue is empty and
//! no fetch is in flight, without looking at anything outside the session.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::crawler::collected::CollectedMedia;
use crate::crawler::fetcher::{FetchOutcome, PageFetcher};
use crate::crawler::limiter::ConcurrencyLimiter;
use crate::crawler::pages::pages_needed;
use crate::crawler::queue::{InFlight, JobQueue, PageJob};
use crate::model::{CrawlMode, CrawlTarget};
use crate::storage::{StorageError, Store};
use crate::HarvestError;
use std::sync::{Arc, Mutex};
use tokio::task::JoinSet;

/// Phase of a dispatcher
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DispatcherState {
    Seeding,
    Draining,
    AwaitingCompletion,
    Flushing,
    Done,
}

/// Shared state of one user/mode crawl
///
/// Holds the job queue (with its in-flight count) and the collected media.
/// The session is consumed by [`Dispatcher::run`].
#[derive(Debug)]
pub struct CrawlSession {
    target: CrawlTarget,
    queue: Arc<JobQueue>,
    collected: Arc<CollectedMedia>,
}

impl CrawlSession {
    pub fn new(target: CrawlTarget) -> Self {
        Self {
            target,
            queue: Arc::new(JobQueue::new()),
            collected: Arc::new(CollectedMedia::new()),
        }
    }

    pub fn target(&self) -> &CrawlTarget {
        &self.target
    }

    /// Handle to the session's job queue
    pub fn queue(&self) -> Arc<JobQueue> {
        Arc::clone(&self.queue)
    }

    /// Handle to the session's collected media
    pub fn collected(&self) -> Arc<CollectedMedia> {
        Arc::clone(&self.collected)
    }
}

/// Summary of a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub user_id: String,
    pub mode: CrawlMode,
    /// Pages seeded into the queue
    pub total_pages: u32,
    /// Fetch attempts across all pages
    pub attempts: u64,
    /// Attempts that ended in a remote or transport error
    pub failed_attempts: u64,
    /// Records handed to the store
    pub media_collected: usize,
    /// Records the store reported as new
    pub media_inserted: usize,
}

/// What a fetch task did with its job
#[derive(Debug)]
enum Attempt {
    Fetched { job: PageJob, records: usize },
    Requeued { job: PageJob },
    Exhausted { job: PageJob },
}

#[derive(Debug, Default)]
struct Tally {
    attempts: u64,
    failed_attempts: u64,
}

/// Runs crawl sessions: seeds, drains and flushes
pub struct Dispatcher {
    fetcher: Arc<dyn PageFetcher>,
    limiter: ConcurrencyLimiter,
    page_size: u32,
    max_page_attempts: Option<u32>,
    state: DispatcherState,
}

impl Dispatcher {
    /// Creates a dispatcher with the default page size and unbounded retries
    pub fn new(fetcher: Arc<dyn PageFetcher>, limiter: ConcurrencyLimiter) -> Self {
        Self {
            fetcher,
            limiter,
            page_size: DEFAULT_PAGE_SIZE,
            max_page_attempts: None,
            state: DispatcherState::Seeding,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Caps the attempts per page; `None` retries failed pages forever
    pub fn with_max_page_attempts(mut self, max_page_attempts: Option<u32>) -> Self {
        self.max_page_attempts = max_page_attempts;
        self
    }

    /// Crawls every page of the session's listing and flushes the result
    ///
    /// # Arguments
    ///
    /// * `session` - The session to drive
    /// * `item_count` - Size of the listing, from the profile lookup
    /// * `store` - Store receiving the single media batch
    ///
    /// # Returns
    ///
    /// * `Ok(SessionReport)` - Every page was fetched and the batch was stored
    /// * `Err(HarvestError)` - A page ran out of attempts or the flush failed
    pub async fn run<S: Store + ?Sized>(
        mut self,
        session: CrawlSession,
        item_count: u64,
        store: &Mutex<S>,
    ) -> Result<SessionReport, HarvestError> {
        let total_pages = self.seed(&session, item_count);
        let tally = self.drain(&session).await?;
        let (media_collected, media_inserted) = self.flush(&session, store)?;
        self.transition(DispatcherState::Done);

        tracing::info!(
            "Session for {} ({}) done: {} pages, {} attempts ({} failed), {} records ({} new)",
            session.target.user_id,
            session.target.mode,
            total_pages,
            tally.attempts,
            tally.failed_attempts,
            media_collected,
            media_inserted
        );

        Ok(SessionReport {
            user_id: session.target.user_id.clone(),
            mode: session.target.mode,
            total_pages,
            attempts: tally.attempts,
            failed_attempts: tally.failed_attempts,
            media_collected,
            media_inserted,
        })
    }

    fn transition(&mut self, next: DispatcherState) {
        if self.state != next {
            tracing::trace!("Dispatcher {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }

    fn seed(&mut self, session: &CrawlSession, item_count: u64) -> u32 {
        self.transition(DispatcherState::Seeding);

        let total_pages = pages_needed(item_count, self.page_size);
        session.queue.seed_pages(total_pages);

        tracing::info!(
            "Queued {} pages for {} items ({} per page)",
            session.queue.size(),
            item_count,
            self.page_size
        );
        total_pages
    }

    async fn drain(&mut self, session: &CrawlSession) -> Result<Tally, HarvestError> {
        let mut tasks = JoinSet::new();
        let mut tally = Tally::default();
        let mut exhausted = None;

        loop {
            if exhausted.is_none() {
                self.transition(DispatcherState::Draining);
                while let Some(job) = session.queue.checkout() {
                    let page_job = job.job();

                    // Only a panicked attempt puts its page back past the cap
                    if self.over_cap(page_job) {
                        tracing::error!(
                            "Page {} panicked on its last attempt ({}), giving up",
                            page_job.page,
                            page_job.attempt - 1
                        );
                        job.abandon();
                        tasks.abort_all();
                        exhausted = Some(PageJob {
                            page: page_job.page,
                            attempt: page_job.attempt - 1,
                        });
                        break;
                    }

                    tasks.spawn(run_attempt(
                        job,
                        session.target.clone(),
                        Arc::clone(&self.fetcher),
                        self.limiter.clone(),
                        Arc::clone(&session.collected),
                        self.max_page_attempts,
                    ));
                }
            }

            self.transition(DispatcherState::AwaitingCompletion);
            let attempt = match tasks.join_next().await {
                None => break,
                Some(Ok(attempt)) => attempt,
                Some(Err(e)) if e.is_cancelled() => continue,
                Some(Err(e)) => {
                    // The task's job guard has already put the page back
                    tracing::error!("Fetch task panicked: {}", e);
                    tally.attempts += 1;
                    tally.failed_attempts += 1;
                    continue;
                }
            };

            tally.attempts += 1;
            match attempt {
                Attempt::Fetched { job, records } => {
                    tracing::debug!(
                        "Page {} fetched on attempt {} ({} items)",
                        job.page,
                        job.attempt,
                        records
                    );
                }
                Attempt::Requeued { job } => {
                    tracing::trace!("Page {} back in the queue", job.page);
                    tally.failed_attempts += 1;
                }
                Attempt::Exhausted { job } => {
                    tally.failed_attempts += 1;
                    if exhausted.is_none() {
                        tasks.abort_all();
                        exhausted = Some(job);
                    }
                }
            }
        }

        if let Some(job) = exhausted {
            return Err(HarvestError::RetriesExhausted {
                page: job.page,
                attempts: job.attempt,
            });
        }

        debug_assert!(session.queue.is_settled());
        Ok(tally)
    }

    fn over_cap(&self, job: PageJob) -> bool {
        self.max_page_attempts.is_some_and(|max| job.attempt > max)
    }

    fn flush<S: Store + ?Sized>(
        &mut self,
        session: &CrawlSession,
        store: &Mutex<S>,
    ) -> Result<(usize, usize), HarvestError> {
        self.transition(DispatcherState::Flushing);

        let records = session.collected.take();
        let mut store = store.lock().map_err(|_| {
            HarvestError::store(
                "insert media batch",
                StorageError::Unavailable("store lock poisoned".to_string()),
            )
        })?;

        let inserted = store
            .insert_media_batch(&records)
            .map_err(|e| HarvestError::store("insert media batch", e))?;

        tracing::info!(
            "Media: {} inserted successfully ({} collected)",
            inserted,
            records.len()
        );
        Ok((records.len(), inserted))
    }
}

/// One fetch attempt, run as its own task
///
/// The permit is held only around the fetch. The job is settled before the
/// task returns; a panic settles it through the guard's drop instead.
async fn run_attempt(
    job: InFlight,
    target: CrawlTarget,
    fetcher: Arc<dyn PageFetcher>,
    limiter: ConcurrencyLimiter,
    collected: Arc<CollectedMedia>,
    max_page_attempts: Option<u32>,
) -> Attempt {
    let page_job = job.job();

    let outcome = match limiter.acquire().await {
        Ok(_permit) => {
            tracing::debug!(
                "Start download from page {} (attempt {})",
                page_job.page,
                page_job.attempt
            );
            fetcher.fetch(&target, page_job.page).await
        }
        Err(e) => FetchOutcome::TransportError {
            cause: e.to_string(),
        },
    };

    match outcome {
        FetchOutcome::Success { records } => {
            let count = records.len();
            collected.extend(records);
            job.complete();
            Attempt::Fetched {
                job: page_job,
                records: count,
            }
        }
        FetchOutcome::RemoteError { message } => {
            settle_failure(job, max_page_attempts, &format!("remote error: {}", message))
        }
        FetchOutcome::TransportError { cause } => {
            settle_failure(job, max_page_attempts, &format!("transport error: {}", cause))
        }
    }
}

fn settle_failure(job: InFlight, max_page_attempts: Option<u32>, reason: &str) -> Attempt {
    let page_job = job.job();

    if max_page_attempts.is_some_and(|max| page_job.attempt >= max) {
        tracing::error!(
            "Page {} failed on attempt {}, no attempts left: {}",
            page_job.page,
            page_job.attempt,
            reason
        );
        job.abandon();
        return Attempt::Exhausted { job: page_job };
    }

    tracing::warn!(
        "Page {} failed on attempt {}, re-queued: {}",
        page_job.page,
        page_job.attempt,
        reason
    );
    job.requeue(page_job.retry());
    Attempt::Requeued { job: page_job }
}
