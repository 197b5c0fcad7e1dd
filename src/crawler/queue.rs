//! Job queue for pending listing pages
//!
//! The queue tracks two things under one lock: the pages waiting to be
//! fetched and the number of fetches currently in flight. Taking a job out
//! for fetching and settling it afterwards each happen in a single critical
//! section, so "nothing pending and nothing in flight" can be read without
//! racing a fetch that is about to put its page back.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One page of a listing waiting to be fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageJob {
    /// 1-based page index
    pub page: u32,

    /// 1-based attempt number for this page
    pub attempt: u32,
}

impl PageJob {
    /// Creates the first attempt for a page
    pub fn new(page: u32) -> Self {
        Self { page, attempt: 1 }
    }

    /// Creates the next attempt for the same page
    pub fn retry(&self) -> Self {
        Self {
            page: self.page,
            attempt: self.attempt + 1,
        }
    }
}

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<PageJob>,
    in_flight: usize,
}

/// Thread-safe FIFO of pending page jobs with an in-flight counter
#[derive(Debug, Default)]
pub struct JobQueue {
    state: Mutex<QueueState>,
}

impl JobQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueues first attempts for pages `1..=total_pages`
    pub fn seed_pages(&self, total_pages: u32) {
        self.lock().pending.extend((1..=total_pages).map(PageJob::new));
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds a job to the back of the queue
    pub fn enqueue(&self, job: PageJob) {
        self.lock().pending.push_back(job);
    }

    /// Removes the next job without waiting
    ///
    /// Returns `None` when the queue is momentarily empty.
    pub fn try_dequeue(&self) -> Option<PageJob> {
        self.lock().pending.pop_front()
    }

    /// Number of pending jobs
    pub fn size(&self) -> usize {
        self.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().pending.is_empty()
    }

    /// Number of jobs checked out and not yet settled
    pub fn in_flight(&self) -> usize {
        self.lock().in_flight
    }

    /// True when nothing is pending and nothing is in flight
    pub fn is_settled(&self) -> bool {
        let state = self.lock();
        state.pending.is_empty() && state.in_flight == 0
    }

    /// Removes the next job and counts it as in flight
    ///
    /// The returned guard must be settled with [`InFlight::complete`],
    /// [`InFlight::requeue`] or [`InFlight::abandon`]. A guard dropped
    /// unsettled puts the page back as a retry.
    pub fn checkout(self: &Arc<Self>) -> Option<InFlight> {
        let mut state = self.lock();
        let job = state.pending.pop_front()?;
        state.in_flight += 1;

        Some(InFlight {
            queue: Arc::clone(self),
            job,
            settled: false,
        })
    }

    fn settle(&self, next: Option<PageJob>) {
        let mut state = self.lock();
        state.in_flight = state.in_flight.saturating_sub(1);
        if let Some(job) = next {
            state.pending.push_back(job);
        }
    }
}

/// A job that has been checked out of a [`JobQueue`]
#[derive(Debug)]
pub struct InFlight {
    queue: Arc<JobQueue>,
    job: PageJob,
    settled: bool,
}

impl InFlight {
    pub fn job(&self) -> PageJob {
        self.job
    }

    /// Settles a successful fetch
    pub fn complete(mut self) {
        self.settle(None);
    }

    /// Settles a failed fetch and puts `next` back in the queue
    pub fn requeue(mut self, next: PageJob) {
        self.settle(Some(next));
    }

    /// Settles a failed fetch without putting the page back
    pub fn abandon(mut self) {
        self.settle(None);
    }

    fn settle(&mut self, next: Option<PageJob>) {
        if !self.settled {
            self.settled = true;
            self.queue.settle(next);
        }
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let retry = self.job.retry();
        self.settle(Some(retry));
    }
}
