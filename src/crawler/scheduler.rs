//! Scheduler for managing the crawl frontier
//!
//! This module handles:
//! - FIFO frontier of addresses waiting for a worker
//! - The visited set, so every address is fetched at most once
//! - Counting outstanding work to detect when the crawl is finished
//!
//! The scheduler is plain synchronous state owned by the coordinator; workers
//! never touch it directly.

use crate::crawler::types::{CrawlError, CrawlJob, FetchedPage};
use crate::url::{is_web_url, strip_fragment, visit_key};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// Lifecycle of a crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    /// Only the seed is known, nothing dispatched yet
    Seeded,

    /// At least one job has been handed out and work remains
    Running,

    /// No work queued and none in flight; terminal
    Quiescent,
}

/// Scheduler owns the frontier, the visited set and the outstanding count
///
/// # Invariants
///
/// - Every address in the frontier is also in the visited set
/// - `outstanding` equals frontier length plus jobs dispatched whose
///   result has not been recorded yet
/// - Once `outstanding` reaches zero the state is `Quiescent` and the
///   frontier is empty
#[derive(Debug)]
pub struct Scheduler {
    /// Jobs waiting for a worker, in discovery order
    frontier: VecDeque<CrawlJob>,

    /// Visit keys of every address ever admitted
    visited: HashSet<String>,

    /// Admitted jobs whose result has not been recorded
    outstanding: usize,

    state: CrawlState,

    /// Set once the crawl is cancelled; no new addresses are admitted
    cancelled: bool,
}

impl Scheduler {
    /// Creates a scheduler holding only the seed
    pub fn new(seed: Url) -> Self {
        let seed = strip_fragment(seed);
        let mut visited = HashSet::new();
        visited.insert(visit_key(&seed));

        Self {
            frontier: VecDeque::from([CrawlJob::seed(seed)]),
            visited,
            outstanding: 1,
            state: CrawlState::Seeded,
            cancelled: false,
        }
    }

    /// Takes the next job from the frontier for dispatch
    ///
    /// The job stays counted as outstanding until its result is recorded.
    pub fn next_job(&mut self) -> Option<CrawlJob> {
        let job = self.frontier.pop_front()?;
        if self.state == CrawlState::Seeded {
            self.state = CrawlState::Running;
        }
        Some(job)
    }

    /// Returns true if jobs are waiting for dispatch
    pub fn has_pending(&self) -> bool {
        !self.frontier.is_empty()
    }

    /// Records a fetched page and admits its unseen web links
    ///
    /// # Arguments
    ///
    /// * `page` - The fetched page
    /// * `depth` - Depth of the job that fetched it
    ///
    /// # Returns
    ///
    /// The number of links newly added to the frontier
    pub fn record_page(&mut self, page: &FetchedPage, depth: u32) -> usize {
        let parent = CrawlJob {
            url: page.url.clone(),
            depth,
        };

        let mut added = 0;
        for link in &page.links {
            if self.admit(parent.child(link.clone())) {
                added += 1;
            }
        }

        self.complete_one();
        added
    }

    /// Records a failed fetch; the address stays visited and is not retried
    pub fn record_failure(&mut self, error: &CrawlError) {
        tracing::trace!("Recording failure for {}", error.url);
        self.complete_one();
    }

    /// Stops admitting addresses and drops everything not yet dispatched
    ///
    /// # Returns
    ///
    /// The number of queued jobs dropped
    pub fn cancel(&mut self) -> usize {
        self.cancelled = true;
        let dropped = self.frontier.len();
        self.frontier.clear();
        self.outstanding -= dropped;
        self.update_state();
        dropped
    }

    /// Returns true once no work is queued or in flight
    pub fn is_quiescent(&self) -> bool {
        self.state == CrawlState::Quiescent
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn state(&self) -> CrawlState {
        self.state
    }

    pub fn outstanding(&self) -> usize {
        self.outstanding
    }

    pub fn frontier_size(&self) -> usize {
        self.frontier.len()
    }

    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Consumes the scheduler, returning every admitted address sorted
    pub fn into_visited(self) -> Vec<String> {
        let mut visited: Vec<String> = self.visited.into_iter().collect();
        visited.sort();
        visited
    }

    /// Admits a job if its address is a web address not seen before
    fn admit(&mut self, job: CrawlJob) -> bool {
        if self.cancelled || !is_web_url(&job.url) {
            return false;
        }

        let job = CrawlJob {
            url: strip_fragment(job.url),
            depth: job.depth,
        };

        if !self.visited.insert(visit_key(&job.url)) {
            return false;
        }

        tracing::trace!("Queued {} at depth {}", job.url, job.depth);
        self.frontier.push_back(job);
        self.outstanding += 1;
        true
    }

    fn complete_one(&mut self) {
        debug_assert!(self.outstanding > self.frontier.len());
        self.outstanding = self.outstanding.saturating_sub(1);
        self.update_state();
    }

    fn update_state(&mut self) {
        if self.outstanding == 0 {
            debug_assert!(self.frontier.is_empty());
            self.state = CrawlState::Quiescent;
        }
    }
}
