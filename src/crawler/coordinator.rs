//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that ties the pieces together:
//! - A fixed pool of workers pulling jobs from a bounded dispatch channel
//! - The scheduler, owned by the loop, fed by worker results
//! - A sink task draining fetched pages
//! - Cancellation and quiescence detection
//!
//! The loop never blocks on the dispatch channel: it only hands out a job
//! once a slot is reserved, while still receiving results. Workers can
//! therefore always deliver a result, and the crawl cannot deadlock however
//! many links a page yields.

use crate::config::Config;
use crate::crawler::fetcher::Fetcher;
use crate::crawler::scheduler::Scheduler;
use crate::crawler::types::{CrawlError, CrawlJob, CrawlSummary, FetchedPage};
use crate::sink::{drain_pages, PageSink, SinkFailurePolicy};
use crate::CrawlerError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Pages buffered between the crawl loop and the sink task
const PAGE_BUFFER: usize = 64;

/// What a worker reports for one job
#[derive(Debug)]
enum FetchOutcome {
    Fetched { page: FetchedPage, depth: u32 },
    Failed { error: CrawlError },
}

type SharedJobs = Arc<Mutex<mpsc::Receiver<CrawlJob>>>;

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Config,
    fetcher: Fetcher,
    scheduler: Scheduler,
    sink: Box<dyn PageSink>,
    cancel: CancellationToken,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The validated crawler configuration
    /// * `seed` - The address the crawl starts from
    /// * `sink` - Where fetched pages are written
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(CrawlerError)` - The HTTP client could not be built
    pub fn new(config: Config, seed: Url, sink: Box<dyn PageSink>) -> Result<Self, CrawlerError> {
        let fetcher = Fetcher::from_config(&config.crawler, &config.user_agent)?;

        Ok(Self {
            scheduler: Scheduler::new(seed),
            config,
            fetcher,
            sink,
            cancel: CancellationToken::new(),
        })
    }

    /// Uses `token` to stop the crawl early
    ///
    /// Cancelling drops queued addresses, lets in-flight fetches finish and
    /// their pages reach the sink, then returns a summary marked cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Runs the crawl until no work remains
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlSummary)` - The crawl reached quiescence
    /// * `Err(CrawlerError)` - The sink failed under the fatal policy, or a
    ///   task panicked
    pub async fn run(self) -> Result<CrawlSummary, CrawlerError> {
        let started = Instant::now();
        let Coordinator {
            config,
            fetcher,
            mut scheduler,
            sink,
            cancel,
        } = self;

        let workers = config.crawler.workers.max(1);
        tracing::info!(
            "Starting crawl with {} workers (dispatch capacity {})",
            workers,
            config.crawler.dispatch_capacity()
        );

        let (job_tx, job_rx) = mpsc::channel::<CrawlJob>(config.crawler.dispatch_capacity().max(1));
        let (result_tx, mut result_rx) = mpsc::unbounded_channel::<FetchOutcome>();
        let (page_tx, page_rx) = mpsc::channel::<FetchedPage>(PAGE_BUFFER);

        let policy = SinkFailurePolicy::from_config(&config.sink);
        let sink_handle = tokio::spawn(drain_pages(sink, page_rx, policy));
        let worker_handles = spawn_workers(
            workers,
            fetcher,
            job_rx,
            result_tx,
            config.crawler.fetch_delay(),
        );

        let mut summary = CrawlSummary::default();
        let mut sink_failed = false;

        while !scheduler.is_quiescent() {
            tokio::select! {
                _ = cancel.cancelled(), if !scheduler.is_cancelled() => {
                    let dropped = scheduler.cancel();
                    tracing::warn!(
                        "Crawl cancelled: dropped {} queued addresses, waiting for {} in flight",
                        dropped,
                        scheduler.outstanding()
                    );
                }
                outcome = result_rx.recv() => {
                    let Some(outcome) = outcome else {
                        tracing::error!("All workers exited with {} jobs outstanding", scheduler.outstanding());
                        break;
                    };

                    match outcome {
                        FetchOutcome::Fetched { page, depth } => {
                            summary.pages_fetched += 1;
                            let added = scheduler.record_page(&page, depth);
                            tracing::info!(
                                "Spidered {} (depth {}) - {} links, {} new",
                                page.url,
                                depth,
                                page.links.len(),
                                added
                            );

                            if page_tx.send(page).await.is_err() {
                                sink_failed = true;
                                break;
                            }
                        }
                        FetchOutcome::Failed { error } => {
                            summary.fetch_errors += 1;
                            tracing::warn!("{}", error);
                            scheduler.record_failure(&error);
                        }
                    }
                }
                permit = job_tx.reserve(), if scheduler.has_pending() => {
                    let Ok(permit) = permit else {
                        tracing::error!("Dispatch channel closed with {} jobs outstanding", scheduler.outstanding());
                        break;
                    };
                    if let Some(job) = scheduler.next_job() {
                        tracing::debug!("Dispatching {} (depth {})", job.url, job.depth);
                        permit.send(job);
                    }
                }
            }
        }

        // Closing the dispatch channel stops idle workers; dropping the result
        // receiver stops busy ones after their current fetch.
        drop(job_tx);
        drop(result_rx);
        drop(page_tx);

        for handle in worker_handles {
            handle.await?;
        }

        let stored = sink_handle.await?;
        if sink_failed {
            tracing::error!("Crawl aborted by sink failure");
        }
        summary.pages_stored = stored?;

        summary.cancelled = scheduler.is_cancelled();
        summary.visited = scheduler.into_visited();
        summary.elapsed = started.elapsed();

        tracing::info!(
            "Crawl finished in {:.1}s: {} pages fetched, {} errors, {} stored",
            summary.elapsed.as_secs_f64(),
            summary.pages_fetched,
            summary.fetch_errors,
            summary.pages_stored
        );

        Ok(summary)
    }
}

fn spawn_workers(
    count: usize,
    fetcher: Fetcher,
    jobs: mpsc::Receiver<CrawlJob>,
    results: mpsc::UnboundedSender<FetchOutcome>,
    delay: Duration,
) -> Vec<JoinHandle<()>> {
    let jobs: SharedJobs = Arc::new(Mutex::new(jobs));

    (0..count)
        .map(|id| {
            tokio::spawn(run_worker(
                id,
                fetcher.clone(),
                Arc::clone(&jobs),
                results.clone(),
                delay,
            ))
        })
        .collect()
}

/// Fetches jobs one at a time until the dispatch channel closes
async fn run_worker(
    id: usize,
    fetcher: Fetcher,
    jobs: SharedJobs,
    results: mpsc::UnboundedSender<FetchOutcome>,
    delay: Duration,
) {
    loop {
        let job = jobs.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };

        tracing::debug!("[worker {}] Loading {}", id, job.url);
        let outcome = match fetcher.fetch(&job.url).await {
            Ok(page) => FetchOutcome::Fetched {
                page,
                depth: job.depth,
            },
            Err(error) => FetchOutcome::Failed { error },
        };

        if results.send(outcome).is_err() {
            break;
        }

        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    tracing::trace!("[worker {}] Stopped", id);
}
