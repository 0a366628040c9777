//! Sink module for handing fetched pages to an indexing backend
//!
//! This module handles:
//! - The `PageSink` trait and its HTTP, SQLite, log and in-memory backends
//! - Building the configured sink
//! - The sink task that drains fetched pages and applies the failure policy
//!
//! Pages are delivered to the sink from one task, so a slow backend never
//! blocks a worker; it only fills the page channel.

mod http;
mod log;
mod memory;
mod sqlite;
mod traits;

pub use self::http::HttpSink;
pub use self::log::LogSink;
pub use self::memory::MemorySink;
pub use self::sqlite::{initialize_schema, SqliteSink, StoredPage};
pub use self::traits::{PageSink, SinkError, SinkResult};

use crate::config::{Config, SinkConfig, SinkFailureMode, SinkKind};
use crate::crawler::FetchedPage;
use crate::CrawlerError;
use std::path::Path;
use std::time::Duration;
use tokio::sync::mpsc;

/// What a failed write does to the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkFailurePolicy {
    /// Stop the crawl and surface the error
    Fatal,

    /// Log, drop the page, keep crawling
    Continue,

    /// Try up to `attempts` times in total, pausing `backoff` in between,
    /// then drop the page and keep crawling
    Retry { attempts: u32, backoff: Duration },
}

impl SinkFailurePolicy {
    pub fn from_config(config: &SinkConfig) -> Self {
        match config.failure_policy {
            SinkFailureMode::Fatal => Self::Fatal,
            SinkFailureMode::Continue => Self::Continue,
            SinkFailureMode::Retry => Self::Retry {
                attempts: config.retry_attempts.max(1),
                backoff: Duration::from_millis(config.retry_backoff_ms),
            },
        }
    }
}

/// Builds the sink selected by configuration
///
/// The HTTP sink uses the crawler's request timeouts and user agent, so an
/// unresponsive store fails the write instead of stalling the crawl.
///
/// # Returns
///
/// * `Ok(Box<dyn PageSink>)` - The sink, ready to receive pages
/// * `Err(SinkError)` - The endpoint or database could not be opened
pub fn build_sink(config: &Config) -> SinkResult<Box<dyn PageSink>> {
    let sink: Box<dyn PageSink> = match config.sink.kind {
        SinkKind::Log => Box::new(LogSink::default()),
        SinkKind::Http => Box::new(HttpSink::from_config(
            &config.sink.endpoint,
            &config.crawler,
            &config.user_agent,
        )?),
        SinkKind::Sqlite => Box::new(SqliteSink::open(Path::new(&config.sink.database_path))?),
    };

    tracing::info!("Using {} sink", sink.name());
    Ok(sink)
}

/// Stores every page received until the channel closes
///
/// Runs as its own task. Under `Fatal` the first failed write ends the task
/// with `CrawlerError::SinkWrite`; dropping the receiver is how the crawl
/// loop learns about it.
///
/// # Returns
///
/// The number of pages the sink accepted
pub async fn drain_pages(
    mut sink: Box<dyn PageSink>,
    mut pages: mpsc::Receiver<FetchedPage>,
    policy: SinkFailurePolicy,
) -> Result<u64, CrawlerError> {
    let mut stored = 0;

    while let Some(page) = pages.recv().await {
        match store_with_policy(sink.as_mut(), &page, policy).await {
            Ok(()) => stored += 1,
            Err(error) if policy == SinkFailurePolicy::Fatal => {
                tracing::error!("Sink {} failed on {}: {}", sink.name(), page.url, error);
                if let Err(e) = sink.finish().await {
                    tracing::warn!("Sink {} did not finish cleanly: {}", sink.name(), e);
                }
                return Err(CrawlerError::SinkWrite {
                    url: page.url.to_string(),
                    source: error,
                });
            }
            Err(error) => {
                tracing::warn!("Dropping page {} after sink failure: {}", page.url, error);
            }
        }
    }

    sink.finish().await?;
    tracing::info!("Sink {} stored {} pages", sink.name(), stored);
    Ok(stored)
}

async fn store_with_policy(
    sink: &mut dyn PageSink,
    page: &FetchedPage,
    policy: SinkFailurePolicy,
) -> SinkResult<()> {
    let (attempts, backoff) = match policy {
        SinkFailurePolicy::Retry { attempts, backoff } => (attempts.max(1), backoff),
        _ => (1, Duration::ZERO),
    };

    let mut attempt = 1;
    loop {
        match sink.store(page).await {
            Ok(()) => return Ok(()),
            Err(error) if attempt < attempts => {
                tracing::warn!(
                    "Sink write for {} failed (attempt {}/{}): {}",
                    page.url,
                    attempt,
                    attempts,
                    error
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}
