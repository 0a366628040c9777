//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching
//! - HTML link and phone number extraction
//! - Frontier and visited-set bookkeeping
//! - Overall crawl coordination across a worker pool

mod coordinator;
mod extractor;
mod fetcher;
mod scheduler;
mod types;

pub use coordinator::Coordinator;
pub use extractor::{extract_links, ExtractedLinks};
pub use fetcher::{build_http_client, Fetcher};
pub use scheduler::{CrawlState, Scheduler};
pub use types::{CrawlError, CrawlJob, CrawlSummary, FetchFailure, FetchedPage};

use crate::config::Config;
use crate::sink::PageSink;
use crate::url::parse_seed;
use crate::CrawlerError;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the seed address
/// 2. Build the HTTP client
/// 3. Fetch pages breadth-first, following every new web link
/// 4. Hand each fetched page to the sink
/// 5. Return once nothing is queued or in flight
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `seed` - The absolute http(s) address to start from
/// * `sink` - Where fetched pages are written
///
/// # Returns
///
/// * `Ok(CrawlSummary)` - Crawl completed
/// * `Err(CrawlerError)` - The seed was invalid or the crawl failed
///
/// # Example
///
/// ```no_run
/// use kraul::config::Config;
/// use kraul::sink::LogSink;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let summary = kraul::crawl(Config::default(), "https://example.com/", Box::new(LogSink::default())).await?;
/// println!("Fetched {} pages", summary.pages_fetched);
/// # Ok(())
/// # }
/// ```
pub async fn crawl(
    config: Config,
    seed: &str,
    sink: Box<dyn PageSink>,
) -> Result<CrawlSummary, CrawlerError> {
    let seed = parse_seed(seed)?;
    Coordinator::new(config, seed, sink)?.run().await
}
