//! Records exchanged between the scheduler, the workers, and the sink

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// A unit of work: one address to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    /// The address to fetch (absolute, no fragment)
    pub url: Url,

    /// Link distance from the seed; informational only
    pub depth: u32,
}

impl CrawlJob {
    /// Creates the job for the seed address
    pub fn seed(url: Url) -> Self {
        Self { url, depth: 0 }
    }

    /// Creates a job for a link found on the page this job fetched
    pub fn child(&self, url: Url) -> Self {
        Self {
            url,
            depth: self.depth + 1,
        }
    }
}

/// A successfully fetched page and everything extracted from it
///
/// Serializes as `{"url", "content", "links", "phoneNumbers"}`, the document
/// shape sinks store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedPage {
    /// The address that was requested (not a redirect target)
    pub url: Url,

    /// Raw response body
    pub content: String,

    /// Absolute links in document order, fragments removed
    pub links: Vec<Url>,

    /// `tel://` references in document order, verbatim
    pub phone_numbers: Vec<String>,
}

/// Why a fetch failed
#[derive(Debug, Error)]
pub enum FetchFailure {
    #[error("Request timeout")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("Failed to read body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[source] reqwest::Error),
}

impl From<reqwest::Error> for FetchFailure {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Connect(error)
        } else if error.is_body() || error.is_decode() {
            Self::Body(error)
        } else {
            Self::Request(error)
        }
    }
}

/// A failed fetch, reported by a worker to the scheduler
#[derive(Debug, Error)]
#[error("Failed to fetch {url}: {source}")]
pub struct CrawlError {
    /// The address that could not be fetched
    pub url: Url,

    /// The underlying failure
    #[source]
    pub source: FetchFailure,
}

impl CrawlError {
    pub fn new(url: Url, source: impl Into<FetchFailure>) -> Self {
        Self {
            url,
            source: source.into(),
        }
    }
}

/// What a finished crawl reports back
#[derive(Debug, Clone, Default)]
pub struct CrawlSummary {
    /// Pages fetched successfully
    pub pages_fetched: u64,

    /// Fetches that failed
    pub fetch_errors: u64,

    /// Pages the sink accepted
    pub pages_stored: u64,

    /// Every address admitted to the frontier, sorted
    pub visited: Vec<String>,

    /// Whether the crawl stopped early on request
    pub cancelled: bool,

    /// Wall-clock duration of the crawl
    pub elapsed: Duration,
}
