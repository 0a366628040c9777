//! Kraul: a breadth-first web crawler
//!
//! This crate crawls outward from a single seed address with a fixed pool of
//! concurrent workers, extracting hyperlinks and `tel://` references from every
//! page it fetches and handing each page to a pluggable sink for indexing.

pub mod config;
pub mod crawler;
pub mod sink;
pub mod url;

use thiserror::Error;

/// Main error type for Kraul operations
#[derive(Debug, Error)]
pub enum CrawlerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid seed address '{seed}': {reason}")]
    InvalidSeed { seed: String, reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),

    #[error("Sink write failed for {url}: {source}")]
    SinkWrite {
        url: String,
        source: sink::SinkError,
    },

    #[error("Crawl task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors produced while resolving a link reference against a base address
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("Malformed reference '{reference}': {reason}")]
    MalformedReference { reference: String, reason: String },

    #[error("Base URL has no scheme / host")]
    MissingBase,
}

/// Result type alias for Kraul operations
pub type Result<T> = std::result::Result<T, CrawlerError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for link resolution
pub type ResolveResult<T> = std::result::Result<T, ResolveError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CrawlError, CrawlJob, CrawlSummary, FetchedPage};
pub use crate::url::{is_web_url, parse_seed, resolve, strip_fragment};
