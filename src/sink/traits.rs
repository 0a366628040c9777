//! Sink traits and error types
//!
//! This module defines the trait interface for page sinks and associated
//! error types.

use crate::crawler::FetchedPage;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while storing a page
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store rejected document with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Sink unavailable: {0}")]
    Unavailable(String),
}

/// Result type for sink operations
pub type SinkResult<T> = Result<T, SinkError>;

/// Trait for page sink implementations
///
/// A sink receives every successfully fetched page exactly once, one at a
/// time, from a single task. Implementations need not be thread-safe.
#[async_trait]
pub trait PageSink: Send {
    /// Short name used in log lines
    fn name(&self) -> &'static str;

    /// Stores one page
    ///
    /// Storing a page whose address was already stored replaces it.
    async fn store(&mut self, page: &FetchedPage) -> SinkResult<()>;

    /// Called once after the last page
    async fn finish(&mut self) -> SinkResult<()> {
        Ok(())
    }
}
