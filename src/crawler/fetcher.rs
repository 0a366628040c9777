//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - GET requests to fetch page content
//! - Error classification
//!
//! Every response status is treated as a page: a 404 body still gets its
//! links extracted.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::extractor::{extract_links, ExtractedLinks};
use crate::crawler::types::{CrawlError, FetchedPage};
use reqwest::Client;
use url::Url;

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `crawler` - Timeouts for connecting and for whole requests
/// * `user_agent` - The identity sent with every request
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.fetch_timeout())
        .connect_timeout(crawler.connect_timeout())
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages and extracts their links
///
/// Cloning is cheap; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher around an existing client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a fetcher with a client built from configuration
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(crawler, user_agent)?))
    }

    /// Fetches one address and extracts links and phone numbers from it
    ///
    /// # Arguments
    ///
    /// * `url` - The address to fetch
    ///
    /// # Returns
    ///
    /// * `Ok(FetchedPage)` - The body was read, whatever the status code
    /// * `Err(CrawlError)` - The request or the body read failed
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, CrawlError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| CrawlError::new(url.clone(), e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!("{} answered with status {}", url, status);
        }

        let content = response
            .text()
            .await
            .map_err(|e| CrawlError::new(url.clone(), e))?;

        let ExtractedLinks {
            links,
            phone_numbers,
        } = extract_links(url, &content);

        tracing::info!("Loaded page {} ({}, {} bytes)", url, status.as_u16(), content.len());

        Ok(FetchedPage {
            url: url.clone(),
            content,
            links,
            phone_numbers,
        })
    }
}
