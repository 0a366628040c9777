//! Document-store sink
//!
//! Each page is PUT as JSON to `{endpoint}/{escaped page address}`, so
//! re-storing an address overwrites the previous document.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::{build_http_client, FetchedPage};
use crate::sink::traits::{PageSink, SinkError, SinkResult};
use async_trait::async_trait;
use reqwest::Client;
use url::Url;

/// Sink writing pages to an HTTP document store
pub struct HttpSink {
    client: Client,
    endpoint: Url,
}

impl HttpSink {
    /// Creates a sink for the given collection endpoint
    ///
    /// Requests use the default crawler timeouts and user agent.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base address documents are stored under,
    ///   e.g. `http://localhost:9200/text/article`
    ///
    /// # Returns
    ///
    /// * `Ok(HttpSink)` - The endpoint is an absolute http(s) address
    /// * `Err(SinkError)` - The endpoint cannot be used
    pub fn new(endpoint: &str) -> SinkResult<Self> {
        Self::from_config(endpoint, &CrawlerConfig::default(), &UserAgentConfig::default())
    }

    /// Creates a sink whose requests share the crawler's timeouts and identity
    pub fn from_config(
        endpoint: &str,
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> SinkResult<Self> {
        Self::with_client(build_http_client(crawler, user_agent)?, endpoint)
    }

    /// Creates a sink sharing an existing HTTP client
    pub fn with_client(client: Client, endpoint: &str) -> SinkResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| SinkError::InvalidEndpoint(format!("{}: {}", endpoint, e)))?;

        if !matches!(endpoint.scheme(), "http" | "https") || endpoint.cannot_be_a_base() {
            return Err(SinkError::InvalidEndpoint(format!(
                "{}: expected an http(s) address",
                endpoint
            )));
        }

        Ok(Self { client, endpoint })
    }

    /// Address a page is stored at: the endpoint plus the page address as
    /// one escaped path segment
    pub fn document_url(&self, page_url: &Url) -> SinkResult<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| SinkError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .push(page_url.as_str());
        Ok(url)
    }
}

#[async_trait]
impl PageSink for HttpSink {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn store(&mut self, page: &FetchedPage) -> SinkResult<()> {
        let url = self.document_url(&page.url)?;
        let response = self.client.put(url).json(page).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!("Stored {} ({})", page.url, status);
        Ok(())
    }
}
