use crate::crawler::FetchedPage;
use crate::sink::traits::{PageSink, SinkResult};
use async_trait::async_trait;

/// Sink that only logs a one-line summary of each page
#[derive(Debug, Default)]
pub struct LogSink {
    stored: u64,
}

#[async_trait]
impl PageSink for LogSink {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn store(&mut self, page: &FetchedPage) -> SinkResult<()> {
        self.stored += 1;
        tracing::info!(
            "Result {} - {} links, {} phone numbers, {} bytes",
            page.url,
            page.links.len(),
            page.phone_numbers.len(),
            page.content.len()
        );
        for number in &page.phone_numbers {
            tracing::info!("Phone number on {}: {}", page.url, number);
        }
        Ok(())
    }

    async fn finish(&mut self) -> SinkResult<()> {
        tracing::debug!("Log sink saw {} pages", self.stored);
        Ok(())
    }
}
