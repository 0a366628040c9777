use crate::crawler::FetchedPage;
use crate::sink::traits::{PageSink, SinkError, SinkResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Sink collecting pages in memory
///
/// Clones share the same storage, so a handle kept by the caller sees every
/// page stored through the clone given to the crawler.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    pages: Arc<Mutex<Vec<FetchedPage>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the pages stored so far, in arrival order
    pub fn pages(&self) -> Vec<FetchedPage> {
        match self.pages.lock() {
            Ok(pages) => pages.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.pages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl PageSink for MemorySink {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn store(&mut self, page: &FetchedPage) -> SinkResult<()> {
        let mut pages = self
            .pages
            .lock()
            .map_err(|e| SinkError::Unavailable(e.to_string()))?;
        pages.push(page.clone());
        Ok(())
    }
}
