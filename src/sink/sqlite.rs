//! SQLite sink implementation
//!
//! Pages are upserted into a single `pages` table keyed by address. Links and
//! phone numbers are stored as JSON arrays.

use crate::crawler::FetchedPage;
use crate::sink::traits::{PageSink, SinkResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQL schema for the page table
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS pages (
    url TEXT PRIMARY KEY,
    content TEXT NOT NULL,
    links TEXT NOT NULL,
    phone_numbers TEXT NOT NULL,
    fetched_at TEXT NOT NULL,
    store_count INTEGER NOT NULL DEFAULT 1
);
"#;

const UPSERT_SQL: &str = r#"
INSERT INTO pages (url, content, links, phone_numbers, fetched_at)
VALUES (?1, ?2, ?3, ?4, ?5)
ON CONFLICT(url) DO UPDATE SET
    content = excluded.content,
    links = excluded.links,
    phone_numbers = excluded.phone_numbers,
    fetched_at = excluded.fetched_at,
    store_count = pages.store_count + 1
"#;

/// Initializes the database schema
///
/// This function is idempotent.
pub fn initialize_schema(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)
}

/// A page as read back from the database
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredPage {
    pub url: String,
    pub content: String,
    pub links: Vec<String>,
    pub phone_numbers: Vec<String>,
    pub fetched_at: String,
    pub store_count: i64,
}

/// SQLite sink backend
pub struct SqliteSink {
    conn: Connection,
}

impl SqliteSink {
    /// Opens or creates the database at `path`
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteSink)` - Successfully opened/created database
    /// * `Err(SinkError)` - Failed to open database
    pub fn open(path: &Path) -> SinkResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> SinkResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Inserts a page, replacing any earlier copy of the same address
    pub fn upsert_page(&self, page: &FetchedPage) -> SinkResult<()> {
        let links: Vec<&str> = page.links.iter().map(|link| link.as_str()).collect();

        self.conn.execute(
            UPSERT_SQL,
            params![
                page.url.as_str(),
                page.content,
                serde_json::to_string(&links)?,
                serde_json::to_string(&page.phone_numbers)?,
                Utc::now().to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Loads a stored page by address
    pub fn get_page(&self, url: &str) -> SinkResult<Option<StoredPage>> {
        let row = self
            .conn
            .query_row(
                "SELECT url, content, links, phone_numbers, fetched_at, store_count
                 FROM pages WHERE url = ?1",
                params![url],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, String>(4)?,
                        row.get::<_, i64>(5)?,
                    ))
                },
            )
            .optional()?;

        let Some((url, content, links, phone_numbers, fetched_at, store_count)) = row else {
            return Ok(None);
        };

        Ok(Some(StoredPage {
            url,
            content,
            links: serde_json::from_str(&links)?,
            phone_numbers: serde_json::from_str(&phone_numbers)?,
            fetched_at,
            store_count,
        }))
    }

    /// Counts stored pages
    pub fn count_pages(&self) -> SinkResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM pages", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[async_trait]
impl PageSink for SqliteSink {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    async fn store(&mut self, page: &FetchedPage) -> SinkResult<()> {
        self.upsert_page(page)
    }

    async fn finish(&mut self) -> SinkResult<()> {
        self.conn.execute_batch("PRAGMA wal_checkpoint(PASSIVE);")?;
        Ok(())
    }
}
