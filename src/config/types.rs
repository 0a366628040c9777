use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Main configuration structure for Kraul
///
/// Every section is optional; a missing file or section means defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub sink: SinkConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of concurrent fetch workers
    #[serde(rename = "workers")]
    pub workers: usize,

    /// Slots in the channel between the frontier and the workers (0 = workers)
    #[serde(rename = "dispatch-capacity")]
    pub dispatch_capacity: usize,

    /// Pause each worker takes after a fetch (milliseconds)
    #[serde(rename = "fetch-delay-ms")]
    pub fetch_delay_ms: u64,

    /// Upper bound for a single fetch, body included (seconds)
    #[serde(rename = "fetch-timeout-secs")]
    pub fetch_timeout_secs: u64,

    /// Upper bound for establishing a connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            dispatch_capacity: 0,
            fetch_delay_ms: 100,
            fetch_timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

impl CrawlerConfig {
    pub fn fetch_delay(&self) -> Duration {
        Duration::from_millis(self.fetch_delay_ms)
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Effective dispatch channel capacity
    pub fn dispatch_capacity(&self) -> usize {
        if self.dispatch_capacity == 0 {
            self.workers.max(1)
        } else {
            self.dispatch_capacity
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(rename = "contact-email")]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: env!("CARGO_PKG_NAME").to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `Name/Version` followed by `(+ContactURL; ContactEmail)` when
    /// contact details are configured.
    pub fn header_value(&self) -> String {
        let product = format!("{}/{}", self.crawler_name, self.crawler_version);

        match (self.contact_url.as_deref(), self.contact_email.as_deref()) {
            (Some(url), Some(email)) => format!("{} (+{}; {})", product, url, email),
            (Some(url), None) => format!("{} (+{})", product, url),
            (None, Some(email)) => format!("{} ({})", product, email),
            (None, None) => product,
        }
    }
}

/// Where fetched pages are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// Log each page and discard it
    Log,
    /// PUT each page as JSON to a document store
    Http,
    /// Upsert each page into a SQLite database
    Sqlite,
}

/// What a failed sink write does to the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFailureMode {
    /// Stop the crawl and report the error
    Fatal,
    /// Log the failure and keep crawling
    Continue,
    /// Retry the write a bounded number of times, then continue
    Retry,
}

impl FromStr for SinkFailureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fatal" => Ok(Self::Fatal),
            "continue" => Ok(Self::Continue),
            "retry" => Ok(Self::Retry),
            other => Err(format!(
                "unknown sink failure mode '{}' (expected fatal, continue or retry)",
                other
            )),
        }
    }
}

impl fmt::Display for SinkFailureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Fatal => "fatal",
            Self::Continue => "continue",
            Self::Retry => "retry",
        };
        f.write_str(name)
    }
}

/// Sink configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Which sink receives fetched pages
    #[serde(rename = "kind")]
    pub kind: SinkKind,

    /// Collection URL pages are PUT under (http sink)
    #[serde(rename = "endpoint")]
    pub endpoint: String,

    /// Path to the SQLite database file (sqlite sink)
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Reaction to a failed write
    #[serde(rename = "failure-policy")]
    pub failure_policy: SinkFailureMode,

    /// Attempts per page when the policy is `retry`
    #[serde(rename = "retry-attempts")]
    pub retry_attempts: u32,

    /// Pause between retry attempts (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            kind: SinkKind::Log,
            endpoint: "http://localhost:9200/text/article".to_string(),
            database_path: "kraul.db".to_string(),
            failure_policy: SinkFailureMode::Continue,
            retry_attempts: 3,
            retry_backoff_ms: 500,
        }
    }
}
