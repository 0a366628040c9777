//! Kraul main entry point
//!
//! This is the command-line interface for the Kraul web crawler.

use anyhow::Context;
use clap::Parser;
use kraul::config::{load_config_with_hash, validate, Config, SinkFailureMode, SinkKind};
use kraul::crawler::{Coordinator, CrawlSummary};
use kraul::parse_seed;
use kraul::sink::build_sink;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Kraul: a breadth-first web crawler
///
/// Kraul starts at a seed address and follows every link it finds with a
/// fixed pool of concurrent workers, until no unvisited address is left.
/// Each fetched page, with its links and phone numbers, goes to a sink.
#[derive(Parser, Debug)]
#[command(name = "kraul")]
#[command(version)]
#[command(about = "A breadth-first web crawler", long_about = None)]
struct Cli {
    /// Absolute http(s) address to start crawling from
    #[arg(value_name = "SEED")]
    seed: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Number of concurrent workers
    #[arg(long)]
    workers: Option<usize>,

    /// Pause after each fetch, per worker (milliseconds)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Per-request timeout (seconds)
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Store pages in the document store at this collection URL
    #[arg(long, value_name = "URL", conflicts_with = "database")]
    sink_url: Option<String>,

    /// Store pages in this SQLite database
    #[arg(long, value_name = "PATH")]
    database: Option<PathBuf>,

    /// What a failed sink write does: fatal, continue or retry
    #[arg(long, value_name = "POLICY")]
    sink_failure: Option<SinkFailureMode>,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(workers) = self.workers {
            config.crawler.workers = workers;
        }
        if let Some(delay_ms) = self.delay_ms {
            config.crawler.fetch_delay_ms = delay_ms;
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config.crawler.fetch_timeout_secs = timeout_secs;
        }
        if let Some(sink_url) = &self.sink_url {
            config.sink.kind = SinkKind::Http;
            config.sink.endpoint = sink_url.clone();
        }
        if let Some(database) = &self.database {
            config.sink.kind = SinkKind::Sqlite;
            config.sink.database_path = database.to_string_lossy().to_string();
        }
        if let Some(policy) = self.sink_failure {
            config.sink.failure_policy = policy;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Reject a bad seed before anything is started
    let seed = parse_seed(&cli.seed)?;

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration")?;

    let sink = build_sink(&config).context("failed to open sink")?;

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_ctrl_c(cancel.clone()));

    tracing::info!("Crawling from {}", seed);
    let summary = Coordinator::new(config, seed, sink)?
        .with_cancellation(cancel)
        .run()
        .await
        .context("crawl failed")?;

    print_summary(&summary);
    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("kraul=info,warn"),
            1 => EnvFilter::new("kraul=debug,info"),
            2 => EnvFilter::new("kraul=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn cancel_on_ctrl_c(cancel: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            cancel.cancel();
        }
        Err(e) => tracing::error!("Failed to listen for interrupt: {}", e),
    }
}

fn print_summary(summary: &CrawlSummary) {
    if summary.cancelled {
        println!("\nCrawl interrupted after {:.1}s", summary.elapsed.as_secs_f64());
    } else {
        println!("\nCrawl finished in {:.1}s", summary.elapsed.as_secs_f64());
    }

    println!("  Pages fetched: {}", summary.pages_fetched);
    println!("  Fetch errors:  {}", summary.fetch_errors);
    println!("  Pages stored:  {}", summary.pages_stored);

    println!("\nFound {} unique urls:\n", summary.visited.len());
    for url in &summary.visited {
        println!("  - {}", url);
    }
}
