//! Configuration module for Kraul
//!
//! This module handles loading, parsing, and validating the optional TOML
//! configuration file. Every value has a default, so crawling without a file
//! is the common case.
//!
//! # Example
//!
//! ```no_run
//! use kraul::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("kraul.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, SinkConfig, SinkFailureMode, SinkKind, UserAgentConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
