//! Configuration module for Folio
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files. Every section has defaults, so an empty file crawls the public
//! books catalog with a small worker pool.
//!
//! # Example
//!
//! ```no_run
//! use folio_crawler::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("folio.toml")).unwrap();
//! println!("Crawl starts at: {}", config.start.url);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, CrawlerConfig, OutputConfig, SelectorConfig, StartConfig, UserAgentConfig,
    DEFAULT_START_URL,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_start_url};

pub(crate) use validation::parse_selector;
