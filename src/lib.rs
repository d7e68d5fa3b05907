//! Folio: a catalog crawler
//!
//! This crate walks a paginated book catalog, visits every linked detail page
//! exactly once, and emits a de-duplicated set of [`BookRecord`]s together with
//! a log of every target that could not be turned into a record.

pub mod config;
pub mod crawler;
pub mod output;
pub mod record;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Folio operations
#[derive(Debug, Error)]
pub enum FolioError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Start listing {url} could not be fetched: {source}")]
    FatalStart { url: String, source: FetchError },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Invalid run state transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: state::RunState,
        to: state::RunState,
    },

    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid selector for {field}: {selector}")]
    InvalidSelector { field: &'static str, selector: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,
}

/// Errors reported by the fetcher for a single URL
///
/// Network failures and 5xx responses are retried inside the fetcher;
/// everything else is reported on the first attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String, timeout: bool },

    #[error("HTTP status {status}")]
    HttpStatus { status: u16 },

    #[error("invalid URL: {message}")]
    InvalidUrl { message: String },
}

impl FetchError {
    /// Returns true if another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::HttpStatus { status } => (500..600).contains(status),
            Self::InvalidUrl { .. } => false,
        }
    }
}

/// A structurally required field could not be located on a detail page
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("required field '{missing_field}' not found")]
pub struct ExtractionError {
    pub missing_field: &'static str,
}

impl ExtractionError {
    pub fn new(missing_field: &'static str) -> Self {
        Self { missing_field }
    }
}

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, Coordinator};
pub use output::CrawlReport;
pub use record::BookRecord;
pub use state::{CrawlTarget, RunState, TargetKind};
pub use crate::url::normalize_url;
