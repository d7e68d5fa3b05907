//! Crawl report types
//!
//! This module defines what a finished run hands back: the record set, the
//! failure log, and the counters used for the closing summary.

use crate::record::BookRecord;
use crate::state::{RunState, TargetKind};
use crate::{ExtractionError, FetchError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Why a target produced no record or links
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "error", rename_all = "snake_case")]
pub enum FailureReason {
    /// Timeout or connection failure, still failing after retries
    Network { message: String },

    /// Non-success HTTP status (5xx after retries, 4xx immediately)
    HttpStatus { status: u16 },

    /// URL could not be requested at all
    InvalidUrl { message: String },

    /// Fetch succeeded but a required field was missing
    Extraction { missing_field: &'static str },
}

impl FailureReason {
    pub fn is_extraction(&self) -> bool {
        matches!(self, Self::Extraction { .. })
    }

    /// Short label used when grouping failures in the summary
    pub fn label(&self) -> &'static str {
        match self {
            Self::Network { .. } => "network",
            Self::HttpStatus { .. } => "http_status",
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Extraction { .. } => "extraction",
        }
    }
}

impl From<FetchError> for FailureReason {
    fn from(error: FetchError) -> Self {
        match error {
            FetchError::Network { message, .. } => Self::Network { message },
            FetchError::HttpStatus { status } => Self::HttpStatus { status },
            FetchError::InvalidUrl { message } => Self::InvalidUrl { message },
        }
    }
}

impl From<ExtractionError> for FailureReason {
    fn from(error: ExtractionError) -> Self {
        Self::Extraction {
            missing_field: error.missing_field,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network { message } => write!(f, "network error: {}", message),
            Self::HttpStatus { status } => write!(f, "HTTP status {}", status),
            Self::InvalidUrl { message } => write!(f, "invalid URL: {}", message),
            Self::Extraction { missing_field } => {
                write!(f, "required field '{}' not found", missing_field)
            }
        }
    }
}

/// One target that did not yield a result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlFailure {
    /// The URL that was dispatched
    pub url: String,

    pub kind: TargetKind,

    pub reason: FailureReason,

    /// Requests sent for this target, including retries
    pub attempts: u32,
}

/// Everything one crawl run produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Accepted records in completion order, unique by URL
    pub records: Vec<BookRecord>,

    /// Per-target failures in the order they were recorded
    pub failures: Vec<CrawlFailure>,

    /// Pages fetched successfully, listings and details together
    pub pages_fetched: usize,

    /// Listing pages fetched and parsed successfully
    pub listings_visited: usize,

    /// Detail pages fetched successfully (with or without a record)
    pub details_visited: usize,

    /// Records dropped because their URL was already in the sink
    pub duplicates_ignored: usize,

    /// False when the run was cancelled with work still pending
    pub complete: bool,

    /// State the run ended in
    pub final_state: RunState,

    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Targets that produced links or a record
    ///
    /// A detail page whose record was already accepted under the same URL
    /// (two links redirecting to one page) still counts as a success.
    pub fn succeeded(&self) -> usize {
        self.listings_visited + self.records.len() + self.duplicates_ignored
    }

    /// Targets recorded in the failure log
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Number of failures whose reason is an extraction error
    pub fn extraction_failures(&self) -> usize {
        self.failures
            .iter()
            .filter(|failure| failure.reason.is_extraction())
            .count()
    }

    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}
