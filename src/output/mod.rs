//! Output module for crawl results
//!
//! This module handles:
//! - Accumulating records under the unique-URL invariant
//! - The crawl report and failure log
//! - Writing records and failures as JSON
//! - Printing end-of-run statistics

mod json;
mod report;
mod sink;
pub mod stats;

pub use json::{read_records, write_failures, write_records};
pub use report::{CrawlFailure, CrawlReport, FailureReason};
pub use sink::RecordSink;
pub use stats::{load_statistics, print_statistics, CrawlStatistics};

use crate::config::OutputConfig;
use crate::FolioError;
use std::path::Path;

/// Writes the report's records, and its failures if a path is configured
///
/// # Arguments
///
/// * `report` - The finished crawl
/// * `config` - Output locations
pub fn write_report(report: &CrawlReport, config: &OutputConfig) -> Result<(), FolioError> {
    write_records(Path::new(&config.records_path), &report.records)?;

    if let Some(failures_path) = &config.failures_path {
        write_failures(Path::new(failures_path), &report.failures)?;
    }

    Ok(())
}
