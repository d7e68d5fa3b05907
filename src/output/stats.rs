//! Statistics generation from a finished crawl
//!
//! This module condenses a [`CrawlReport`] into the counts shown at the end
//! of a run: how many targets succeeded, how many failed, and why.

use crate::output::report::CrawlReport;
use std::collections::HashMap;

/// Crawl statistics summary
#[derive(Debug, Clone)]
pub struct CrawlStatistics {
    /// Number of records emitted
    pub records: usize,

    /// Pages fetched successfully
    pub pages_fetched: usize,

    /// Listing pages fetched and parsed
    pub listings_visited: usize,

    /// Detail pages fetched
    pub details_visited: usize,

    /// Targets that produced links or a record
    pub succeeded: usize,

    /// Targets in the failure log
    pub failed: usize,

    /// Failure counts keyed by reason label
    pub failures_by_reason: HashMap<&'static str, usize>,

    /// Records ignored because their URL was already accepted
    pub duplicates_ignored: usize,

    /// Whether every discovered target was processed
    pub complete: bool,

    /// Wall time of the run in seconds
    pub duration_seconds: f64,
}

/// Builds statistics from a crawl report
pub fn load_statistics(report: &CrawlReport) -> CrawlStatistics {
    let mut failures_by_reason = HashMap::new();
    for failure in &report.failures {
        *failures_by_reason.entry(failure.reason.label()).or_insert(0) += 1;
    }

    let duration_seconds = report
        .duration()
        .to_std()
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0);

    CrawlStatistics {
        records: report.records.len(),
        pages_fetched: report.pages_fetched,
        listings_visited: report.listings_visited,
        details_visited: report.details_visited,
        succeeded: report.succeeded(),
        failed: report.failed(),
        failures_by_reason,
        duplicates_ignored: report.duplicates_ignored,
        complete: report.complete,
        duration_seconds,
    }
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &CrawlStatistics) {
    println!("=== Crawl Statistics ===\n");

    println!("Overview:");
    println!("  Records emitted: {}", stats.records);
    println!("  Pages fetched: {}", stats.pages_fetched);
    println!("  Listing pages visited: {}", stats.listings_visited);
    println!("  Detail pages visited: {}", stats.details_visited);
    if stats.duplicates_ignored > 0 {
        println!("  Duplicate records ignored: {}", stats.duplicates_ignored);
    }
    println!("  Duration: {:.1}s", stats.duration_seconds);
    println!();

    if !stats.failures_by_reason.is_empty() {
        println!("Failure Summary:");
        let mut reason_counts: Vec<_> = stats.failures_by_reason.iter().collect();
        reason_counts.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

        for (reason, count) in reason_counts {
            println!("  {}: {}", reason, count);
        }
        println!();
    }

    let total = stats.succeeded + stats.failed;
    let success_rate = if total > 0 {
        (stats.succeeded as f64 / total as f64) * 100.0
    } else {
        0.0
    };

    println!(
        "Success Rate: {:.1}% ({} succeeded / {} failed)",
        success_rate, stats.succeeded, stats.failed
    );

    if !stats.complete {
        println!("Run was cancelled before the frontier drained; results are partial.");
    }
}
