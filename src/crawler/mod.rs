//! Crawler module for catalog fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with retry logic
//! - Listing and detail page extraction
//! - The de-duplicating frontier and per-host politeness
//! - Overall crawl coordination

mod context;
mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
mod politeness;

pub use context::CrawlContext;
pub use coordinator::{run_crawl, Coordinator};
pub use extractor::{Extractor, ListingPage};
pub use fetcher::{build_http_client, FetchResult, FetchStatus, Fetcher};
pub use frontier::{Frontier, FrontierSnapshot, Lease};
pub use politeness::PolitenessGate;

use crate::config::Config;
use crate::output::CrawlReport;
use crate::FolioError;
use tokio_util::sync::CancellationToken;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and build the HTTP client
/// 2. Fetch the start listing
/// 3. Walk every listing page and dispatch each detail page once
/// 4. Stop when the frontier is quiescent or `cancel` fires
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `cancel` - Cancels the run; in-flight targets still finish
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Records, failures and counters for the run
/// * `Err(FolioError)` - Invalid configuration or an unreachable start listing
pub async fn crawl(config: &Config, cancel: CancellationToken) -> Result<CrawlReport, FolioError> {
    run_crawl(config, cancel).await
}
