//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the run loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier and fetching the start listing
//! - Running the worker pool until the frontier is quiescent
//! - Handling cancellation
//! - Collecting the final report

use crate::config::{validate, Config};
use crate::crawler::context::CrawlContext;
use crate::crawler::fetcher::FetchStatus;
use crate::output::CrawlReport;
use crate::state::{CrawlTarget, RunState};
use crate::{FetchError, FolioError};
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

/// Main crawler coordinator structure
///
/// One coordinator drives exactly one run: `Idle -> Running -> Draining -> Done`.
pub struct Coordinator {
    context: Arc<CrawlContext>,
    start_url: String,
    worker_pool_size: usize,
    state: RunState,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration; validated here
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to run
    /// * `Err(FolioError)` - Invalid configuration or HTTP client failure
    pub fn new(config: &Config) -> Result<Self, FolioError> {
        validate(config)?;
        let context = CrawlContext::new(config)?;

        Ok(Self {
            context: Arc::new(context),
            start_url: config.start.url.clone(),
            worker_pool_size: config.crawler.worker_pool_size as usize,
            state: RunState::Idle,
        })
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) -> Result<(), FolioError> {
        if !self.state.can_transition_to(next) {
            return Err(FolioError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::debug!("Run state {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Runs the crawl to completion or cancellation
    ///
    /// This method:
    /// 1. Seeds the frontier with the start listing and fetches it; a cancel
    ///    during this fetch abandons it instead of waiting out the retries
    /// 2. Spawns the worker pool
    /// 3. Waits for quiescence (nothing pending, nothing in flight) or
    ///    cancellation
    /// 4. Joins all workers, letting in-flight targets finish
    /// 5. Returns the report
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - The run finished, possibly with per-target failures
    /// * `Err(FolioError::FatalStart)` - The start listing could not be fetched
    pub async fn run(mut self, cancel: CancellationToken) -> Result<CrawlReport, FolioError> {
        let started_at = Utc::now();
        self.transition(RunState::Running)?;
        tracing::info!(
            "Starting crawl at {} with {} workers",
            self.start_url,
            self.worker_pool_size
        );

        let start = Url::parse(&self.start_url).map_err(|e| FolioError::FatalStart {
            url: self.start_url.clone(),
            source: FetchError::InvalidUrl {
                message: e.to_string(),
            },
        })?;
        self.context.frontier.enqueue(CrawlTarget::listing(start));

        let mut seed_abandoned = false;
        if cancel.is_cancelled() {
            tracing::warn!("Crawl cancelled before the start listing was fetched");
            self.context.frontier.close();
        } else {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::warn!("Crawl cancelled while fetching the start listing");
                    self.context.frontier.close();
                    seed_abandoned = true;
                }
                started = self.fetch_start_listing() => started?,
            }
        }

        let mut workers = JoinSet::new();
        if !self.context.frontier.is_closed() {
            for worker_id in 0..self.worker_pool_size {
                let context = Arc::clone(&self.context);
                workers.spawn(async move { context.run_worker(worker_id).await });
            }
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                let snapshot = self.context.frontier.snapshot();
                tracing::warn!(
                    "Crawl cancelled; letting {} in-flight targets finish, {} pending targets skipped",
                    snapshot.in_flight,
                    snapshot.pending()
                );
                self.context.frontier.close();
            }
            _ = self.context.frontier.wait_drained() => {}
        }

        if !self.context.frontier.is_closed() {
            self.transition(RunState::Draining)?;
            tracing::info!("Frontier is quiescent, draining workers");
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Worker task failed: {}", e);
            }
        }

        self.transition(RunState::Done)?;
        Ok(self.into_report(started_at, seed_abandoned))
    }

    /// Fetches the seed listing inline; failure here aborts the run
    async fn fetch_start_listing(&self) -> Result<(), FolioError> {
        let Some(lease) = self.context.frontier.dequeue() else {
            return Ok(());
        };

        let result = self.context.fetch_target(lease.target()).await;
        if let FetchStatus::Failed(source) = &result.status {
            tracing::error!(
                "Start listing {} failed after {} attempt(s): {}",
                self.start_url,
                result.attempts,
                source
            );
            self.context.frontier.close();
            return Err(FolioError::FatalStart {
                url: self.start_url.clone(),
                source: source.clone(),
            });
        }

        self.context.handle_result(lease.target(), result);
        lease.complete();
        Ok(())
    }

    /// `seed_abandoned` marks a run whose start listing was dropped mid-fetch;
    /// its lease is gone, so the frontier alone would look finished.
    fn into_report(self, started_at: chrono::DateTime<Utc>, seed_abandoned: bool) -> CrawlReport {
        let complete = !seed_abandoned && self.context.frontier.snapshot().pending() == 0;
        let counters = &self.context.counters;
        let pages_fetched = counters.pages_fetched.load(Ordering::Relaxed);
        let listings_visited = counters.listings_visited.load(Ordering::Relaxed);
        let details_visited = counters.details_visited.load(Ordering::Relaxed);
        let duplicates_ignored = counters.duplicates_ignored.load(Ordering::Relaxed);

        let (records, failures) = self.context.finish();
        let finished_at = Utc::now();

        tracing::info!(
            "Crawl finished: {} records, {} failures in {:.1}s{}",
            records.len(),
            failures.len(),
            (finished_at - started_at).num_milliseconds() as f64 / 1000.0,
            if complete { "" } else { " (partial)" }
        );

        CrawlReport {
            records,
            failures,
            pages_fetched,
            listings_visited,
            details_visited,
            duplicates_ignored,
            complete,
            final_state: self.state,
            started_at,
            finished_at,
        }
    }
}

/// Runs a complete crawl with the given configuration
///
/// # Example
///
/// ```no_run
/// use folio_crawler::config::Config;
/// use folio_crawler::crawler::run_crawl;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let report = run_crawl(&Config::default(), CancellationToken::new()).await?;
/// println!("{} records, {} failures", report.records.len(), report.failed());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: &Config,
    cancel: CancellationToken,
) -> Result<CrawlReport, FolioError> {
    Coordinator::new(config)?.run(cancel).await
}
