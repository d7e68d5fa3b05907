//! Per-run crawl context and the worker loop
//!
//! A [`CrawlContext`] bundles everything one run shares between workers:
//! the frontier, the record sink, the failure log, and the fetch/extract
//! machinery. It is created by the coordinator and lives exactly as long as
//! the run.

use crate::config::Config;
use crate::crawler::extractor::Extractor;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{Frontier, Lease};
use crate::crawler::politeness::PolitenessGate;
use crate::output::{CrawlFailure, FailureReason, RecordSink};
use crate::record::BookRecord;
use crate::state::{CrawlTarget, TargetKind};
use crate::FolioError;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use url::Url;

/// How often (in fetched pages) a progress line is logged
const PROGRESS_INTERVAL: usize = 10;

/// Counters collected while the run is in progress
#[derive(Debug, Default)]
pub(crate) struct RunCounters {
    pub listings_visited: AtomicUsize,
    pub details_visited: AtomicUsize,
    pub duplicates_ignored: AtomicUsize,
    pub pages_fetched: AtomicUsize,
}

#[derive(Debug)]
pub struct CrawlContext {
    pub(crate) frontier: Frontier,
    pub(crate) sink: RecordSink,
    failures: Mutex<Vec<CrawlFailure>>,
    fetcher: Fetcher,
    extractor: Extractor,
    politeness: PolitenessGate,
    pub(crate) counters: RunCounters,
}

impl CrawlContext {
    /// Builds the context for one run from configuration
    pub fn new(config: &Config) -> Result<Self, FolioError> {
        let fetcher = Fetcher::from_config(&config.crawler, &config.user_agent)?;
        let extractor = Extractor::new(&config.selectors)?;
        Ok(Self::with_parts(
            fetcher,
            extractor,
            PolitenessGate::new(config.crawler.politeness_delay()),
        ))
    }

    pub fn with_parts(fetcher: Fetcher, extractor: Extractor, politeness: PolitenessGate) -> Self {
        Self {
            frontier: Frontier::new(),
            sink: RecordSink::new(),
            failures: Mutex::new(Vec::new()),
            fetcher,
            extractor,
            politeness,
            counters: RunCounters::default(),
        }
    }

    /// Pulls targets until the frontier drains or is closed
    pub(crate) async fn run_worker(&self, worker_id: usize) {
        tracing::debug!("Worker {} started", worker_id);
        let mut handled = 0usize;

        while let Some(lease) = self.frontier.next().await {
            self.process(lease).await;
            handled += 1;
        }

        tracing::debug!("Worker {} exiting after {} targets", worker_id, handled);
    }

    /// Fetches and handles one leased target
    ///
    /// Links discovered on the page are enqueued before the lease is
    /// released.
    pub(crate) async fn process(&self, lease: Lease<'_>) {
        let result = self.fetch_target(lease.target()).await;
        self.handle_result(lease.target(), result);
        lease.complete();
    }

    /// Waits for the politeness slot, then fetches the target
    pub(crate) async fn fetch_target(&self, target: &CrawlTarget) -> FetchResult {
        tracing::debug!("Fetching {}", target);
        self.politeness.wait(target.url()).await;
        self.fetcher.fetch(target.url().as_str()).await
    }

    /// Routes a fetch result to the extractor matching the target kind
    pub(crate) fn handle_result(&self, target: &CrawlTarget, result: FetchResult) {
        let attempts = result.attempts;
        let (final_url, body) = match result.into_result() {
            Ok(fetched) => fetched,
            Err(error) => {
                self.record_failure(target, error.into(), attempts);
                return;
            }
        };

        let page_url = Url::parse(&final_url).unwrap_or_else(|_| target.url().clone());
        if &page_url != target.url() {
            tracing::debug!("{} redirected to {}", target.url(), page_url);
            self.frontier.mark_seen(&page_url);
        }

        match target.kind() {
            TargetKind::Listing => self.handle_listing(&body, &page_url),
            TargetKind::Detail => self.handle_detail(target, &body, &page_url, attempts),
        }

        self.log_progress();
    }

    fn handle_listing(&self, body: &str, page_url: &Url) {
        let page = self.extractor.extract_listing(body, page_url);
        self.counters.listings_visited.fetch_add(1, Ordering::Relaxed);
        if page.is_empty() {
            tracing::debug!("Listing {} has no detail links and no next page", page_url);
            return;
        }

        let found = page.detail_urls.len();
        let queued = page
            .detail_urls
            .into_iter()
            .filter(|url| self.frontier.enqueue(CrawlTarget::detail(url.clone())))
            .count();

        let next_queued = page
            .next_url
            .map(|next| self.frontier.enqueue(CrawlTarget::listing(next)))
            .unwrap_or(false);

        tracing::debug!(
            "Listing {} yielded {} detail links ({} new), next page queued: {}",
            page_url,
            found,
            queued,
            next_queued
        );
    }

    fn handle_detail(&self, target: &CrawlTarget, body: &str, page_url: &Url, attempts: u32) {
        self.counters.details_visited.fetch_add(1, Ordering::Relaxed);

        match self.extractor.extract_book(body, page_url) {
            Ok(record) => self.accept_record(record),
            Err(error) => self.record_failure(target, error.into(), attempts),
        }
    }

    fn accept_record(&self, record: BookRecord) {
        let key = record.key().to_string();
        if self.sink.accept(record) {
            tracing::debug!("Accepted record {}", key);
        } else {
            self.counters.duplicates_ignored.fetch_add(1, Ordering::Relaxed);
            tracing::debug!("Ignored duplicate record {}", key);
        }
    }

    /// Appends a per-target failure to the log; never aborts the run
    pub(crate) fn record_failure(&self, target: &CrawlTarget, reason: FailureReason, attempts: u32) {
        tracing::warn!("Failed {}: {}", target, reason);

        let failure = CrawlFailure {
            url: target.url().to_string(),
            kind: target.kind(),
            reason,
            attempts,
        };
        self.failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(failure);
    }

    fn log_progress(&self) {
        let fetched = self.counters.pages_fetched.fetch_add(1, Ordering::Relaxed) + 1;
        if fetched % PROGRESS_INTERVAL == 0 {
            let snapshot = self.frontier.snapshot();
            tracing::info!(
                "Progress: {} pages fetched, {} records, {} pending, {} in flight",
                fetched,
                self.sink.len(),
                snapshot.pending(),
                snapshot.in_flight
            );
        }
    }

    /// Takes the record set and failure log out of the context
    ///
    /// Consumes the sink when this is the last reference; otherwise copies.
    pub(crate) fn finish(self: Arc<Self>) -> (Vec<BookRecord>, Vec<CrawlFailure>) {
        match Arc::try_unwrap(self) {
            Ok(context) => {
                let failures = context
                    .failures
                    .into_inner()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                (context.sink.finalize(), failures)
            }
            Err(shared) => {
                let failures = shared
                    .failures
                    .lock()
                    .unwrap_or_else(|poisoned| poisoned.into_inner())
                    .clone();
                (shared.sink.snapshot(), failures)
            }
        }
    }
}
