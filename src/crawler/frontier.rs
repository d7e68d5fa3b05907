//! Frontier: the pending targets and the visited-set of one crawl run
//!
//! This module handles:
//! - Atomic seen-check-and-insert so each URL is dispatched at most once
//! - Listing and detail queues (listings are handed out first, both FIFO)
//! - In-flight tracking through [`Lease`]s, so an empty queue with fetches
//!   still outstanding is not mistaken for the end of the crawl
//! - Waking idle workers when work arrives, the crawl drains, or it is closed

use crate::state::{CrawlTarget, TargetKind};
use crate::url::url_key;
use std::collections::{HashSet, VecDeque};
use std::sync::{Mutex, MutexGuard};
use tokio::sync::Notify;
use url::Url;

/// Counters describing the frontier at one instant
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrontierSnapshot {
    pub pending_listings: usize,
    pub pending_details: usize,
    pub in_flight: usize,
    pub seen: usize,
}

impl FrontierSnapshot {
    pub fn pending(&self) -> usize {
        self.pending_listings + self.pending_details
    }
}

#[derive(Debug, Default)]
struct FrontierState {
    listings: VecDeque<CrawlTarget>,
    details: VecDeque<CrawlTarget>,
    seen: HashSet<String>,
    in_flight: usize,
    closed: bool,
}

impl FrontierState {
    fn is_drained(&self) -> bool {
        self.listings.is_empty() && self.details.is_empty() && self.in_flight == 0
    }

    fn pop(&mut self) -> Option<CrawlTarget> {
        self.listings.pop_front().or_else(|| self.details.pop_front())
    }
}

/// The set of URLs to visit plus what has already been dispatched
///
/// All check-and-insert operations happen under one mutex, which is never
/// held across an await point.
#[derive(Debug, Default)]
pub struct Frontier {
    state: Mutex<FrontierState>,
    notify: Notify,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, FrontierState> {
        // A worker that panicked mid-update leaves counters that are still
        // consistent: every mutation below is a single step.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds a target unless its URL has been seen before
    ///
    /// # Returns
    ///
    /// * `true` - The target was queued
    /// * `false` - The URL was already seen (queued, dispatched, or marked)
    pub fn enqueue(&self, target: CrawlTarget) -> bool {
        let key = url_key(target.url());
        {
            let mut state = self.lock();
            if !state.seen.insert(key) {
                return false;
            }
            match target.kind() {
                TargetKind::Listing => state.listings.push_back(target),
                TargetKind::Detail => state.details.push_back(target),
            }
        }
        self.notify.notify_waiters();
        true
    }

    /// Records a URL as seen without queueing it
    ///
    /// Used for the final URL of a redirected fetch, so a later link to the
    /// redirect target is not dispatched a second time.
    pub fn mark_seen(&self, url: &Url) -> bool {
        self.lock().seen.insert(url_key(url))
    }

    /// Removes and returns one pending target
    ///
    /// The in-flight count is raised in the same critical section as the pop;
    /// it drops again when the returned lease is completed or dropped.
    /// Returns None if nothing is pending or the frontier is closed.
    pub fn dequeue(&self) -> Option<Lease<'_>> {
        let mut state = self.lock();
        if state.closed {
            return None;
        }
        let target = state.pop()?;
        state.in_flight += 1;
        Some(Lease {
            frontier: self,
            target,
        })
    }

    /// Waits for the next target
    ///
    /// Returns None once the frontier is drained (nothing pending and nothing
    /// in flight) or closed. While other workers still hold leases, this waits
    /// for them, since their pages may add more targets.
    pub async fn next(&self) -> Option<Lease<'_>> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.lock();
                if state.closed || state.is_drained() {
                    return None;
                }
            }
            if let Some(lease) = self.dequeue() {
                return Some(lease);
            }

            notified.await;
        }
    }

    /// Resolves once the frontier is drained or closed
    pub async fn wait_drained(&self) {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let state = self.lock();
                if state.closed || state.is_drained() {
                    return;
                }
            }

            notified.await;
        }
    }

    /// True iff no targets are pending and none are in flight
    pub fn is_drained(&self) -> bool {
        self.lock().is_drained()
    }

    /// Stops all further dequeues and wakes every waiter
    ///
    /// Pending targets stay queued, so the snapshot still shows what was left
    /// undone. Leases already handed out remain valid.
    pub fn close(&self) {
        self.lock().closed = true;
        self.notify.notify_waiters();
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    pub fn snapshot(&self) -> FrontierSnapshot {
        let state = self.lock();
        FrontierSnapshot {
            pending_listings: state.listings.len(),
            pending_details: state.details.len(),
            in_flight: state.in_flight,
            seen: state.seen.len(),
        }
    }

    fn release(&self) {
        {
            let mut state = self.lock();
            state.in_flight = state.in_flight.saturating_sub(1);
        }
        self.notify.notify_waiters();
    }
}

/// A dispatched target counted as in flight until completed or dropped
///
/// Targets discovered while handling a lease must be enqueued before the
/// lease is completed; otherwise the frontier could look drained in between.
#[derive(Debug)]
pub struct Lease<'a> {
    frontier: &'a Frontier,
    target: CrawlTarget,
}

impl Lease<'_> {
    pub fn target(&self) -> &CrawlTarget {
        &self.target
    }

    /// Marks the target as handled
    pub fn complete(self) {
        // Drop does the bookkeeping
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        self.frontier.release();
    }
}
