//! Per-host request spacing
//!
//! Every fetch reserves a start slot for its host before it is sent. Slots
//! are handed out under a lock and spaced by the configured delay, so with a
//! pool of workers the host still sees at most one request start per delay.

use crate::state::HostState;
use crate::url::extract_domain;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use url::Url;

#[derive(Debug)]
pub struct PolitenessGate {
    delay: Duration,
    hosts: Mutex<HashMap<String, HostState>>,
}

impl PolitenessGate {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            hosts: Mutex::new(HashMap::new()),
        }
    }

    /// Reserves a slot for `url`'s host and returns how long to wait for it
    pub fn reserve(&self, url: &Url) -> Duration {
        if self.delay.is_zero() {
            return Duration::ZERO;
        }

        let host = extract_domain(url).unwrap_or_default();
        let mut hosts = self
            .hosts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        hosts
            .entry(host)
            .or_insert_with(HostState::new)
            .reserve(self.delay, Instant::now())
    }

    /// Waits until a request to `url` may start
    pub async fn wait(&self, url: &Url) {
        let wait = self.reserve(url);
        if !wait.is_zero() {
            tracing::trace!("Politeness wait of {:?} before {}", wait, url);
            tokio::time::sleep(wait).await;
        }
    }

    /// Number of request slots reserved against `host`
    pub fn request_count(&self, host: &str) -> u32 {
        self.hosts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(host)
            .map(|state| state.request_count)
            .unwrap_or(0)
    }
}
