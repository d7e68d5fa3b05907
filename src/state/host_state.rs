use std::time::{Duration, Instant};

/// Tracks request spacing for one host during crawling
///
/// The politeness gate keeps one of these per host and reserves request
/// slots through it, so concurrent workers line up behind each other instead
/// of hitting the host at the same instant.
#[derive(Debug, Clone, Default)]
pub struct HostState {
    /// Number of requests started against this host in the current run
    pub request_count: u32,

    /// Start time of the most recently reserved request slot
    pub last_request_time: Option<Instant>,
}

impl HostState {
    /// Creates a new HostState with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks if a request can start now without violating the delay
    pub fn can_request(&self, delay: Duration, now: Instant) -> bool {
        self.time_until_next_request(delay, now).is_none()
    }

    /// Calculates the time until the next request can be made
    ///
    /// Returns None if a request can be made now, or the duration to wait otherwise.
    pub fn time_until_next_request(&self, delay: Duration, now: Instant) -> Option<Duration> {
        let last = self.last_request_time?;
        let ready_at = last + delay;
        if ready_at > now {
            Some(ready_at - now)
        } else {
            None
        }
    }

    /// Reserves the next request slot and returns how long to wait for it
    ///
    /// The slot is recorded immediately, so the next caller is spaced after
    /// this one even if it has not started yet.
    pub fn reserve(&mut self, delay: Duration, now: Instant) -> Duration {
        let wait = self.time_until_next_request(delay, now).unwrap_or(Duration::ZERO);
        self.request_count += 1;
        self.last_request_time = Some(now + wait);
        wait
    }
}
