//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings and timeouts
//! - GET requests that follow redirects and report the final URL
//! - Retry logic with exponential backoff for transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::FetchError;
use reqwest::{redirect::Policy, Client, Url};
use std::time::Duration;

/// Maximum number of redirect hops followed for one request
const MAX_REDIRECTS: usize = 10;

/// Outcome of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    Failed(FetchError),
}

/// Result of fetching one URL, after any retries
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was asked for
    pub requested_url: String,

    /// URL after following redirects; equals `requested_url` when none happened
    pub final_url: String,

    pub status: FetchStatus,

    /// Page body, present only when `status` is `Ok`
    pub body: Option<String>,

    /// Number of requests sent, including retries
    pub attempts: u32,
}

impl FetchResult {
    fn success(requested_url: &str, final_url: String, body: String, attempts: u32) -> Self {
        Self {
            requested_url: requested_url.to_string(),
            final_url,
            status: FetchStatus::Ok,
            body: Some(body),
            attempts,
        }
    }

    fn failure(requested_url: &str, error: FetchError, attempts: u32) -> Self {
        Self {
            requested_url: requested_url.to_string(),
            final_url: requested_url.to_string(),
            status: FetchStatus::Failed(error),
            body: None,
            attempts,
        }
    }

    /// Splits the result into `(final_url, body)` or the failure reason
    pub fn into_result(self) -> Result<(String, String), FetchError> {
        match (self.status, self.body) {
            (FetchStatus::Ok, Some(body)) => Ok((self.final_url, body)),
            (FetchStatus::Ok, None) => Ok((self.final_url, String::new())),
            (FetchStatus::Failed(error), _) => Err(error),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The user agent configuration
/// * `timeout` - Upper bound for one request, connection included
///
/// # Example
///
/// ```no_run
/// use folio_crawler::config::UserAgentConfig;
/// use folio_crawler::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrieves single URLs with timeout and retry handling
///
/// # Retry Logic
///
/// | Condition | Action |
/// |-----------|--------|
/// | Malformed URL | Immediate failure |
/// | HTTP 4xx | Immediate failure |
/// | HTTP 5xx | Retry up to `max_retries` times |
/// | Timeout / connection error | Retry up to `max_retries` times |
/// | Body read error | Retry up to `max_retries` times |
///
/// The delay before retry `n` (1-based) is `retry_backoff * 2^(n-1)`.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_retries: u32,
    retry_backoff: Duration,
}

impl Fetcher {
    pub fn new(client: Client, max_retries: u32, retry_backoff: Duration) -> Self {
        Self {
            client,
            max_retries,
            retry_backoff,
        }
    }

    /// Builds a fetcher and its client from configuration
    pub fn from_config(
        crawler: &CrawlerConfig,
        user_agent: &UserAgentConfig,
    ) -> Result<Self, reqwest::Error> {
        let client = build_http_client(user_agent, crawler.fetch_timeout())?;
        Ok(Self::new(client, crawler.max_retries, crawler.retry_backoff()))
    }

    /// Fetches a URL, retrying transient failures
    ///
    /// Never panics and never retries forever: the result is either the body
    /// with the final URL, or the last error seen.
    pub async fn fetch(&self, url: &str) -> FetchResult {
        let parsed = match Url::parse(url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
            Ok(parsed) => {
                let error = FetchError::InvalidUrl {
                    message: format!("unsupported scheme '{}'", parsed.scheme()),
                };
                return FetchResult::failure(url, error, 0);
            }
            Err(e) => {
                let error = FetchError::InvalidUrl {
                    message: e.to_string(),
                };
                return FetchResult::failure(url, error, 0);
            }
        };

        let mut attempts = 0;
        loop {
            attempts += 1;

            let error = match self.attempt(parsed.clone()).await {
                Ok((final_url, body)) => {
                    return FetchResult::success(url, final_url, body, attempts);
                }
                Err(error) => error,
            };

            let retries_used = attempts - 1;
            if !error.is_retryable() || retries_used >= self.max_retries {
                tracing::debug!("Giving up on {} after {} attempt(s): {}", url, attempts, error);
                return FetchResult::failure(url, error, attempts);
            }

            let delay = self.backoff_delay(retries_used);
            tracing::debug!(
                "Attempt {} for {} failed ({}), retrying in {:?}",
                attempts,
                url,
                error,
                delay
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Sends one GET request and reads the body
    async fn attempt(&self, url: Url) -> Result<(String, String), FetchError> {
        let response = self.client.get(url).send().await.map_err(classify_error)?;

        let status = response.status();
        let final_url = response.url().to_string();

        if !status.is_success() {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(classify_error)?;
        Ok((final_url, body))
    }

    /// Delay before the retry that follows `retries_used` earlier retries
    fn backoff_delay(&self, retries_used: u32) -> Duration {
        self.retry_backoff
            .saturating_mul(2u32.saturating_pow(retries_used))
    }
}

/// Maps a reqwest error onto the crawler's error taxonomy
fn classify_error(e: reqwest::Error) -> FetchError {
    if e.is_builder() {
        FetchError::InvalidUrl {
            message: e.to_string(),
        }
    } else if e.is_timeout() {
        FetchError::Network {
            message: "request timed out".to_string(),
            timeout: true,
        }
    } else if e.is_connect() {
        FetchError::Network {
            message: format!("connection failed: {}", e),
            timeout: false,
        }
    } else if e.is_redirect() {
        // Redirect loops and overlong chains will not resolve on retry
        FetchError::InvalidUrl {
            message: format!("redirect error: {}", e),
        }
    } else {
        FetchError::Network {
            message: e.to_string(),
            timeout: false,
        }
    }
}
