use serde::Deserialize;
use std::time::Duration;

/// Catalog root crawled when no start URL is configured
pub const DEFAULT_START_URL: &str = "https://books.toscrape.com/";

/// Main configuration structure for Folio
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub start: StartConfig,
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub selectors: SelectorConfig,
}

/// Where the crawl begins
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StartConfig {
    /// Absolute URL of the first listing page
    pub url: String,
}

impl Default for StartConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_START_URL.to_string(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Additional attempts after a transient fetch failure
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Timeout for one fetch attempt (milliseconds)
    #[serde(rename = "fetch-timeout")]
    pub fetch_timeout: u64,

    /// Number of concurrent fetch workers
    #[serde(rename = "worker-pool-size")]
    pub worker_pool_size: u32,

    /// Minimum time between request starts against one host (milliseconds)
    #[serde(rename = "politeness-delay")]
    pub politeness_delay: u64,

    /// Base delay before the first retry, doubled for each later one (milliseconds)
    #[serde(rename = "retry-backoff")]
    pub retry_backoff: u64,
}

impl CrawlerConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff)
    }
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            fetch_timeout: 30_000,
            worker_pool_size: 8,
            politeness_delay: 250,
            retry_backoff: 500,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{})",
            self.crawler_name, self.crawler_version, self.contact_url
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "Folio".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/folio".to_string(),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path of the JSON record file
    #[serde(rename = "records-path")]
    pub records_path: String,

    /// Optional path of the JSON failure log
    #[serde(rename = "failures-path")]
    pub failures_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            records_path: "data/books.json".to_string(),
            failures_path: None,
        }
    }
}

/// CSS locators for the fields pulled out of listing and detail pages
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Anchors on a listing page that point at detail pages
    #[serde(rename = "detail-link")]
    pub detail_link: String,

    /// Anchor on a listing page that points at the next listing page
    #[serde(rename = "next-page")]
    pub next_page: String,

    pub title: String,
    pub price: String,
    pub availability: String,

    /// Element whose class list ends with the rating label
    pub rating: String,

    /// Image element whose `src` is the cover image
    pub image: String,

    pub category: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            detail_link: "article.product_pod h3 a".to_string(),
            next_page: "li.next a".to_string(),
            title: "h1".to_string(),
            price: "p.price_color".to_string(),
            availability: "p.instock.availability".to_string(),
            rating: "p.star-rating".to_string(),
            image: "div.item.active img".to_string(),
            category: "ul.breadcrumb li:nth-child(3) a".to_string(),
        }
    }
}
