//! Crawl target definitions
//!
//! A target is created when a link is discovered and consumed once a worker
//! has dispatched it.

use serde::Serialize;
use std::fmt;
use url::Url;

/// The kind of page a target points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    /// A catalog page with links to detail pages and maybe a next page
    Listing,

    /// A single-item page that yields one record
    Detail,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Detail => "detail",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An absolute URL queued for fetching, tagged with its page kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CrawlTarget {
    url: Url,
    kind: TargetKind,
}

impl CrawlTarget {
    pub fn new(url: Url, kind: TargetKind) -> Self {
        Self { url, kind }
    }

    pub fn listing(url: Url) -> Self {
        Self::new(url, TargetKind::Listing)
    }

    pub fn detail(url: Url) -> Self {
        Self::new(url, TargetKind::Detail)
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn kind(&self) -> TargetKind {
        self.kind
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.url)
    }
}
