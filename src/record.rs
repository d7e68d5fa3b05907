//! The record extracted from one detail page

use serde::{Deserialize, Serialize};

/// Rating labels used by the catalog, in ascending order
pub const RATING_LABELS: [&str; 5] = ["One", "Two", "Three", "Four", "Five"];

/// Rating used when a page carries no rating element
pub const NO_RATING: &str = "No rating";

/// Availability used when a page carries no availability text
pub const NOT_AVAILABLE: &str = "Not available";

/// One book scraped from a detail page
///
/// Serialized field names are part of the downstream contract: every record
/// carries all seven keys, with `image_url` as the only nullable one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BookRecord {
    pub title: String,
    pub price: String,
    pub availability: String,
    /// Verbatim rating label, e.g. "Three" or "No rating"
    pub rating: String,
    pub image_url: Option<String>,
    pub category: String,
    /// Final URL of the detail page; unique per record
    #[serde(rename = "url")]
    pub source_url: String,
}

impl BookRecord {
    /// The natural unique key of this record
    pub fn key(&self) -> &str {
        &self.source_url
    }

    /// Returns true if the rating is one of the labels the catalog uses
    pub fn has_known_rating(&self) -> bool {
        self.rating == NO_RATING || RATING_LABELS.contains(&self.rating.as_str())
    }
}
