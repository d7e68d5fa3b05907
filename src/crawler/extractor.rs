//! Selector-driven extraction for listing and detail pages
//!
//! Listing pages yield the detail links they carry plus an optional link to
//! the next listing page. Detail pages yield one [`BookRecord`].

use crate::config::{parse_selector, SelectorConfig};
use crate::record::{BookRecord, NOT_AVAILABLE, NO_RATING};
use crate::url::resolve_link;
use crate::{ConfigError, ExtractionError};
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Links found on one listing page
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    /// Absolute detail-page URLs, in page order, without repeats
    pub detail_urls: Vec<Url>,

    /// The next listing page; absent on the last page
    pub next_url: Option<Url>,
}

impl ListingPage {
    pub fn is_empty(&self) -> bool {
        self.detail_urls.is_empty() && self.next_url.is_none()
    }
}

/// Compiled locators for both extraction modes
///
/// Built once per run from the configured CSS selectors and shared by all
/// workers.
#[derive(Debug, Clone)]
pub struct Extractor {
    detail_link: Selector,
    next_page: Selector,
    title: Selector,
    price: Selector,
    availability: Selector,
    rating: Selector,
    image: Selector,
    category: Selector,
}

impl Extractor {
    /// Compiles the configured selectors
    ///
    /// # Returns
    ///
    /// * `Ok(Extractor)` - All selectors compiled
    /// * `Err(ConfigError::InvalidSelector)` - A selector failed to parse
    pub fn new(config: &SelectorConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            detail_link: parse_selector("detail-link", &config.detail_link)?,
            next_page: parse_selector("next-page", &config.next_page)?,
            title: parse_selector("title", &config.title)?,
            price: parse_selector("price", &config.price)?,
            availability: parse_selector("availability", &config.availability)?,
            rating: parse_selector("rating", &config.rating)?,
            image: parse_selector("image", &config.image)?,
            category: parse_selector("category", &config.category)?,
        })
    }

    /// Extracts detail links and the next-page link from a listing page
    ///
    /// Relative hrefs are resolved against `page_url`, which should be the
    /// final URL after redirects. A page with neither is valid and simply
    /// contributes nothing.
    pub fn extract_listing(&self, html: &str, page_url: &Url) -> ListingPage {
        let document = Html::parse_document(html);

        let mut seen = HashSet::new();
        let detail_urls = document
            .select(&self.detail_link)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(href, page_url))
            .filter(|url| seen.insert(url.clone()))
            .collect();

        let next_url = document
            .select(&self.next_page)
            .filter_map(|element| element.value().attr("href"))
            .find_map(|href| resolve_link(href, page_url));

        ListingPage {
            detail_urls,
            next_url,
        }
    }

    /// Extracts one book record from a detail page
    ///
    /// # Required fields
    ///
    /// Title and price must be present and non-blank. The record URL is
    /// always `page_url`.
    ///
    /// # Defaults
    ///
    /// | Field | Missing value |
    /// |-------|---------------|
    /// | availability | `"Not available"` |
    /// | rating | `"No rating"` |
    /// | image_url | `None` |
    /// | category | `""` |
    pub fn extract_book(&self, html: &str, page_url: &Url) -> Result<BookRecord, ExtractionError> {
        let document = Html::parse_document(html);

        let title = first_text(&document, &self.title).ok_or(ExtractionError::new("title"))?;
        let price = first_text(&document, &self.price).ok_or(ExtractionError::new("price"))?;

        let availability = document
            .select(&self.availability)
            .next()
            .map(|element| element.text().collect::<String>().trim().to_string())
            .filter(|text| !text.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string());

        let rating = document
            .select(&self.rating)
            .next()
            .and_then(|element| element.value().attr("class"))
            .and_then(rating_from_class)
            .unwrap_or_else(|| NO_RATING.to_string());

        let image_url = document
            .select(&self.image)
            .next()
            .and_then(|element| element.value().attr("src"))
            .and_then(|src| resolve_link(src, page_url))
            .map(|url| url.to_string());

        let category = first_text(&document, &self.category).unwrap_or_default();

        Ok(BookRecord {
            title,
            price,
            availability,
            rating,
            image_url,
            category,
            source_url: page_url.to_string(),
        })
    }
}

/// Trimmed text of the first element matching `selector`, if non-blank
fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// Concatenated, trimmed text content of an element
fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Takes the last whitespace-separated class token as the rating label
///
/// `"star-rating Three"` gives `"Three"`. The label is kept verbatim.
fn rating_from_class(class: &str) -> Option<String> {
    class.split_whitespace().last().map(str::to_string)
}
