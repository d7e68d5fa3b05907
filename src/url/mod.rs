//! URL handling module for Folio
//!
//! This module provides URL normalization, host extraction, and link
//! resolution. The frontier identifies targets by their normalized form so
//! that trivially different spellings of one page are visited once.

mod domain;
mod normalize;

use ::url::Url;

// Re-export main functions
pub use domain::extract_domain;
pub use normalize::normalize_url;

/// Returns the identity key used for visited-set bookkeeping
///
/// Falls back to the raw URL when normalization rejects it, so a target with
/// an odd URL is still deduplicated against itself.
pub fn url_key(url: &Url) -> String {
    normalize_url(url.as_str())
        .map(|normalized| normalized.to_string())
        .unwrap_or_else(|_| url.to_string())
}

/// Resolves a link href against a page URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - Fragment-only links (same page anchors)
/// - Invalid URLs
/// - Non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}
