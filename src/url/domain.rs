use url::Url;

/// Extracts the host from a URL, lowercased
///
/// The politeness gate keys its per-host spacing on this value. Ports are
/// not part of the key, so two services on one host share one budget.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use folio_crawler::url::extract_domain;
///
/// let url = Url::parse("https://BOOKS.toscrape.com/index.html").unwrap();
/// assert_eq!(extract_domain(&url), Some("books.toscrape.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
