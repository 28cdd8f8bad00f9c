use url::Url;

/// Extracts the domain from a URL
///
/// This function retrieves the host portion of a URL and converts it to lowercase.
/// URLs without a host (`mailto:`, `data:`) return None.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_scraper::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Extracts the domain from a URL string, or an empty string if it has none
///
/// Used when grouping stored runs, where the URL is only kept as text.
pub fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| extract_domain(&u))
        .unwrap_or_default()
}

/// Returns true if `link` points to a different host than `page`
pub fn is_external(link: &Url, page: &Url) -> bool {
    match (extract_domain(link), extract_domain(page)) {
        (Some(a), Some(b)) => a != b,
        _ => true,
    }
}
