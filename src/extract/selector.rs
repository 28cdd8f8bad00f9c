use crate::ScraperError;
use scraper::{Html, Selector};

/// Extracts the content of every element matching a CSS selector
///
/// Returns the whitespace-trimmed text content of each match in document
/// order, or, when `attribute` is given, the value of that attribute on each
/// match that carries it. No match is a valid outcome and yields an empty
/// vector.
///
/// # Errors
///
/// `ScraperError::Selector` when the selector is empty or not valid CSS.
///
/// # Example
///
/// ```
/// use web_scraper::extract::extract_elements;
/// use web_scraper::page::parse_html;
///
/// let doc = parse_html("<ul><li>One</li><li> Two </li></ul>");
/// let items = extract_elements(&doc, "li", None).unwrap();
/// assert_eq!(items, vec!["One", "Two"]);
/// ```
pub fn extract_elements(
    document: &Html,
    selector: &str,
    attribute: Option<&str>,
) -> Result<Vec<String>, ScraperError> {
    let selector_str = selector.trim();
    if selector_str.is_empty() {
        return Err(ScraperError::Selector {
            selector: selector.to_string(),
            message: "selector is empty".to_string(),
        });
    }

    let parsed = Selector::parse(selector_str).map_err(|e| ScraperError::Selector {
        selector: selector_str.to_string(),
        message: e.to_string(),
    })?;

    let attribute = attribute.map(str::trim).filter(|a| !a.is_empty());

    let values = document
        .select(&parsed)
        .filter_map(|element| match attribute {
            Some(name) => element.value().attr(name).map(|v| v.to_string()),
            None => Some(element.text().collect::<String>().trim().to_string()),
        })
        .collect();

    Ok(values)
}
