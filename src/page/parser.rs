//! HTML parsing
//!
//! Parsing is tolerant: malformed markup is repaired by html5ever rather than
//! rejected. A body is only refused when it is not markup at all.

use crate::page::FetchedPage;
use crate::ScraperError;
use scraper::Html;

/// Parses a fetched page into a document tree
///
/// # Returns
///
/// * `Ok(Html)` - The parsed document
/// * `Err(ScraperError::Parse)` - The declared content type is not a text or
///   markup type, or the body contains binary data
///
/// # Example
///
/// ```
/// use web_scraper::page::parse_html;
///
/// let document = parse_html("<p>unclosed <b>tags");
/// let p = scraper::Selector::parse("p").unwrap();
/// assert_eq!(document.select(&p).count(), 1);
/// ```
pub fn parse_page(page: &FetchedPage) -> Result<Html, ScraperError> {
    if let Some(content_type) = &page.content_type {
        if !is_markup_content_type(content_type) {
            return Err(ScraperError::Parse {
                url: page.final_url.to_string(),
                message: format!("content type '{}' is not markup", content_type),
            });
        }
    }

    if page.body.contains('\0') {
        return Err(ScraperError::Parse {
            url: page.final_url.to_string(),
            message: "body contains binary data".to_string(),
        });
    }

    let document = parse_html(&page.body);
    if !document.errors.is_empty() {
        tracing::debug!(
            "Recovered from {} markup errors in {}",
            document.errors.len(),
            page.final_url
        );
    }

    Ok(document)
}

/// Parses raw HTML text into a document tree
pub fn parse_html(html: &str) -> Html {
    Html::parse_document(html)
}

/// Returns true for content types that may hold HTML
fn is_markup_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();

    mime.is_empty() || mime.starts_with("text/") || mime.contains("html") || mime.contains("xml")
}
