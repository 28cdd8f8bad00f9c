use crate::extract::LinkItem;
use crate::url::{is_external, resolve_reference};
use scraper::{Html, Selector};
use url::Url;

/// Extracts every hyperlink on the page as an absolute URL
///
/// Walks `<a href>` elements in document order and resolves each `href`
/// against `base`. Duplicates are kept in order of appearance. References
/// that cannot be resolved are skipped.
///
/// # Example
///
/// ```
/// use url::Url;
/// use web_scraper::extract::extract_links;
/// use web_scraper::page::parse_html;
///
/// let doc = parse_html(r#"<a href="/about">About</a>"#);
/// let base = Url::parse("https://example.com").unwrap();
/// let links = extract_links(&doc, &base);
/// assert_eq!(links[0].url, "https://example.com/about");
/// ```
pub fn extract_links(document: &Html, base: &Url) -> Vec<LinkItem> {
    let mut links = Vec::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        let Some(href) = element.value().attr("href") else {
            continue;
        };

        if let Some(absolute) = resolve_reference(base, href) {
            let text = element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");

            links.push(LinkItem {
                external: is_external(&absolute, base),
                url: absolute.to_string(),
                text: (!text.is_empty()).then_some(text),
            });
        }
    }

    tracing::debug!("Found {} links on {}", links.len(), base);
    links
}
