use crate::output::{ensure_parent_dir, with_default_extension};
use crate::ScraperError;
use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Namespace of the sitemaps.org protocol
pub const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// File written when no sitemap name is given
pub const DEFAULT_SITEMAP_FILE: &str = "sitemap.xml";

/// Builds a sitemap document listing `urls` in order
///
/// Every entry gets a `<lastmod>` equal to `generated_at` in W3C datetime
/// format. URLs are XML-escaped; they are not deduplicated.
///
/// # Example
///
/// ```
/// use chrono::Utc;
/// use web_scraper::output::build_sitemap;
///
/// let urls = vec!["https://example.com/a".to_string()];
/// let xml = build_sitemap(&urls, Utc::now()).unwrap();
/// assert!(xml.contains("<loc>https://example.com/a</loc>"));
/// ```
pub fn build_sitemap(urls: &[String], generated_at: DateTime<Utc>) -> Result<String, ScraperError> {
    let lastmod = generated_at.to_rfc3339_opts(SecondsFormat::Secs, true);
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    write_event(&mut writer, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut urlset = BytesStart::new("urlset");
    urlset.push_attribute(("xmlns", SITEMAP_NAMESPACE));
    write_event(&mut writer, Event::Start(urlset))?;

    for url in urls {
        write_event(&mut writer, Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", url)?;
        write_text_element(&mut writer, "lastmod", &lastmod)?;
        write_event(&mut writer, Event::End(BytesEnd::new("url")))?;
    }

    write_event(&mut writer, Event::End(BytesEnd::new("urlset")))?;

    let bytes = writer.into_inner().into_inner();
    let mut xml = String::from_utf8(bytes)
        .map_err(|e| ScraperError::Export(format!("sitemap is not valid UTF-8: {}", e)))?;
    xml.push('\n');
    Ok(xml)
}

/// Writes a sitemap for `urls` to `path`
///
/// `.xml` is appended when the file name has no extension. Returns the path
/// actually written.
pub fn write_sitemap(path: &Path, urls: &[String]) -> Result<PathBuf, ScraperError> {
    let path = with_default_extension(path, "xml");
    let xml = build_sitemap(urls, Utc::now())?;

    ensure_parent_dir(&path)?;
    std::fs::write(&path, xml)?;

    tracing::info!("Sitemap with {} URLs written to {}", urls.len(), path.display());
    Ok(path)
}

fn write_text_element(
    writer: &mut Writer<Cursor<Vec<u8>>>,
    name: &str,
    text: &str,
) -> Result<(), ScraperError> {
    write_event(writer, Event::Start(BytesStart::new(name)))?;
    write_event(writer, Event::Text(BytesText::new(text)))?;
    write_event(writer, Event::End(BytesEnd::new(name)))
}

fn write_event(writer: &mut Writer<Cursor<Vec<u8>>>, event: Event<'_>) -> Result<(), ScraperError> {
    writer
        .write_event(event)
        .map_err(|e| ScraperError::Export(format!("failed to write sitemap XML: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use quick_xml::Reader;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap()
    }

    /// Collects the text of every `<loc>` element
    fn locs(xml: &str) -> Vec<String> {
        let mut reader = Reader::from_str(xml);
        let mut in_loc = false;
        let mut found = Vec::new();

        loop {
            match reader.read_event().unwrap() {
                Event::Start(e) if e.name().as_ref() == b"loc" => in_loc = true,
                Event::End(e) if e.name().as_ref() == b"loc" => in_loc = false,
                Event::Text(t) if in_loc => found.push(t.unescape().unwrap().into_owned()),
                Event::Eof => break,
                _ => {}
            }
        }

        found
    }

    #[test]
    fn test_two_entries_in_order() {
        let urls = vec![
            "https://example.com/a".to_string(),
            "https://example.com/b".to_string(),
        ];
        let xml = build_sitemap(&urls, fixed_time()).unwrap();

        assert!(xml.starts_with(r#"<?xml version="1.0" encoding="UTF-8"?>"#));
        assert!(xml.contains(r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">"#));
        assert_eq!(xml.matches("<url>").count(), 2);
        assert_eq!(locs(&xml), urls);
        assert_eq!(xml.matches("<lastmod>2024-03-01T12:30:00Z</lastmod>").count(), 2);
    }

    #[test]
    fn test_urls_are_escaped() {
        let urls = vec!["https://example.com/?a=1&b=<2>".to_string()];
        let xml = build_sitemap(&urls, fixed_time()).unwrap();

        assert!(xml.contains("a=1&amp;b=&lt;2&gt;"));
        assert_eq!(locs(&xml), urls);
    }

    #[test]
    fn test_empty_sitemap_is_valid() {
        let xml = build_sitemap(&[], fixed_time()).unwrap();
        assert_eq!(xml.matches("<url>").count(), 0);
        assert!(xml.contains("</urlset>"));
    }

    #[test]
    fn test_write_sitemap_appends_extension() {
        let dir = TempDir::new().unwrap();
        let written = write_sitemap(
            &dir.path().join("site"),
            &["https://example.com/".to_string()],
        )
        .unwrap();

        assert_eq!(written, dir.path().join("site.xml"));
        let content = std::fs::read_to_string(&written).unwrap();
        assert_eq!(locs(&content), vec!["https://example.com/"]);
    }
}
