use crate::ScraperError;
use url::{ParseError, Url};

/// Resolves a reference found on a page against the page's base URL
///
/// Every kind of reference (absolute, scheme-relative, path-relative,
/// query-only, fragment-only) goes through the same `Url::join`. Returns
/// None when the reference cannot be joined.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use web_scraper::url::resolve_reference;
///
/// let base = Url::parse("https://example.com/docs/index.html").unwrap();
/// let resolved = resolve_reference(&base, "../about").unwrap();
/// assert_eq!(resolved.as_str(), "https://example.com/about");
/// ```
pub fn resolve_reference(base: &Url, reference: &str) -> Option<Url> {
    match base.join(reference.trim()) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::debug!("Skipping unresolvable reference '{}': {}", reference, e);
            None
        }
    }
}

/// Parses a user-supplied target URL
///
/// Input without a scheme is assumed to be `https://`, including `host:port`
/// forms such as `localhost:8080`. Only HTTP(S) targets are accepted.
pub fn parse_target_url(input: &str) -> Result<Url, ScraperError> {
    let input = input.trim();
    let invalid = |message: String| ScraperError::InvalidUrl {
        url: input.to_string(),
        message,
    };

    let url = match Url::parse(input) {
        Ok(url) if is_host_and_port(&url, input) => parse_with_https(input)?,
        Ok(url) => url,
        Err(ParseError::RelativeUrlWithoutBase) => parse_with_https(input)?,
        Err(e) => return Err(invalid(e.to_string())),
    };

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(invalid(format!("unsupported scheme '{}'", other))),
    }
}

/// `localhost:8080` parses as scheme `localhost` with path `8080`
fn is_host_and_port(url: &Url, input: &str) -> bool {
    !matches!(url.scheme(), "http" | "https")
        && !input.contains("://")
        && url.path().starts_with(|c: char| c.is_ascii_digit())
}

fn parse_with_https(input: &str) -> Result<Url, ScraperError> {
    Url::parse(&format!("https://{}", input)).map_err(|e| ScraperError::InvalidUrl {
        url: input.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/dir/page.html?x=1").unwrap()
    }

    #[test]
    fn test_root_relative() {
        let url = resolve_reference(&base(), "/about").unwrap();
        assert_eq!(url.as_str(), "https://example.com/about");
    }

    #[test]
    fn test_path_relative() {
        let url = resolve_reference(&base(), "other.html").unwrap();
        assert_eq!(url.as_str(), "https://example.com/dir/other.html");
    }

    #[test]
    fn test_scheme_relative() {
        let url = resolve_reference(&base(), "//cdn.example.net/a.png").unwrap();
        assert_eq!(url.as_str(), "https://cdn.example.net/a.png");
    }

    #[test]
    fn test_fragment_only() {
        let url = resolve_reference(&base(), "#top").unwrap();
        assert_eq!(url.as_str(), "https://example.com/dir/page.html?x=1#top");
    }

    #[test]
    fn test_absolute_passthrough() {
        let url = resolve_reference(&base(), "http://other.org/x").unwrap();
        assert_eq!(url.as_str(), "http://other.org/x");
    }

    #[test]
    fn test_matches_url_join() {
        let references = ["a/b", "../c", "?q=2", "//h.org/", "/x#y", "mailto:a@b.co"];
        for r in references {
            assert_eq!(
                resolve_reference(&base(), r),
                base().join(r).ok(),
                "reference {}",
                r
            );
        }
    }

    #[test]
    fn test_unjoinable_reference_skipped() {
        assert!(resolve_reference(&base(), "http://[::1").is_none());
    }

    #[test]
    fn test_parse_target_adds_scheme() {
        let url = parse_target_url("example.com/page").unwrap();
        assert_eq!(url.as_str(), "https://example.com/page");
    }

    #[test]
    fn test_parse_target_query_with_scheme() {
        let url = parse_target_url("example.com/?next=http://x").unwrap();
        assert_eq!(url.host_str(), Some("example.com"));
        assert_eq!(url.query(), Some("next=http://x"));
    }

    #[test]
    fn test_parse_target_host_and_port() {
        let url = parse_target_url("localhost:8080/status").unwrap();
        assert_eq!(url.as_str(), "https://localhost:8080/status");

        let url = parse_target_url("http://127.0.0.1:3000").unwrap();
        assert_eq!(url.port(), Some(3000));
    }

    #[test]
    fn test_parse_target_rejects_mailto() {
        assert!(matches!(
            parse_target_url("mailto:someone@example.com"),
            Err(ScraperError::InvalidUrl { message, .. }) if message.contains("mailto")
        ));
    }

    #[test]
    fn test_parse_target_rejects_other_schemes() {
        assert!(matches!(
            parse_target_url("ftp://example.com/"),
            Err(ScraperError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_parse_target_rejects_garbage() {
        assert!(parse_target_url("http://").is_err());
    }
}
