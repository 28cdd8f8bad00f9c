//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests, including:
//! - Building the persistent HTTP session with the configured user agent
//! - GET requests for page content
//! - Error classification into network and HTTP status failures
//!
//! There is no retry: a single failure is returned to the caller.

use crate::config::HttpConfig;
use crate::{ConfigError, ScraperError};
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// A successfully fetched page
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: Url,
    /// Final URL after redirects, used as the base for resolving references
    pub final_url: Url,
    /// HTTP status code
    pub status: u16,
    /// Content-Type header value, if any
    pub content_type: Option<String>,
    /// Decoded response body
    pub body: String,
}

/// Builds an HTTP client with proper configuration
///
/// The client keeps a connection pool, so reusing it across calls shares
/// connections as well as the identification header.
///
/// # Example
///
/// ```no_run
/// use web_scraper::config::HttpConfig;
/// use web_scraper::page::build_http_client;
///
/// let client = build_http_client(&HttpConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Persistent HTTP session used for every fetch in a process
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
}

impl Fetcher {
    /// Creates a fetcher with a freshly built client
    pub fn new(config: &HttpConfig) -> Result<Self, ScraperError> {
        let client = build_http_client(config).map_err(|e| {
            ConfigError::Validation(format!("failed to build HTTP client: {}", e))
        })?;
        Ok(Self { client })
    }

    /// Wraps an existing client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Fetches a URL with a single GET request
    ///
    /// # Error Classification
    ///
    /// | Condition | Error |
    /// |-----------|-------|
    /// | DNS failure, refused connection, TLS error | `Network` |
    /// | Timeout | `Network` |
    /// | Body could not be read | `Network` |
    /// | Non-2xx status | `Http` |
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, ScraperError> {
        tracing::debug!("GET {}", url);

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| network_error(url, &e))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            tracing::warn!("{} returned HTTP {}", url, status.as_u16());
            return Err(ScraperError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let body = response
            .text()
            .await
            .map_err(|e| network_error(url, &e))?;

        tracing::info!(
            "Fetched {} ({} bytes, HTTP {})",
            final_url,
            body.len(),
            status.as_u16()
        );

        Ok(FetchedPage {
            url: url.clone(),
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        })
    }
}

/// Classifies a transport failure
fn network_error(url: &Url, e: &reqwest::Error) -> ScraperError {
    let message = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };

    tracing::warn!("Network error for {}: {}", url, message);

    ScraperError::Network {
        url: url.to_string(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        let client = build_http_client(&HttpConfig::default());
        assert!(client.is_ok());
    }

    #[test]
    fn test_fetcher_from_config() {
        let config = HttpConfig {
            user_agent: "TestScraper/1.0".to_string(),
            timeout_secs: 2,
            connect_timeout_secs: 1,
        };
        assert!(Fetcher::new(&config).is_ok());
    }

    #[tokio::test]
    async fn test_redirect_sets_final_url() {
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/old"))
            .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/new/"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("<p>moved</p>", "text/html"))
            .mount(&server)
            .await;

        let client = build_http_client(&HttpConfig::default()).unwrap();
        let fetcher = Fetcher::with_client(client);
        let url = Url::parse(&format!("{}/old", server.uri())).unwrap();

        let page = fetcher.fetch(&url).await.unwrap();
        assert_eq!(page.url, url);
        assert_eq!(page.final_url.path(), "/new/");
        assert_eq!(page.status, 200);
        assert_eq!(page.content_type.as_deref(), Some("text/html"));
        assert_eq!(page.body, "<p>moved</p>");
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let fetcher = Fetcher::new(&HttpConfig {
            user_agent: "TestScraper/1.0".to_string(),
            timeout_secs: 2,
            connect_timeout_secs: 1,
        })
        .unwrap();

        // Port 9 (discard) is not expected to accept HTTP connections
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let result = fetcher.fetch(&url).await;
        assert!(matches!(result, Err(ScraperError::Network { .. })));
    }
}
