//! Integration tests for the extraction pipeline
//!
//! These tests use wiremock to create mock HTTP servers and run the full
//! fetch, parse, extract, persist and export cycle end-to-end.

use std::path::Path;
use tempfile::TempDir;
use web_scraper::config::Config;
use web_scraper::extract::{ExtractedItem, EMAIL_PATTERN};
use web_scraper::report::{generate_report, ReportOptions};
use web_scraper::storage::{RunQuery, SqliteStorage, Storage};
use web_scraper::{Coordinator, ExtractionMode, ExtractionRequest, ScraperError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HTML: &str = "text/html; charset=utf-8";

/// Creates a coordinator exporting into `dir` and persisting to an in-memory database
fn create_coordinator(dir: &Path) -> Coordinator {
    let mut config = Config::default();
    config.http.user_agent = "TestScraper/1.0".to_string();
    config.output.directory = dir.to_path_buf();
    config.output.report_directory = dir.join("reports");

    let storage = SqliteStorage::new_in_memory().expect("in-memory database");
    Coordinator::new(config, Some(Box::new(storage))).expect("coordinator")
}

async fn serve(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body.to_string(), HTML))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_root_relative_link_resolved_against_page() {
    let server = MockServer::start().await;
    serve(&server, "/", r#"<html><body><a href="/about">About</a></body></html>"#).await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());

    let request = ExtractionRequest::new(&server.uri(), ExtractionMode::Links);
    let result = coordinator.run(&request).await.result.unwrap();

    assert_eq!(result.urls(), vec![format!("{}/about", server.uri())]);
}

#[tokio::test]
async fn test_selector_mode_text_and_attribute() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/products",
        r#"<html><body>
            <div class="product" data-sku="A1"><h2> Widget </h2></div>
            <div class="product" data-sku="B2"><h2>Gadget</h2></div>
        </body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());
    let url = format!("{}/products", server.uri());

    let text = coordinator
        .run(&ExtractionRequest::new(&url, ExtractionMode::Selector).selector(".product h2"))
        .await
        .result
        .unwrap();
    assert_eq!(text.values(), vec!["Widget", "Gadget"]);

    let skus = coordinator
        .run(
            &ExtractionRequest::new(&url, ExtractionMode::Selector)
                .selector(".product")
                .attribute("data-sku"),
        )
        .await
        .result
        .unwrap();
    assert_eq!(skus.values(), vec!["A1", "B2"]);

    let none = coordinator
        .run(&ExtractionRequest::new(&url, ExtractionMode::Selector).selector("table"))
        .await
        .result
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_invalid_selector_is_error_and_failed_run() {
    let server = MockServer::start().await;
    serve(&server, "/", "<p>text</p>").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());

    let outcome = coordinator
        .run(
            &ExtractionRequest::new(&server.uri(), ExtractionMode::Selector)
                .selector("p[")
                .save_to_db(true),
        )
        .await;

    assert!(matches!(outcome.result, Err(ScraperError::Selector { .. })));
    assert!(!outcome.run.unwrap().success);
}

#[tokio::test]
async fn test_images_mode() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/gallery/",
        r#"<img src="one.png" alt="One"><img src="/two.jpg"><img alt="no source">"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());
    let url = format!("{}/gallery/", server.uri());

    let result = coordinator
        .run(&ExtractionRequest::new(&url, ExtractionMode::Images))
        .await
        .result
        .unwrap();

    assert_eq!(
        result.urls(),
        vec![
            format!("{}/gallery/one.png", server.uri()),
            format!("{}/two.jpg", server.uri())
        ]
    );
    match &result.items[0] {
        ExtractedItem::Image(image) => assert_eq!(image.alt.as_deref(), Some("One")),
        other => panic!("expected image item, got {:?}", other),
    }
}

#[tokio::test]
async fn test_emails_mode_matches_pattern() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/contact",
        r#"<html><body>
            <p>Write to sales@example.com or support@example.org.</p>
            <p>Again: sales@example.com</p>
            <a href="mailto:press@example.net?subject=Hello">Press</a>
            <script>var hidden = "bot@example.com";</script>
        </body></html>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());
    let url = format!("{}/contact", server.uri());

    let result = coordinator
        .run(&ExtractionRequest::new(&url, ExtractionMode::Emails))
        .await
        .result
        .unwrap();

    let pattern = regex::Regex::new(&format!("^{}$", EMAIL_PATTERN)).unwrap();
    let emails = result.values();
    assert!(emails.iter().all(|e| pattern.is_match(e)));
    assert_eq!(emails[0], "sales@example.com");
    assert!(emails.contains(&"press@example.net".to_string()));
    assert!(!emails.contains(&"bot@example.com".to_string()));
    assert_eq!(emails.iter().filter(|e| *e == "sales@example.com").count(), 1);
}

#[tokio::test]
async fn test_http_404_is_error_with_failed_run() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());
    let url = format!("{}/missing", server.uri());

    let outcome = coordinator
        .run(
            &ExtractionRequest::new(&url, ExtractionMode::Links)
                .save_to_db(true)
                .export_json("missing.json"),
        )
        .await;

    assert!(matches!(
        outcome.result,
        Err(ScraperError::Http { status: 404, .. })
    ));
    assert!(outcome.exported.is_empty());

    let storage = coordinator.storage().unwrap();
    let successful = storage
        .find_runs(&RunQuery::new().url(&url).success(true))
        .await
        .unwrap();
    assert!(successful.is_empty());

    let failed = storage
        .find_runs(&RunQuery::new().url(&url).success(false))
        .await
        .unwrap();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].item_count, 0);
    assert!(failed[0].error_message.as_deref().unwrap().contains("404"));
}

#[tokio::test]
async fn test_binary_body_is_parse_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/file.bin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(vec![0u8, 159, 146, 150], "application/octet-stream"),
        )
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());

    let outcome = coordinator
        .run(&ExtractionRequest::new(
            &format!("{}/file.bin", server.uri()),
            ExtractionMode::Links,
        ))
        .await;

    assert!(matches!(outcome.result, Err(ScraperError::Parse { .. })));
}

#[tokio::test]
async fn test_persist_then_query_by_url_and_timestamp() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/",
        r#"<a href="/a">A</a><a href="/b">B</a><a href="/a">A again</a>"#,
    )
    .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());

    let outcome = coordinator
        .run(&ExtractionRequest::new(&server.uri(), ExtractionMode::Links).save_to_db(true))
        .await;
    let result = outcome.result.as_ref().unwrap();
    let run = outcome.run.as_ref().unwrap();
    assert_eq!(result.len(), 3);

    let storage = coordinator.storage().unwrap();
    let found = storage
        .find_run(&run.url, run.timestamp)
        .await
        .unwrap()
        .expect("run should be found by url and timestamp");

    assert!(found.success);
    assert_eq!(found.item_count as usize, result.len());
    assert_eq!(found.config_hash, coordinator.config_hash());

    let items = storage.get_items(found.id).await.unwrap();
    let values: Vec<_> = items.iter().map(|i| i.value.clone()).collect();
    assert_eq!(values, result.values());
}

#[tokio::test]
async fn test_sitemap_mode_writes_two_entries_in_order() {
    let server = MockServer::start().await;
    serve(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());

    let outcome = coordinator
        .run(&ExtractionRequest::new(&server.uri(), ExtractionMode::Sitemap).sitemap_file("site"))
        .await;

    assert!(outcome.is_complete_success());
    let written = dir.path().join("site.xml");
    assert_eq!(outcome.exported, vec![written.clone()]);

    let xml = std::fs::read_to_string(&written).unwrap();
    assert_eq!(xml.matches("<url>").count(), 2);
    let a = xml.find(&format!("<loc>{}/a</loc>", server.uri())).unwrap();
    let b = xml.find(&format!("<loc>{}/b</loc>", server.uri())).unwrap();
    assert!(a < b);
}

#[tokio::test]
async fn test_json_export() {
    let server = MockServer::start().await;
    serve(&server, "/", "<h1>Título</h1><h1>Second</h1>").await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());

    let outcome = coordinator
        .run(
            &ExtractionRequest::new(&server.uri(), ExtractionMode::Selector)
                .selector("h1")
                .export_json("headings.json"),
        )
        .await;

    assert_eq!(outcome.exported, vec![dir.path().join("headings.json")]);
    let content = std::fs::read_to_string(dir.path().join("headings.json")).unwrap();
    let parsed: Vec<String> = serde_json::from_str(&content).unwrap();
    assert_eq!(parsed, vec!["Título", "Second"]);
}

#[tokio::test]
async fn test_report_after_runs() {
    let server = MockServer::start().await;
    serve(&server, "/", r#"<a href="/x">X</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(410))
        .mount(&server)
        .await;

    let dir = TempDir::new().unwrap();
    let coordinator = create_coordinator(dir.path());

    coordinator
        .run(&ExtractionRequest::new(&server.uri(), ExtractionMode::Links).save_to_db(true))
        .await;
    coordinator
        .run(
            &ExtractionRequest::new(&format!("{}/gone", server.uri()), ExtractionMode::Emails)
                .save_to_db(true),
        )
        .await;

    let storage: &dyn Storage = coordinator.storage().unwrap();
    assert_eq!(storage.count_runs().await.unwrap(), 2);

    let options = ReportOptions::new(&coordinator.config().output.report_directory).last_days(1);
    let artifacts = generate_report(storage, &options).await.unwrap();

    assert_eq!(artifacts.run_count, 2);
    for path in artifacts.paths() {
        assert!(path.exists(), "{} missing", path.display());
    }
    let html = std::fs::read_to_string(&artifacts.html_report).unwrap();
    assert!(html.contains("HTTP 410"));
}
