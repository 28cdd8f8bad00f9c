use crate::extract::{ExtractionMode, ExtractionResult};
use crate::output::ensure_parent_dir;
use crate::ScraperError;
use std::path::Path;

/// Builds the default export file name for a run
///
/// `<mode>_<url>.json`, with `://` and `/` in the URL replaced by `_`.
///
/// # Example
///
/// ```
/// use web_scraper::output::default_json_filename;
/// use web_scraper::ExtractionMode;
///
/// assert_eq!(
///     default_json_filename(ExtractionMode::Links, "https://example.com/blog"),
///     "links_https_example.com_blog.json"
/// );
/// ```
pub fn default_json_filename(mode: ExtractionMode, url: &str) -> String {
    let sanitized = url.replace("://", "_").replace('/', "_");
    format!("{}_{}.json", mode.to_db_string(), sanitized)
}

/// Writes the items of a result as a pretty-printed JSON array
///
/// Text items become strings, links and images become objects. Non-ASCII
/// characters are written as is.
pub fn write_json(path: &Path, result: &ExtractionResult) -> Result<(), ScraperError> {
    let json = serde_json::to_string_pretty(&result.items)
        .map_err(|e| ScraperError::Export(format!("failed to serialize results: {}", e)))?;

    ensure_parent_dir(path)?;
    std::fs::write(path, json)?;

    tracing::info!(
        "Wrote {} {} to {}",
        result.len(),
        result.mode.noun(),
        path.display()
    );
    Ok(())
}
