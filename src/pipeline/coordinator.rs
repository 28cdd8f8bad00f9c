//! Pipeline coordinator - runs one extraction end to end
//!
//! One call to [`Coordinator::run`]:
//! - fetches and parses the page
//! - runs the extractor for the requested mode
//! - persists the run (success or failure) when asked to
//! - writes the JSON and sitemap exports

use crate::config::{compute_config_hash, Config, DatabaseConfig};
use crate::extract::{extract, ExtractOptions, ExtractedItem, ExtractionMode, ExtractionResult};
use crate::output::{write_json, write_sitemap, DEFAULT_SITEMAP_FILE};
use crate::page::{parse_page, FetchedPage, Fetcher};
use crate::storage::{open_storage, NewRun, RunRecord, Storage, StorageError};
use crate::url::parse_target_url;
use crate::ScraperError;
use std::path::{Path, PathBuf};

/// What to extract from which page, and where the result should go
#[derive(Debug, Clone)]
pub struct ExtractionRequest {
    pub url: String,
    pub mode: ExtractionMode,
    /// CSS selector (selector mode)
    pub selector: Option<String>,
    /// Attribute to read instead of text (selector mode)
    pub attribute: Option<String>,
    /// Persist the run to the configured backend
    pub save_to_db: bool,
    /// Write the items as JSON to this file
    pub json_path: Option<PathBuf>,
    /// Sitemap file name (sitemap mode); defaults to `sitemap.xml`
    pub sitemap_path: Option<PathBuf>,
}

impl ExtractionRequest {
    pub fn new(url: &str, mode: ExtractionMode) -> Self {
        Self {
            url: url.trim().to_string(),
            mode,
            selector: None,
            attribute: None,
            save_to_db: false,
            json_path: None,
            sitemap_path: None,
        }
    }

    pub fn selector(mut self, selector: &str) -> Self {
        self.selector = Some(selector.to_string());
        self
    }

    pub fn attribute(mut self, attribute: &str) -> Self {
        self.attribute = Some(attribute.to_string());
        self
    }

    pub fn save_to_db(mut self, save: bool) -> Self {
        self.save_to_db = save;
        self
    }

    pub fn export_json(mut self, path: impl Into<PathBuf>) -> Self {
        self.json_path = Some(path.into());
        self
    }

    pub fn sitemap_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.sitemap_path = Some(path.into());
        self
    }

    fn options(&self) -> ExtractOptions {
        ExtractOptions {
            selector: self.selector.clone(),
            attribute: self.attribute.clone().filter(|a| !a.trim().is_empty()),
        }
    }
}

/// Everything that happened during one pipeline run
///
/// Persistence and export failures never replace the extraction result;
/// they are reported alongside it.
#[derive(Debug)]
pub struct RunOutcome {
    pub result: Result<ExtractionResult, ScraperError>,
    /// The persisted run, if one was written
    pub run: Option<RunRecord>,
    pub persistence_error: Option<StorageError>,
    /// Files written by exports
    pub exported: Vec<PathBuf>,
    pub export_errors: Vec<ScraperError>,
}

impl RunOutcome {
    pub fn run_id(&self) -> Option<i64> {
        self.run.as_ref().map(|r| r.id)
    }

    /// True when extraction, persistence and exports all succeeded
    pub fn is_complete_success(&self) -> bool {
        self.result.is_ok() && self.persistence_error.is_none() && self.export_errors.is_empty()
    }
}

/// Main pipeline coordinator structure
pub struct Coordinator {
    config: Config,
    config_hash: String,
    fetcher: Fetcher,
    storage: Option<Box<dyn Storage>>,
}

impl Coordinator {
    /// Creates a coordinator with an explicit storage backend (or none)
    pub fn new(
        config: Config,
        storage: Option<Box<dyn Storage>>,
    ) -> Result<Self, ScraperError> {
        let fetcher = Fetcher::new(&config.http)?;
        let config_hash = compute_config_hash(&config);

        Ok(Self {
            config,
            config_hash,
            fetcher,
            storage,
        })
    }

    /// Creates a coordinator, opening the configured backend if enabled
    ///
    /// A backend that cannot be opened is logged and left out; extraction
    /// still works without persistence.
    pub async fn from_config(config: Config) -> Result<Self, ScraperError> {
        let storage = if config.database.enabled {
            match open_storage(&config.database).await {
                Ok(storage) => {
                    tracing::info!("Using {} storage", storage.backend_name());
                    Some(storage)
                }
                Err(e) => {
                    tracing::warn!("Database unavailable, results will not be saved: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Self::new(config, storage)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_hash(&self) -> &str {
        &self.config_hash
    }

    pub fn storage(&self) -> Option<&dyn Storage> {
        self.storage.as_deref()
    }

    /// Switches to a different database configuration
    ///
    /// The new backend is opened first; on failure the current one is kept.
    pub async fn reconfigure_database(&mut self, database: DatabaseConfig) -> Result<(), StorageError> {
        let storage = open_storage(&database).await?;
        storage.ping().await?;

        tracing::info!("Switched to {} storage", storage.backend_name());
        self.storage = Some(storage);
        self.config.database = database;
        self.config.database.enabled = true;
        self.config_hash = compute_config_hash(&self.config);
        Ok(())
    }

    /// Fetches, parses and extracts without persisting or exporting
    pub async fn extract(&self, request: &ExtractionRequest) -> Result<ExtractionResult, ScraperError> {
        let target = parse_target_url(&request.url)?;

        tracing::info!("Fetching {} ({} mode)", target, request.mode);
        let page = self.fetcher.fetch(&target).await?;

        let items = extract_from_page(&page, request.mode, &request.options())?;
        tracing::info!(
            "Extracted {} {} from {}",
            items.len(),
            request.mode.noun(),
            page.final_url
        );

        Ok(ExtractionResult {
            url: target.to_string(),
            mode: request.mode,
            items,
        })
    }

    /// Runs the full pipeline for one request
    pub async fn run(&self, request: &ExtractionRequest) -> RunOutcome {
        let result = self.extract(request).await;

        let mut outcome = RunOutcome {
            result,
            run: None,
            persistence_error: None,
            exported: Vec::new(),
            export_errors: Vec::new(),
        };

        if request.save_to_db {
            self.persist(request, &mut outcome).await;
        }

        if let Ok(result) = &outcome.result {
            let (exported, errors) = self.export(request, result);
            outcome.exported = exported;
            outcome.export_errors = errors;
        }

        outcome
    }

    async fn persist(&self, request: &ExtractionRequest, outcome: &mut RunOutcome) {
        let Some(storage) = self.storage.as_deref() else {
            tracing::warn!("Save requested but no database is configured");
            outcome.persistence_error = Some(StorageError::Unsupported(
                "no database is configured".to_string(),
            ));
            return;
        };

        let url = match &outcome.result {
            Ok(result) => result.url.clone(),
            Err(_) => parse_target_url(&request.url)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| request.url.clone()),
        };
        let run = self.new_run(&url, request);

        let recorded = match &outcome.result {
            Ok(result) => storage.record_run(&run, &result.items).await,
            Err(e) if e.is_extraction_error() => storage.record_failure(&run, &e.to_string()).await,
            Err(_) => return,
        };

        match recorded {
            Ok(record) => {
                tracing::debug!("Run {} saved", record.id);
                outcome.run = Some(record);
            }
            Err(e) => {
                tracing::error!("Failed to save run for {}: {}", url, e);
                outcome.persistence_error = Some(e);
            }
        }
    }

    fn new_run(&self, url: &str, request: &ExtractionRequest) -> NewRun {
        let run = NewRun::new(url, request.mode, &self.config_hash);
        if request.mode == ExtractionMode::Selector {
            run.with_metadata("selector", request.selector.clone())
                .with_metadata("attribute", request.options().attribute)
        } else {
            run
        }
    }

    fn export(
        &self,
        request: &ExtractionRequest,
        result: &ExtractionResult,
    ) -> (Vec<PathBuf>, Vec<ScraperError>) {
        let mut exported = Vec::new();
        let mut errors = Vec::new();

        if let Some(json_path) = &request.json_path {
            let path = self.output_path(json_path);
            match write_json(&path, result) {
                Ok(()) => exported.push(path),
                Err(e) => {
                    tracing::error!("JSON export to {} failed: {}", path.display(), e);
                    errors.push(e);
                }
            }
        }

        if request.mode == ExtractionMode::Sitemap {
            let name = request
                .sitemap_path
                .clone()
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SITEMAP_FILE));
            match write_sitemap(&self.output_path(&name), &result.urls()) {
                Ok(path) => exported.push(path),
                Err(e) => {
                    tracing::error!("Sitemap export failed: {}", e);
                    errors.push(e);
                }
            }
        }

        (exported, errors)
    }

    /// Resolves relative export paths against the output directory
    fn output_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.config.output.directory.join(path)
        }
    }
}

/// Parses the page and runs the extractor; the DOM does not outlive this call
fn extract_from_page(
    page: &FetchedPage,
    mode: ExtractionMode,
    options: &ExtractOptions,
) -> Result<Vec<ExtractedItem>, ScraperError> {
    let document = parse_page(page)?;
    extract(&document, &page.final_url, mode, options)
}
