//! Web Scraper: a single-page extraction tool
//!
//! This crate fetches one page at a time, parses it, and extracts elements by
//! CSS selector, links, images, email addresses, or a sitemap. Results can be
//! exported to JSON/XML, persisted to SQLite, PostgreSQL or MySQL, and summarised
//! into statistics and chart reports.

pub mod config;
pub mod extract;
pub mod output;
pub mod page;
pub mod pipeline;
pub mod report;
pub mod shell;
pub mod storage;
pub mod url;

use thiserror::Error;

/// Main error type for scraping operations
#[derive(Debug, Error)]
pub enum ScraperError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    #[error("HTTP {status} returned by {url}")]
    Http { url: String, status: u16 },

    #[error("Invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("HTML parse error for {url}: {message}")]
    Parse { url: String, message: String },

    #[error("Invalid CSS selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    #[error("Persistence error: {0}")]
    Persistence(#[from] storage::StorageError),

    #[error("Report error: {0}")]
    Report(#[from] report::ReportError),

    #[error("Export error: {0}")]
    Export(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),
}

impl ScraperError {
    /// Returns true for failures that happened while fetching, parsing or
    /// extracting a page (as opposed to persistence or export failures)
    pub fn is_extraction_error(&self) -> bool {
        matches!(
            self,
            Self::Network { .. }
                | Self::Http { .. }
                | Self::InvalidUrl { .. }
                | Self::Parse { .. }
                | Self::Selector { .. }
        )
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: String, value: String },
}

/// Result type alias for scraping operations
pub type Result<T> = std::result::Result<T, ScraperError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::Config;
pub use extract::{ExtractedItem, ExtractionMode, ExtractionResult};
pub use pipeline::{Coordinator, ExtractionRequest, RunOutcome};
