//! Storage module for persisting extraction runs
//!
//! This module handles all database operations, including:
//! - Schema creation for the SQLite, PostgreSQL and MySQL backends
//! - Recording successful and failed runs with their items
//! - Querying run history by URL, domain, mode and time range
//! - Purging old runs

mod mysql;
mod postgres;
mod schema;
mod sqlite;
mod traits;

pub use mysql::MysqlStorage;
pub use postgres::PostgresStorage;
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::extract::ExtractionMode;
use crate::url::domain_of;
use chrono::{DateTime, SubsecRound, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

/// Opens the backend selected by the configuration
///
/// # Returns
///
/// * `Ok(Box<dyn Storage>)` - Connected backend with its schema in place
/// * `Err(StorageError)` - Failed to open or connect
pub async fn open_storage(config: &DatabaseConfig) -> StorageResult<Box<dyn Storage>> {
    match config.backend {
        DatabaseBackend::Sqlite => Ok(Box::new(SqliteStorage::new(&config.sqlite_path)?)),
        DatabaseBackend::Postgres => Ok(Box::new(PostgresStorage::connect(&config.postgres).await?)),
        DatabaseBackend::Mysql => Ok(Box::new(MysqlStorage::connect(&config.mysql).await?)),
    }
}

/// Current time truncated to the precision both backends store
pub fn storage_now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// A run about to be written
#[derive(Debug, Clone)]
pub struct NewRun {
    pub url: String,
    pub domain: String,
    pub mode: ExtractionMode,
    pub timestamp: DateTime<Utc>,
    /// Mode-specific parameters, e.g. `{"selector": "h1"}`
    pub metadata: Value,
    pub config_hash: String,
}

impl NewRun {
    /// Creates a run stamped with the current time
    pub fn new(url: &str, mode: ExtractionMode, config_hash: &str) -> Self {
        Self {
            url: url.to_string(),
            domain: domain_of(url),
            mode,
            timestamp: storage_now(),
            metadata: Value::Object(Map::new()),
            config_hash: config_hash.to_string(),
        }
    }

    /// Adds a metadata entry
    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        if let Value::Object(map) = &mut self.metadata {
            map.insert(key.to_string(), value.into());
        }
        self
    }

    /// Overrides the timestamp (truncated to microseconds)
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp.trunc_subsecs(6);
        self
    }
}

/// Represents a persisted extraction run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunRecord {
    pub id: i64,
    pub url: String,
    pub domain: String,
    pub mode: ExtractionMode,
    pub timestamp: DateTime<Utc>,
    pub item_count: u64,
    pub success: bool,
    pub error_message: Option<String>,
    pub metadata: Value,
    pub config_hash: String,
}

/// Represents one extracted value belonging to a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredItem {
    pub run_id: i64,
    pub position: u32,
    pub value: String,
    pub attributes: Option<Value>,
}

/// Filter for run queries
///
/// All set fields must match. The time range is `[since, until)`.
#[derive(Debug, Clone, Default)]
pub struct RunQuery {
    pub url: Option<String>,
    pub domain: Option<String>,
    pub mode: Option<ExtractionMode>,
    pub success: Option<bool>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
}

impl RunQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = Some(url.to_string());
        self
    }

    pub fn domain(mut self, domain: &str) -> Self {
        self.domain = Some(domain.to_string());
        self
    }

    pub fn mode(mut self, mode: ExtractionMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn success(mut self, success: bool) -> Self {
        self.success = Some(success);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}
