//! Storage traits and error types
//!
//! This module defines the trait interface for persistence backends and
//! associated error types.

use crate::extract::ExtractedItem;
use crate::storage::{NewRun, RunQuery, RunRecord, StoredItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database server error: {0}")]
    Server(#[from] sqlx::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Run not found: {0}")]
    RunNotFound(i64),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for persistence backend implementations
///
/// A backend stores one row per extraction run plus the ordered items the
/// run produced. Runs are never updated after they are written; they are
/// only removed by an explicit purge.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend name for display
    fn backend_name(&self) -> &'static str;

    /// Checks that the backend is reachable
    async fn ping(&self) -> StorageResult<()>;

    // ===== Writes =====

    /// Records a successful run and its items in a single transaction
    ///
    /// `item_count` is taken from `items`; positions start at 0.
    async fn record_run(&self, run: &NewRun, items: &[ExtractedItem]) -> StorageResult<RunRecord>;

    /// Records a failed run with `item_count = 0` and no items
    async fn record_failure(&self, run: &NewRun, error_message: &str) -> StorageResult<RunRecord>;

    /// Deletes every run (and its items) older than `before`
    ///
    /// Returns the number of runs removed.
    async fn delete_runs_before(&self, before: DateTime<Utc>) -> StorageResult<u64>;

    // ===== Queries =====

    /// Returns runs matching `query`, newest first
    async fn find_runs(&self, query: &RunQuery) -> StorageResult<Vec<RunRecord>>;

    /// Finds the run for an exact URL and timestamp
    async fn find_run(&self, url: &str, timestamp: DateTime<Utc>)
        -> StorageResult<Option<RunRecord>>;

    /// Gets a run by ID
    async fn get_run(&self, run_id: i64) -> StorageResult<RunRecord>;

    /// Gets the items of a run ordered by position
    async fn get_items(&self, run_id: i64) -> StorageResult<Vec<StoredItem>>;

    /// Counts all stored runs
    async fn count_runs(&self) -> StorageResult<u64>;
}
