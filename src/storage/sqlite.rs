//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::extract::{ExtractedItem, ExtractionMode};
use crate::storage::schema::initialize_sqlite_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{NewRun, RunQuery, RunRecord, StoredItem};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value as SqlValue};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const RUN_COLUMNS: &str = "id, url, domain, mode, timestamp, item_count, success, error_message, metadata, config_hash";

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Opens or creates the database file, creating parent directories
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    pub fn new(path: &Path) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
        ",
        )?;

        initialize_sqlite_schema(&conn)?;
        tracing::debug!("Opened SQLite database at {}", path.display());

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_sqlite_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Database("connection lock poisoned".to_string()))
    }

    fn insert_run(
        conn: &Connection,
        run: &NewRun,
        item_count: usize,
        error_message: Option<&str>,
    ) -> StorageResult<RunRecord> {
        conn.execute(
            "INSERT INTO runs (url, domain, mode, timestamp, item_count, success, error_message, metadata, config_hash)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                run.url,
                run.domain,
                run.mode.to_db_string(),
                format_timestamp(run.timestamp),
                item_count as i64,
                error_message.is_none(),
                error_message,
                run.metadata.to_string(),
                run.config_hash,
            ],
        )?;

        Ok(RunRecord {
            id: conn.last_insert_rowid(),
            url: run.url.clone(),
            domain: run.domain.clone(),
            mode: run.mode,
            timestamp: run.timestamp,
            item_count: item_count as u64,
            success: error_message.is_none(),
            error_message: error_message.map(|m| m.to_string()),
            metadata: run.metadata.clone(),
            config_hash: run.config_hash.clone(),
        })
    }
}

/// Text form of a timestamp; fixed width so that text order is time order
fn format_timestamp(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error<E>(idx: usize, err: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn row_to_run(row: &Row<'_>) -> rusqlite::Result<RunRecord> {
    let mode_str: String = row.get(3)?;
    let mode = ExtractionMode::from_db_string(&mode_str).ok_or_else(|| {
        conversion_error(
            3,
            StorageError::Serialization(format!("unknown mode '{}'", mode_str)),
        )
    })?;

    let timestamp_str: String = row.get(4)?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map_err(|e| conversion_error(4, e))?
        .with_timezone(&Utc);

    let metadata_str: String = row.get(8)?;
    let metadata = serde_json::from_str(&metadata_str).map_err(|e| conversion_error(8, e))?;

    Ok(RunRecord {
        id: row.get(0)?,
        url: row.get(1)?,
        domain: row.get(2)?,
        mode,
        timestamp,
        item_count: row.get::<_, i64>(5)?.max(0) as u64,
        success: row.get(6)?,
        error_message: row.get(7)?,
        metadata,
        config_hash: row.get(9)?,
    })
}

#[async_trait]
impl Storage for SqliteStorage {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    async fn ping(&self) -> StorageResult<()> {
        let conn = self.conn()?;
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }

    async fn record_run(&self, run: &NewRun, items: &[ExtractedItem]) -> StorageResult<RunRecord> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let record = Self::insert_run(&tx, run, items.len(), None)?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO items (run_id, position, value, attributes) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for (position, item) in items.iter().enumerate() {
                stmt.execute(params![
                    record.id,
                    position as i64,
                    item.value(),
                    item.attributes().map(|attrs| attrs.to_string()),
                ])?;
            }
        }

        tx.commit()?;
        tracing::debug!("Recorded run {} with {} items", record.id, record.item_count);
        Ok(record)
    }

    async fn record_failure(&self, run: &NewRun, error_message: &str) -> StorageResult<RunRecord> {
        let conn = self.conn()?;
        let record = Self::insert_run(&conn, run, 0, Some(error_message))?;
        tracing::debug!("Recorded failed run {}", record.id);
        Ok(record)
    }

    async fn delete_runs_before(&self, before: DateTime<Utc>) -> StorageResult<u64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let cutoff = format_timestamp(before);

        tx.execute(
            "DELETE FROM items WHERE run_id IN (SELECT id FROM runs WHERE timestamp < ?1)",
            params![cutoff],
        )?;
        let deleted = tx.execute("DELETE FROM runs WHERE timestamp < ?1", params![cutoff])?;

        tx.commit()?;
        Ok(deleted as u64)
    }

    async fn find_runs(&self, query: &RunQuery) -> StorageResult<Vec<RunRecord>> {
        let mut sql = format!("SELECT {} FROM runs WHERE 1 = 1", RUN_COLUMNS);
        let mut values: Vec<SqlValue> = Vec::new();

        if let Some(url) = &query.url {
            values.push(SqlValue::Text(url.clone()));
            sql.push_str(&format!(" AND url = ?{}", values.len()));
        }
        if let Some(domain) = &query.domain {
            values.push(SqlValue::Text(domain.clone()));
            sql.push_str(&format!(" AND domain = ?{}", values.len()));
        }
        if let Some(mode) = query.mode {
            values.push(SqlValue::Text(mode.to_db_string().to_string()));
            sql.push_str(&format!(" AND mode = ?{}", values.len()));
        }
        if let Some(success) = query.success {
            values.push(SqlValue::Integer(success as i64));
            sql.push_str(&format!(" AND success = ?{}", values.len()));
        }
        if let Some(since) = query.since {
            values.push(SqlValue::Text(format_timestamp(since)));
            sql.push_str(&format!(" AND timestamp >= ?{}", values.len()));
        }
        if let Some(until) = query.until {
            values.push(SqlValue::Text(format_timestamp(until)));
            sql.push_str(&format!(" AND timestamp < ?{}", values.len()));
        }

        sql.push_str(" ORDER BY timestamp DESC, id DESC");

        if let Some(limit) = query.limit {
            values.push(SqlValue::Integer(limit as i64));
            sql.push_str(&format!(" LIMIT ?{}", values.len()));
        }

        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let runs = stmt
            .query_map(params_from_iter(values.iter()), row_to_run)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(runs)
    }

    async fn find_run(
        &self,
        url: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<Option<RunRecord>> {
        let conn = self.conn()?;
        let run = conn
            .query_row(
                &format!(
                    "SELECT {} FROM runs WHERE url = ?1 AND timestamp = ?2 ORDER BY id DESC LIMIT 1",
                    RUN_COLUMNS
                ),
                params![url, format_timestamp(timestamp)],
                row_to_run,
            )
            .optional()?;

        Ok(run)
    }

    async fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("SELECT {} FROM runs WHERE id = ?1", RUN_COLUMNS),
            params![run_id],
            row_to_run,
        )
        .optional()?
        .ok_or(StorageError::RunNotFound(run_id))
    }

    async fn get_items(&self, run_id: i64) -> StorageResult<Vec<StoredItem>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT run_id, position, value, attributes FROM items WHERE run_id = ?1 ORDER BY position",
        )?;

        let items = stmt
            .query_map(params![run_id], |row| {
                let attributes: Option<String> = row.get(3)?;
                let attributes = attributes
                    .map(|a| serde_json::from_str(&a))
                    .transpose()
                    .map_err(|e| conversion_error(3, e))?;

                Ok(StoredItem {
                    run_id: row.get(0)?,
                    position: row.get(1)?,
                    value: row.get(2)?,
                    attributes,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(items)
    }

    async fn count_runs(&self) -> StorageResult<u64> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM runs", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{ImageItem, LinkItem};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use tempfile::TempDir;

    fn link(url: &str) -> ExtractedItem {
        ExtractedItem::Link(LinkItem {
            url: url.to_string(),
            text: Some("text".to_string()),
            external: false,
        })
    }

    fn run_at(url: &str, mode: ExtractionMode, hour: u32) -> NewRun {
        NewRun::new(url, mode, "hash")
            .with_timestamp(Utc.with_ymd_and_hms(2024, 5, 1, hour, 0, 0).unwrap())
    }

    #[tokio::test]
    async fn test_record_and_get_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let run = NewRun::new("https://example.com/", ExtractionMode::Links, "hash")
            .with_metadata("source", "test");
        let items = vec![link("https://example.com/a"), link("https://example.com/b")];

        let record = storage.record_run(&run, &items).await.unwrap();
        assert_eq!(record.item_count, 2);
        assert!(record.success);

        let loaded = storage.get_run(record.id).await.unwrap();
        assert_eq!(loaded, record);
        assert_eq!(loaded.metadata, json!({"source": "test"}));
    }

    #[tokio::test]
    async fn test_items_ordered_with_attributes() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let run = NewRun::new("https://example.com/", ExtractionMode::Images, "hash");
        let items = vec![
            ExtractedItem::Image(ImageItem {
                url: "https://example.com/1.png".to_string(),
                alt: Some("one".to_string()),
                title: None,
                width: Some(10),
                height: None,
            }),
            ExtractedItem::Image(ImageItem {
                url: "https://example.com/2.png".to_string(),
                alt: None,
                title: None,
                width: None,
                height: None,
            }),
        ];

        let record = storage.record_run(&run, &items).await.unwrap();
        let stored = storage.get_items(record.id).await.unwrap();

        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].position, 0);
        assert_eq!(stored[0].value, "https://example.com/1.png");
        assert_eq!(stored[0].attributes, Some(json!({"alt": "one", "width": 10})));
        assert_eq!(stored[1].attributes, None);
    }

    #[tokio::test]
    async fn test_record_failure() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let run = NewRun::new("https://example.com/missing", ExtractionMode::Emails, "hash");

        let record = storage.record_failure(&run, "HTTP 404").await.unwrap();
        assert!(!record.success);
        assert_eq!(record.item_count, 0);
        assert_eq!(record.error_message.as_deref(), Some("HTTP 404"));
        assert!(storage.get_items(record.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_find_run_by_url_and_timestamp() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let run = NewRun::new("https://example.com/", ExtractionMode::Links, "hash");
        let items = vec![link("https://example.com/a")];
        storage.record_run(&run, &items).await.unwrap();

        let found = storage
            .find_run("https://example.com/", run.timestamp)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.item_count, 1);
        assert_eq!(found.timestamp, run.timestamp);

        let missing = storage
            .find_run("https://example.com/", run.timestamp + Duration::seconds(1))
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_find_runs_filters_and_order() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        storage
            .record_run(&run_at("https://a.com/", ExtractionMode::Links, 1), &[])
            .await
            .unwrap();
        storage
            .record_run(&run_at("https://b.com/", ExtractionMode::Images, 2), &[])
            .await
            .unwrap();
        storage
            .record_failure(&run_at("https://a.com/", ExtractionMode::Links, 3), "boom")
            .await
            .unwrap();

        let all = storage.find_runs(&RunQuery::new()).await.unwrap();
        let hours: Vec<_> = all.iter().map(|r| r.timestamp.format("%H").to_string()).collect();
        assert_eq!(hours, vec!["03", "02", "01"]);

        let a_runs = storage.find_runs(&RunQuery::new().domain("a.com")).await.unwrap();
        assert_eq!(a_runs.len(), 2);

        let ok_links = storage
            .find_runs(&RunQuery::new().mode(ExtractionMode::Links).success(true))
            .await
            .unwrap();
        assert_eq!(ok_links.len(), 1);

        let ranged = storage
            .find_runs(
                &RunQuery::new()
                    .since(Utc.with_ymd_and_hms(2024, 5, 1, 2, 0, 0).unwrap())
                    .until(Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap()),
            )
            .await
            .unwrap();
        assert_eq!(ranged.len(), 1);
        assert_eq!(ranged[0].domain, "b.com");

        let limited = storage.find_runs(&RunQuery::new().limit(1)).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert!(!limited[0].success);
    }

    #[tokio::test]
    async fn test_get_missing_run() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let result = storage.get_run(42).await;
        assert!(matches!(result, Err(StorageError::RunNotFound(42))));
    }

    #[tokio::test]
    async fn test_delete_runs_before() {
        let storage = SqliteStorage::new_in_memory().unwrap();
        let old = storage
            .record_run(
                &run_at("https://a.com/", ExtractionMode::Links, 1),
                &[link("https://a.com/x")],
            )
            .await
            .unwrap();
        storage
            .record_run(&run_at("https://a.com/", ExtractionMode::Links, 5), &[])
            .await
            .unwrap();

        let deleted = storage
            .delete_runs_before(Utc.with_ymd_and_hms(2024, 5, 1, 3, 0, 0).unwrap())
            .await
            .unwrap();

        assert_eq!(deleted, 1);
        assert_eq!(storage.count_runs().await.unwrap(), 1);
        assert!(storage.get_items(old.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_file_database_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("runs.db");

        {
            let storage = SqliteStorage::new(&path).unwrap();
            storage.ping().await.unwrap();
            storage
                .record_run(&NewRun::new("https://a.com/", ExtractionMode::Links, "h"), &[])
                .await
                .unwrap();
        }

        let reopened = SqliteStorage::new(&path).unwrap();
        assert_eq!(reopened.count_runs().await.unwrap(), 1);
    }
}
