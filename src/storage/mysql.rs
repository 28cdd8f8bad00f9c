//! MySQL storage implementation
//!
//! Backed by a `sqlx` connection pool; used when the configured backend is
//! `mysql`. MySQL has no `RETURNING`, so inserted runs are read back by
//! their generated id.

use crate::config::MysqlConfig;
use crate::extract::{ExtractedItem, ExtractionMode};
use crate::storage::schema::initialize_mysql_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{NewRun, RunQuery, RunRecord, StoredItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::mysql::{MySqlConnectOptions, MySqlPoolOptions, MySqlRow};
use sqlx::{MySql, MySqlConnection, MySqlPool, QueryBuilder, Row};
use std::time::Duration;

const RUN_COLUMNS: &str = "id, url, domain, mode, timestamp, item_count, success, error_message, metadata, config_hash";

/// MySQL storage backend
pub struct MysqlStorage {
    pool: MySqlPool,
}

impl MysqlStorage {
    /// Connects to the server and creates the schema if needed
    pub async fn connect(config: &MysqlConfig) -> StorageResult<Self> {
        tracing::info!(
            "Connecting to MySQL at {}:{}/{}",
            config.host,
            config.port,
            config.database
        );

        let pool = MySqlPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect_options(config))
            .await?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, creating the schema if needed
    pub async fn from_pool(pool: MySqlPool) -> StorageResult<Self> {
        initialize_mysql_schema(&pool).await?;
        Ok(Self { pool })
    }
}

/// Builds connection options from the configured parameters
pub fn connect_options(config: &MysqlConfig) -> MySqlConnectOptions {
    let options = MySqlConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.user)
        .database(&config.database);

    if config.password.is_empty() {
        options
    } else {
        options.password(&config.password)
    }
}

fn row_to_run(row: &MySqlRow) -> StorageResult<RunRecord> {
    let mode_str: String = row.try_get("mode")?;
    let mode = ExtractionMode::from_db_string(&mode_str)
        .ok_or_else(|| StorageError::Serialization(format!("unknown mode '{}'", mode_str)))?;

    Ok(RunRecord {
        id: row.try_get("id")?,
        url: row.try_get("url")?,
        domain: row.try_get("domain")?,
        mode,
        timestamp: row.try_get("timestamp")?,
        item_count: row.try_get::<i64, _>("item_count")?.max(0) as u64,
        success: row.try_get("success")?,
        error_message: row.try_get("error_message")?,
        metadata: row.try_get("metadata")?,
        config_hash: row.try_get("config_hash")?,
    })
}

/// Inserts a run row and reads it back
async fn insert_run(
    conn: &mut MySqlConnection,
    run: &NewRun,
    item_count: usize,
    error_message: Option<&str>,
) -> StorageResult<RunRecord> {
    let result = sqlx::query(
        "INSERT INTO runs (url, domain, mode, timestamp, item_count, success, error_message, metadata, config_hash)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(&run.url)
    .bind(&run.domain)
    .bind(run.mode.to_db_string())
    .bind(run.timestamp)
    .bind(item_count as i64)
    .bind(error_message.is_none())
    .bind(error_message)
    .bind(&run.metadata)
    .bind(&run.config_hash)
    .execute(&mut *conn)
    .await?;

    let id = i64::try_from(result.last_insert_id())
        .map_err(|_| StorageError::Database("generated run id out of range".to_string()))?;

    let row = sqlx::query(&format!("SELECT {} FROM runs WHERE id = ?", RUN_COLUMNS))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;
    row_to_run(&row)
}

#[async_trait]
impl Storage for MysqlStorage {
    fn backend_name(&self) -> &'static str {
        "mysql"
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn record_run(&self, run: &NewRun, items: &[ExtractedItem]) -> StorageResult<RunRecord> {
        let mut tx = self.pool.begin().await?;

        let record = insert_run(&mut *tx, run, items.len(), None).await?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query("INSERT INTO items (run_id, position, value, attributes) VALUES (?, ?, ?, ?)")
                .bind(record.id)
                .bind(position as i32)
                .bind(item.value())
                .bind(item.attributes())
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        tracing::debug!("Recorded run {} with {} items", record.id, record.item_count);
        Ok(record)
    }

    async fn record_failure(&self, run: &NewRun, error_message: &str) -> StorageResult<RunRecord> {
        let mut conn = self.pool.acquire().await?;
        let record = insert_run(&mut *conn, run, 0, Some(error_message)).await?;

        tracing::debug!("Recorded failed run {}", record.id);
        Ok(record)
    }

    async fn delete_runs_before(&self, before: DateTime<Utc>) -> StorageResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM items WHERE run_id IN (SELECT id FROM runs WHERE timestamp < ?)")
            .bind(before)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM runs WHERE timestamp < ?")
            .bind(before)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn find_runs(&self, query: &RunQuery) -> StorageResult<Vec<RunRecord>> {
        let mut qb: QueryBuilder<MySql> =
            QueryBuilder::new(format!("SELECT {} FROM runs WHERE TRUE", RUN_COLUMNS));

        if let Some(url) = &query.url {
            qb.push(" AND url = ").push_bind(url.clone());
        }
        if let Some(domain) = &query.domain {
            qb.push(" AND domain = ").push_bind(domain.clone());
        }
        if let Some(mode) = query.mode {
            qb.push(" AND mode = ").push_bind(mode.to_db_string());
        }
        if let Some(success) = query.success {
            qb.push(" AND success = ").push_bind(success);
        }
        if let Some(since) = query.since {
            qb.push(" AND timestamp >= ").push_bind(since);
        }
        if let Some(until) = query.until {
            qb.push(" AND timestamp < ").push_bind(until);
        }

        qb.push(" ORDER BY timestamp DESC, id DESC");

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ").push_bind(i64::from(limit));
        }

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_run).collect()
    }

    async fn find_run(
        &self,
        url: &str,
        timestamp: DateTime<Utc>,
    ) -> StorageResult<Option<RunRecord>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM runs WHERE url = ? AND timestamp = ? ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))
        .bind(url)
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_run).transpose()
    }

    async fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let row = sqlx::query(&format!("SELECT {} FROM runs WHERE id = ?", RUN_COLUMNS))
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::RunNotFound(run_id))?;

        row_to_run(&row)
    }

    async fn get_items(&self, run_id: i64) -> StorageResult<Vec<StoredItem>> {
        let rows = sqlx::query(
            "SELECT run_id, position, value, attributes FROM items WHERE run_id = ? ORDER BY position",
        )
        .bind(run_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> StorageResult<StoredItem> {
                Ok(StoredItem {
                    run_id: row.try_get("run_id")?,
                    position: row.try_get::<i32, _>("position")?.max(0) as u32,
                    value: row.try_get("value")?,
                    attributes: row.try_get::<Option<Value>, _>("attributes")?,
                })
            })
            .collect()
    }

    async fn count_runs(&self) -> StorageResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM runs")
            .fetch_one(&self.pool)
            .await?;
        Ok(count.max(0) as u64)
    }
}
