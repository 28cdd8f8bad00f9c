//! PostgreSQL storage implementation
//!
//! Backed by a `sqlx` connection pool; used when the configured backend is
//! `postgres`.

use crate::config::PostgresConfig;
use crate::extract::{ExtractedItem, ExtractionMode};
use crate::storage::schema::initialize_postgres_schema;
use crate::storage::traits::{Storage, StorageError, StorageResult};
use crate::storage::{NewRun, RunQuery, RunRecord, StoredItem};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgRow};
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use std::time::Duration;

const RUN_COLUMNS: &str = "id, url, domain, mode, timestamp, item_count, success, error_message, metadata, config_hash";

/// PostgreSQL storage backend
pub struct PostgresStorage {
    pool: PgPool,
}

impl PostgresStorage {
    /// Connects to the server and creates the schema if needed
    pub async fn connect(config: &PostgresConfig) -> StorageResult<Self> {
        tracing::info!(
            "Connecting to PostgreSQL at {}:{}/{}",
            config.host,
            config.port,
            config.database
        );

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(connect_options(config))
            .await?;

        Self::from_pool(pool).await
    }

    /// Wraps an existing pool, creating the schema if needed
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        initialize_postgres_schema(&pool).await?;
        Ok(Self { pool })
    }
}

/// Builds connection options from the configured parameters
///
/// Credentials are passed as fields, so they need no URL escaping.
pub fn connect_options(config: &PostgresConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
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

fn row_to_run(row: &PgRow) -> StorageResult<RunRecord> {
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

#[async_trait]
impl Storage for PostgresStorage {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn record_run(&self, run: &NewRun, items: &[ExtractedItem]) -> StorageResult<RunRecord> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(&format!(
            "INSERT INTO runs (url, domain, mode, timestamp, item_count, success, error_message, metadata, config_hash)
             VALUES ($1, $2, $3, $4, $5, TRUE, NULL, $6, $7)
             RETURNING {}",
            RUN_COLUMNS
        ))
        .bind(&run.url)
        .bind(&run.domain)
        .bind(run.mode.to_db_string())
        .bind(run.timestamp)
        .bind(items.len() as i64)
        .bind(&run.metadata)
        .bind(&run.config_hash)
        .fetch_one(&mut *tx)
        .await?;
        let record = row_to_run(&row)?;

        for (position, item) in items.iter().enumerate() {
            sqlx::query(
                "INSERT INTO items (run_id, position, value, attributes) VALUES ($1, $2, $3, $4)",
            )
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
        let row = sqlx::query(&format!(
            "INSERT INTO runs (url, domain, mode, timestamp, item_count, success, error_message, metadata, config_hash)
             VALUES ($1, $2, $3, $4, 0, FALSE, $5, $6, $7)
             RETURNING {}",
            RUN_COLUMNS
        ))
        .bind(&run.url)
        .bind(&run.domain)
        .bind(run.mode.to_db_string())
        .bind(run.timestamp)
        .bind(error_message)
        .bind(&run.metadata)
        .bind(&run.config_hash)
        .fetch_one(&self.pool)
        .await?;

        let record = row_to_run(&row)?;
        tracing::debug!("Recorded failed run {}", record.id);
        Ok(record)
    }

    async fn delete_runs_before(&self, before: DateTime<Utc>) -> StorageResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM items WHERE run_id IN (SELECT id FROM runs WHERE timestamp < $1)")
            .bind(before)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM runs WHERE timestamp < $1")
            .bind(before)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(result.rows_affected())
    }

    async fn find_runs(&self, query: &RunQuery) -> StorageResult<Vec<RunRecord>> {
        let mut qb: QueryBuilder<Postgres> =
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
            qb.push(" LIMIT ").push_bind(limit as i64);
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
            "SELECT {} FROM runs WHERE url = $1 AND timestamp = $2 ORDER BY id DESC LIMIT 1",
            RUN_COLUMNS
        ))
        .bind(url)
        .bind(timestamp)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(row_to_run).transpose()
    }

    async fn get_run(&self, run_id: i64) -> StorageResult<RunRecord> {
        let row = sqlx::query(&format!("SELECT {} FROM runs WHERE id = $1", RUN_COLUMNS))
            .bind(run_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StorageError::RunNotFound(run_id))?;

        row_to_run(&row)
    }

    async fn get_items(&self, run_id: i64) -> StorageResult<Vec<StoredItem>> {
        let rows = sqlx::query(
            "SELECT run_id, position, value, attributes FROM items WHERE run_id = $1 ORDER BY position",
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
        Ok(count as u64)
    }
}
