//! Database schema definitions
//!
//! Every backend uses the same two tables; only the column types differ.

/// SQLite schema, applied on every open
pub const SQLITE_SCHEMA_SQL: &str = r#"
-- One row per extraction run
CREATE TABLE IF NOT EXISTS runs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    url TEXT NOT NULL,
    domain TEXT NOT NULL,
    mode TEXT NOT NULL,
    timestamp TEXT NOT NULL,
    item_count INTEGER NOT NULL DEFAULT 0 CHECK (item_count >= 0),
    success INTEGER NOT NULL,
    error_message TEXT,
    metadata TEXT NOT NULL DEFAULT '{}',
    config_hash TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_runs_url ON runs(url);
CREATE INDEX IF NOT EXISTS idx_runs_domain ON runs(domain);
CREATE INDEX IF NOT EXISTS idx_runs_mode ON runs(mode);
CREATE INDEX IF NOT EXISTS idx_runs_timestamp ON runs(timestamp);

-- Extracted values, ordered by position within their run
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    run_id INTEGER NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    value TEXT NOT NULL,
    attributes TEXT,
    UNIQUE(run_id, position)
);

CREATE INDEX IF NOT EXISTS idx_items_run ON items(run_id);
"#;

/// PostgreSQL schema, one statement per entry
pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS runs (
        id BIGSERIAL PRIMARY KEY,
        url TEXT NOT NULL,
        domain TEXT NOT NULL,
        mode TEXT NOT NULL,
        timestamp TIMESTAMPTZ NOT NULL,
        item_count BIGINT NOT NULL DEFAULT 0 CHECK (item_count >= 0),
        success BOOLEAN NOT NULL,
        error_message TEXT,
        metadata JSONB NOT NULL DEFAULT '{}'::jsonb,
        config_hash TEXT NOT NULL
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_runs_url ON runs(url)",
    "CREATE INDEX IF NOT EXISTS idx_runs_domain ON runs(domain)",
    "CREATE INDEX IF NOT EXISTS idx_runs_mode ON runs(mode)",
    "CREATE INDEX IF NOT EXISTS idx_runs_timestamp ON runs(timestamp)",
    r#"CREATE TABLE IF NOT EXISTS items (
        id BIGSERIAL PRIMARY KEY,
        run_id BIGINT NOT NULL REFERENCES runs(id) ON DELETE CASCADE,
        position INTEGER NOT NULL,
        value TEXT NOT NULL,
        attributes JSONB,
        UNIQUE(run_id, position)
    )"#,
    "CREATE INDEX IF NOT EXISTS idx_items_run ON items(run_id)",
];

/// MySQL schema, one statement per entry
///
/// MySQL has no `CREATE INDEX IF NOT EXISTS`, so indexes are declared inline.
/// `url` is indexed on a prefix since the column is unbounded text.
pub const MYSQL_SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS runs (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        url TEXT NOT NULL,
        domain VARCHAR(255) NOT NULL,
        mode VARCHAR(16) NOT NULL,
        timestamp DATETIME(6) NOT NULL,
        item_count BIGINT NOT NULL DEFAULT 0 CHECK (item_count >= 0),
        success BOOLEAN NOT NULL,
        error_message TEXT,
        metadata JSON NOT NULL,
        config_hash VARCHAR(64) NOT NULL,
        INDEX idx_runs_url (url(255)),
        INDEX idx_runs_domain (domain),
        INDEX idx_runs_mode (mode),
        INDEX idx_runs_timestamp (timestamp)
    ) ENGINE = InnoDB DEFAULT CHARSET = utf8mb4"#,
    r#"CREATE TABLE IF NOT EXISTS items (
        id BIGINT NOT NULL AUTO_INCREMENT PRIMARY KEY,
        run_id BIGINT NOT NULL,
        position INT NOT NULL,
        value TEXT NOT NULL,
        attributes JSON,
        UNIQUE KEY uq_items_run_position (run_id, position),
        CONSTRAINT fk_items_run FOREIGN KEY (run_id) REFERENCES runs(id) ON DELETE CASCADE
    ) ENGINE = InnoDB DEFAULT CHARSET = utf8mb4"#,
];

/// Initializes the SQLite schema
pub fn initialize_sqlite_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SQLITE_SCHEMA_SQL)?;
    Ok(())
}

/// Initializes the PostgreSQL schema
pub async fn initialize_postgres_schema(pool: &sqlx::PgPool) -> Result<(), sqlx::Error> {
    for statement in POSTGRES_SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

/// Initializes the MySQL schema
pub async fn initialize_mysql_schema(pool: &sqlx::MySqlPool) -> Result<(), sqlx::Error> {
    for statement in MYSQL_SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}
