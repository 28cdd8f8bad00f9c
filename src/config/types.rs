use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Default identification header, matching a mainstream desktop browser
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/58.0.3029.110 Safari/537.3";

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub database: DatabaseConfig,
    pub output: OutputConfig,
}

/// Outbound HTTP session configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Value of the `User-Agent` header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Overall request timeout (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Connection establishment timeout (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout_secs: 30,
            connect_timeout_secs: 10,
        }
    }
}

/// Which relational store persists extraction runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// Embedded file database
    #[default]
    Sqlite,
    /// PostgreSQL server
    #[serde(alias = "postgresql")]
    Postgres,
    /// MySQL server
    Mysql,
}

impl DatabaseBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Postgres => "postgres",
            Self::Mysql => "mysql",
        }
    }
}

impl FromStr for DatabaseBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Self::Sqlite),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "mysql" => Ok(Self::Mysql),
            other => Err(format!("unsupported database backend '{}'", other)),
        }
    }
}

/// Persistence configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Whether runs are persisted at all
    pub enabled: bool,

    pub backend: DatabaseBackend,

    /// Path to the SQLite database file
    #[serde(rename = "sqlite-path")]
    pub sqlite_path: PathBuf,

    pub postgres: PostgresConfig,

    pub mysql: MysqlConfig,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            backend: DatabaseBackend::Sqlite,
            sqlite_path: PathBuf::from("data/web_scraper.db"),
            postgres: PostgresConfig::default(),
            mysql: MysqlConfig::default(),
        }
    }
}

/// PostgreSQL connection parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostgresConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for PostgresConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user: "postgres".to_string(),
            password: String::new(),
            database: "web_scraper".to_string(),
        }
    }
}

/// MySQL connection parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MysqlConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for MysqlConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 3306,
            user: "root".to_string(),
            password: String::new(),
            database: "web_scraper".to_string(),
        }
    }
}

/// Output file locations
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory JSON and sitemap exports are written to
    pub directory: PathBuf,

    /// Directory charts and the HTML report are written to
    #[serde(rename = "report-directory")]
    pub report_directory: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            report_directory: PathBuf::from("visualizations"),
        }
    }
}
