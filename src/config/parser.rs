use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Config file picked up when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "web-scraper.toml";

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use web_scraper::config::load_config;
///
/// let config = load_config(Path::new("web-scraper.toml")).unwrap();
/// println!("User agent: {}", config.http.user_agent);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Resolves the effective configuration
///
/// Starts from the given file (or `web-scraper.toml` in the working
/// directory if it exists, or built-in defaults), loads `.env`, applies
/// environment overrides and validates the result. The file must be valid
/// on its own.
pub fn resolve_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let _ = dotenvy::dotenv();

    let file = match path {
        Some(p) => Some(p.to_path_buf()),
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            default.exists().then_some(default)
        }
    };

    let mut config = match file {
        Some(p) => {
            tracing::debug!("Reading configuration file {}", p.display());
            load_config(&p)?
        }
        None => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate(&config)?;
    Ok(config)
}

/// Overlays environment-style settings onto a configuration
///
/// `lookup` returns the value for a variable name, if set. Empty values are
/// treated as unset.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

    if let Some(ua) = get("SCRAPER_USER_AGENT") {
        config.http.user_agent = ua;
    }
    if let Some(backend) = get("SCRAPER_DB_BACKEND") {
        config.database.backend = backend.parse().map_err(|_| ConfigError::InvalidEnv {
            key: "SCRAPER_DB_BACKEND".to_string(),
            value: backend.clone(),
        })?;
    }
    if let Some(path) = get("SCRAPER_SQLITE_PATH") {
        config.database.sqlite_path = PathBuf::from(path);
    }

    let pg = &mut config.database.postgres;
    if let Some(host) = get("POSTGRES_HOST") {
        pg.host = host;
    }
    if let Some(port) = get("POSTGRES_PORT") {
        pg.port = parse_port("POSTGRES_PORT", &port)?;
    }
    if let Some(user) = get("POSTGRES_USER") {
        pg.user = user;
    }
    if let Some(password) = get("POSTGRES_PASSWORD") {
        pg.password = password;
    }
    if let Some(database) = get("POSTGRES_DATABASE") {
        pg.database = database;
    }

    let mysql = &mut config.database.mysql;
    if let Some(host) = get("MYSQL_HOST") {
        mysql.host = host;
    }
    if let Some(port) = get("MYSQL_PORT") {
        mysql.port = parse_port("MYSQL_PORT", &port)?;
    }
    if let Some(user) = get("MYSQL_USER") {
        mysql.user = user;
    }
    if let Some(password) = get("MYSQL_PASSWORD") {
        mysql.password = password;
    }
    if let Some(database) = get("MYSQL_DATABASE") {
        mysql.database = database;
    }

    Ok(())
}

fn parse_port(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: value.to_string(),
    })
}

/// Computes a SHA-256 hash of the effective configuration
///
/// Stored with every persisted run so results can be traced back to the
/// settings that produced them.
pub fn compute_config_hash(config: &Config) -> String {
    let serialized = serde_json::to_string(config).unwrap_or_default();
    let mut hasher = Sha256::new();
    hasher.update(serialized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Resolves a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    let config = resolve_config(path)?;
    let hash = compute_config_hash(&config);
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseBackend;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[http]
user-agent = "TestScraper/1.0"
timeout-secs = 5

[database]
backend = "postgres"

[database.postgres]
host = "db.example.com"
port = 5433

[output]
report-directory = "./charts"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.http.user_agent, "TestScraper/1.0");
        assert_eq!(config.http.timeout_secs, 5);
        assert_eq!(config.http.connect_timeout_secs, 10);
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.database.postgres.host, "db.example.com");
        assert_eq!(config.database.postgres.port, 5433);
        assert_eq!(config.database.postgres.database, "web_scraper");
        assert_eq!(config.output.report_directory, PathBuf::from("./charts"));
    }

    #[test]
    fn test_empty_file_gives_defaults() {
        let file = create_temp_config("");
        let config = load_config(file.path()).unwrap();
        assert!(config.database.enabled);
        assert_eq!(config.database.backend, DatabaseBackend::Sqlite);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/web-scraper.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_config("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_config("[http]\ntimeout-secs = 0\n");
        let result = load_config(file.path());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_resolve_config_reads_given_file() {
        let file = create_temp_config("[output]\ndirectory = \"exports\"\n");
        let config = resolve_config(Some(file.path())).unwrap();
        assert_eq!(config.output.directory, PathBuf::from("exports"));

        let invalid = create_temp_config("[http]\nconnect-timeout-secs = 0\n");
        assert!(matches!(
            resolve_config(Some(invalid.path())),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let vars = env(&[
            ("SCRAPER_USER_AGENT", "EnvBot/2.0"),
            ("SCRAPER_DB_BACKEND", "postgresql"),
            ("POSTGRES_HOST", "pg.local"),
            ("POSTGRES_PORT", "6000"),
            ("POSTGRES_PASSWORD", ""),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.http.user_agent, "EnvBot/2.0");
        assert_eq!(config.database.backend, DatabaseBackend::Postgres);
        assert_eq!(config.database.postgres.host, "pg.local");
        assert_eq!(config.database.postgres.port, 6000);
        assert!(config.database.postgres.password.is_empty());
    }

    #[test]
    fn test_mysql_env_overrides() {
        let vars = env(&[
            ("SCRAPER_DB_BACKEND", "mysql"),
            ("MYSQL_HOST", "mysql.local"),
            ("MYSQL_PORT", "3307"),
            ("MYSQL_USER", "scraper"),
            ("MYSQL_DATABASE", "runs"),
        ]);
        let mut config = Config::default();
        apply_env_overrides(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.database.backend, DatabaseBackend::Mysql);
        assert_eq!(config.database.mysql.host, "mysql.local");
        assert_eq!(config.database.mysql.port, 3307);
        assert_eq!(config.database.mysql.user, "scraper");
        assert_eq!(config.database.mysql.database, "runs");
        assert_eq!(config.database.postgres.host, "localhost");
    }

    #[test]
    fn test_load_mysql_section() {
        let file = create_temp_config(
            "[database]\nbackend = \"mysql\"\n\n[database.mysql]\nhost = \"db\"\npassword = \"p@ss:w/rd\"\n",
        );
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.database.backend, DatabaseBackend::Mysql);
        assert_eq!(config.database.mysql.host, "db");
        assert_eq!(config.database.mysql.port, 3306);
        assert_eq!(config.database.mysql.password, "p@ss:w/rd");
    }

    #[test]
    fn test_env_override_bad_port() {
        let vars = env(&[("POSTGRES_PORT", "not-a-port")]);
        let mut config = Config::default();
        let result = apply_env_overrides(&mut config, |k| vars.get(k).cloned());
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));

        let vars = env(&[("MYSQL_PORT", "70000")]);
        let result = apply_env_overrides(&mut config, |k| vars.get(k).cloned());
        assert!(matches!(result, Err(ConfigError::InvalidEnv { key, .. }) if key == "MYSQL_PORT"));
    }

    #[test]
    fn test_env_override_bad_backend() {
        let vars = env(&[("SCRAPER_DB_BACKEND", "mongodb")]);
        let mut config = Config::default();
        assert!(apply_env_overrides(&mut config, |k| vars.get(k).cloned()).is_err());
    }

    #[test]
    fn test_compute_config_hash() {
        let config = Config::default();
        let hash1 = compute_config_hash(&config);
        let hash2 = compute_config_hash(&config);

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_config_different_hash() {
        let a = Config::default();
        let mut b = Config::default();
        b.http.user_agent = "Other/1.0".to_string();

        assert_ne!(compute_config_hash(&a), compute_config_hash(&b));
    }
}
