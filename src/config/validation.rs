use crate::config::types::{Config, DatabaseBackend, DatabaseConfig, HttpConfig, OutputConfig};
use crate::ConfigError;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_http_config(&config.http)?;
    validate_database_config(&config.database)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates the outbound session settings
fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    // Header values must be visible ASCII or spaces
    if config
        .user_agent
        .chars()
        .any(|c| c.is_control() || !c.is_ascii())
    {
        return Err(ConfigError::Validation(format!(
            "user-agent contains characters not allowed in a header: '{}'",
            config.user_agent
        )));
    }

    if config.timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be >= 1, got {}",
            config.timeout_secs
        )));
    }

    if config.connect_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "connect-timeout-secs must be >= 1, got {}",
            config.connect_timeout_secs
        )));
    }

    Ok(())
}

/// Validates the persistence settings for the selected backend
fn validate_database_config(config: &DatabaseConfig) -> Result<(), ConfigError> {
    match config.backend {
        DatabaseBackend::Sqlite => {
            if config.sqlite_path.as_os_str().is_empty() {
                return Err(ConfigError::Validation(
                    "sqlite-path cannot be empty".to_string(),
                ));
            }
        }
        DatabaseBackend::Postgres => {
            let pg = &config.postgres;
            validate_server("postgres", &pg.host, pg.port, &pg.database)?;
        }
        DatabaseBackend::Mysql => {
            let mysql = &config.mysql;
            validate_server("mysql", &mysql.host, mysql.port, &mysql.database)?;
        }
    }

    Ok(())
}

/// Checks the connection parameters shared by the server backends
fn validate_server(backend: &str, host: &str, port: u16, database: &str) -> Result<(), ConfigError> {
    if host.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} host cannot be empty",
            backend
        )));
    }
    if port == 0 {
        return Err(ConfigError::Validation(format!(
            "{} port cannot be 0",
            backend
        )));
    }
    if database.is_empty() {
        return Err(ConfigError::Validation(format!(
            "{} database name cannot be empty",
            backend
        )));
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    if config.report_directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "report-directory cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_empty_user_agent_rejected() {
        let mut config = Config::default();
        config.http.user_agent = "   ".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_user_agent_with_newline_rejected() {
        let mut config = Config::default();
        config.http.user_agent = "Bot/1.0\r\nX-Injected: 1".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = Config::default();
        config.http.timeout_secs = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_empty_sqlite_path_rejected() {
        let mut config = Config::default();
        config.database.sqlite_path = PathBuf::new();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_postgres_requires_host_and_port() {
        let mut config = Config::default();
        config.database.backend = DatabaseBackend::Postgres;
        assert!(validate(&config).is_ok());

        config.database.postgres.port = 0;
        assert!(validate(&config).is_err());

        config.database.postgres.port = 5432;
        config.database.postgres.host.clear();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_mysql_requires_database_name() {
        let mut config = Config::default();
        config.database.backend = DatabaseBackend::Mysql;
        assert!(validate(&config).is_ok());

        config.database.mysql.database.clear();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("mysql database name"));

        // Postgres settings are not checked for the mysql backend
        config.database.mysql.database = "web_scraper".to_string();
        config.database.postgres.port = 0;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_sqlite_path_ignored_for_postgres() {
        let mut config = Config::default();
        config.database.backend = DatabaseBackend::Postgres;
        config.database.sqlite_path = PathBuf::new();
        assert!(validate(&config).is_ok());
    }
}
