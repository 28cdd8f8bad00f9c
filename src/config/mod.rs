//! Configuration module
//!
//! This module handles loading the optional TOML configuration file,
//! applying environment overrides, and validating the result.
//!
//! # Example
//!
//! ```no_run
//! use web_scraper::config::resolve_config;
//!
//! let config = resolve_config(None).unwrap();
//! println!("Persisting to: {}", config.database.backend.as_str());
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, DatabaseBackend, DatabaseConfig, HttpConfig, MysqlConfig, OutputConfig, PostgresConfig,
    DEFAULT_USER_AGENT,
};

// Re-export parser functions
pub use parser::{
    apply_env_overrides, compute_config_hash, load_config, load_config_with_hash,
    resolve_config, DEFAULT_CONFIG_FILE,
};
pub use validation::validate;
