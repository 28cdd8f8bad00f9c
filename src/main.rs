//! Web Scraper main entry point
//!
//! Starts the interactive menu, or runs one of the database commands and
//! exits when a command flag is given.

use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use web_scraper::config::{load_config_with_hash, Config};
use web_scraper::shell::{generate_reports, show_history, show_statistics, Shell};
use web_scraper::Coordinator;

/// Web Scraper: extract elements, links, images and emails from web pages
///
/// Without a command flag an interactive menu is started. Results can be
/// exported to JSON or sitemap XML and saved to SQLite, PostgreSQL or MySQL.
#[derive(Parser, Debug)]
#[command(name = "web-scraper")]
#[command(version = "1.0.0")]
#[command(about = "Single-page web scraping utility", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (default: web-scraper.toml if present)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error log output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Show the effective configuration and exit
    #[arg(long, conflicts_with_all = ["stats", "history", "report", "purge_days"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["history", "report", "purge_days"])]
    stats: bool,

    /// Show the N most recent runs and exit
    #[arg(long, value_name = "N", num_args = 0..=1, default_missing_value = "20")]
    history: Option<u32>,

    /// Generate charts and the HTML report and exit
    #[arg(long, conflicts_with_all = ["history", "purge_days"])]
    report: bool,

    /// Limit the report to the last N days
    #[arg(long, value_name = "N", requires = "report")]
    days: Option<u32>,

    /// Delete runs older than N days and exit
    #[arg(long, value_name = "N", conflicts_with = "history")]
    purge_days: Option<u32>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = load_config_with_hash(cli.config.as_deref())
        .context("Failed to load configuration")?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    if cli.dry_run {
        print_config(&config);
        return Ok(());
    }

    let coordinator = Coordinator::from_config(config)
        .await
        .context("Failed to initialize")?;

    if cli.stats {
        show_statistics(&coordinator).await?;
    } else if let Some(limit) = cli.history {
        show_history(&coordinator, limit).await?;
    } else if cli.report {
        generate_reports(&coordinator, cli.days).await?;
    } else if let Some(days) = cli.purge_days {
        purge(&coordinator, days).await?;
    } else {
        Shell::new(coordinator).run().await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so they do not interleave with menu output.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("web_scraper=info,warn"),
            1 => EnvFilter::new("web_scraper=debug,info"),
            2 => EnvFilter::new("web_scraper=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles --dry-run: prints the configuration that would be used
fn print_config(config: &Config) {
    println!("=== Web Scraper Configuration ===\n");

    println!("HTTP:");
    println!("  User agent: {}", config.http.user_agent);
    println!("  Timeout: {}s", config.http.timeout_secs);
    println!("  Connect timeout: {}s", config.http.connect_timeout_secs);

    println!("\nDatabase:");
    println!("  Enabled: {}", config.database.enabled);
    println!("  Backend: {}", config.database.backend.as_str());
    println!("  SQLite path: {}", config.database.sqlite_path.display());
    let pg = &config.database.postgres;
    println!(
        "  PostgreSQL: {}@{}:{}/{}",
        pg.user, pg.host, pg.port, pg.database
    );
    let mysql = &config.database.mysql;
    println!(
        "  MySQL: {}@{}:{}/{}",
        mysql.user, mysql.host, mysql.port, mysql.database
    );

    println!("\nOutput:");
    println!("  Export directory: {}", config.output.directory.display());
    println!(
        "  Report directory: {}",
        config.output.report_directory.display()
    );
}

/// Handles --purge-days: removes old runs
async fn purge(coordinator: &Coordinator, days: u32) -> Result<()> {
    let storage = coordinator
        .storage()
        .context("Database not available; nothing to purge")?;

    let cutoff = Utc::now() - Duration::days(i64::from(days));
    let deleted = storage
        .delete_runs_before(cutoff)
        .await
        .context("Failed to purge runs")?;

    println!(
        "Deleted {} runs recorded before {}",
        deleted,
        cutoff.format("%Y-%m-%d %H:%M UTC")
    );
    Ok(())
}
