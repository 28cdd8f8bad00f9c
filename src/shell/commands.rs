//! Database-backed commands shared by the menu and the command line

use crate::pipeline::Coordinator;
use crate::report::{generate_report, load_statistics, print_statistics, ReportOptions};
use crate::shell::display::format_history_table;
use crate::storage::{RunQuery, Storage, StorageError};
use crate::ScraperError;
use console::style;

/// Runs listed by the history view by default
pub const DEFAULT_HISTORY_LIMIT: u32 = 20;

fn require_storage(coordinator: &Coordinator) -> Result<&dyn Storage, ScraperError> {
    coordinator.storage().ok_or_else(|| {
        ScraperError::Persistence(StorageError::Unsupported(
            "database is not available; configure it first".to_string(),
        ))
    })
}

/// Prints the most recent runs
pub async fn show_history(coordinator: &Coordinator, limit: u32) -> Result<(), ScraperError> {
    let storage = require_storage(coordinator)?;
    let runs = storage.find_runs(&RunQuery::new().limit(limit)).await?;

    if runs.is_empty() {
        println!("{}", style("No scraping history yet.").yellow());
        return Ok(());
    }

    println!("{}", style(format!("Last {} runs:", runs.len())).bold());
    print!("{}", format_history_table(&runs));
    Ok(())
}

/// Prints statistics over every stored run
pub async fn show_statistics(coordinator: &Coordinator) -> Result<(), ScraperError> {
    let storage = require_storage(coordinator)?;
    let stats = load_statistics(storage, &RunQuery::new()).await?;
    print_statistics(&stats);
    Ok(())
}

/// Writes charts and the HTML report, optionally limited to recent days
pub async fn generate_reports(
    coordinator: &Coordinator,
    days: Option<u32>,
) -> Result<(), ScraperError> {
    let storage = require_storage(coordinator)?;

    let mut options = ReportOptions::new(&coordinator.config().output.report_directory);
    if let Some(days) = days {
        options = options.last_days(days);
    }

    let artifacts = generate_report(storage, &options).await?;

    if artifacts.run_count == 0 {
        println!(
            "{}",
            style("No runs in the selected period; placeholder charts written.").yellow()
        );
    }
    println!(
        "{}",
        style(format!("✓ Report covering {} runs:", artifacts.run_count)).green()
    );
    for path in artifacts.paths() {
        println!("  {}", path.display());
    }
    Ok(())
}
