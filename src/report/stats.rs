//! Statistics generation from stored runs
//!
//! This module provides functionality for aggregating persisted runs and
//! displaying the result.

use crate::extract::ExtractionMode;
use crate::storage::{RunQuery, RunRecord, Storage, StorageError};
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::{BTreeMap, HashMap};

/// Number of distinct error messages kept in a snapshot
const TOP_ERRORS: usize = 5;

/// Run and item counters for one group of runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub runs: u64,
    pub successes: u64,
    pub items: u64,
}

impl RunCounts {
    fn add(&mut self, run: &RunRecord) {
        self.runs += 1;
        if run.success {
            self.successes += 1;
            self.items += run.item_count;
        }
    }

    pub fn failures(&self) -> u64 {
        self.runs - self.successes
    }

    /// Success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.runs == 0 {
            return 0.0;
        }
        (self.successes as f64 / self.runs as f64) * 100.0
    }
}

/// Aggregate view of a set of runs
#[derive(Debug, Clone, Default)]
pub struct StatisticsSnapshot {
    /// Totals over every run
    pub totals: RunCounts,

    pub by_domain: BTreeMap<String, RunCounts>,

    pub by_mode: BTreeMap<ExtractionMode, RunCounts>,

    /// Runs per UTC day, split by mode
    pub by_date: BTreeMap<NaiveDate, BTreeMap<ExtractionMode, u64>>,

    /// Most common error messages with their counts, most frequent first
    pub top_errors: Vec<(String, u64)>,

    pub first_run: Option<DateTime<Utc>>,
    pub last_run: Option<DateTime<Utc>>,
}

impl StatisticsSnapshot {
    /// Aggregates a list of runs
    pub fn from_runs(runs: &[RunRecord]) -> Self {
        let mut snapshot = Self::default();
        let mut errors: HashMap<&str, u64> = HashMap::new();

        for run in runs {
            snapshot.totals.add(run);
            snapshot
                .by_domain
                .entry(run.domain.clone())
                .or_default()
                .add(run);
            snapshot.by_mode.entry(run.mode).or_default().add(run);
            *snapshot
                .by_date
                .entry(run.timestamp.date_naive())
                .or_default()
                .entry(run.mode)
                .or_default() += 1;

            if let Some(message) = run.error_message.as_deref() {
                *errors.entry(message).or_default() += 1;
            }

            snapshot.first_run = Some(match snapshot.first_run {
                Some(first) => first.min(run.timestamp),
                None => run.timestamp,
            });
            snapshot.last_run = Some(match snapshot.last_run {
                Some(last) => last.max(run.timestamp),
                None => run.timestamp,
            });
        }

        let mut top_errors: Vec<(String, u64)> = errors
            .into_iter()
            .map(|(message, count)| (message.to_string(), count))
            .collect();
        top_errors.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        top_errors.truncate(TOP_ERRORS);
        snapshot.top_errors = top_errors;

        snapshot
    }

    pub fn is_empty(&self) -> bool {
        self.totals.runs == 0
    }

    /// Overall success rate as a percentage
    pub fn success_rate(&self) -> f64 {
        self.totals.success_rate()
    }

    /// Average items per successful run
    pub fn average_items(&self) -> f64 {
        if self.totals.successes == 0 {
            return 0.0;
        }
        self.totals.items as f64 / self.totals.successes as f64
    }

    /// The `n` domains with the most runs, ties broken by name
    pub fn top_domains(&self, n: usize) -> Vec<(&str, RunCounts)> {
        let mut domains: Vec<_> = self
            .by_domain
            .iter()
            .map(|(domain, counts)| (domain.as_str(), *counts))
            .collect();
        domains.sort_by(|a, b| b.1.runs.cmp(&a.1.runs).then_with(|| a.0.cmp(b.0)));
        domains.truncate(n);
        domains
    }

    /// Runs per UTC day over all modes
    pub fn daily_totals(&self) -> BTreeMap<NaiveDate, u64> {
        self.by_date
            .iter()
            .map(|(date, modes)| (*date, modes.values().sum()))
            .collect()
    }
}

/// Loads the runs matching `query` and aggregates them
///
/// # Returns
///
/// * `Ok(StatisticsSnapshot)` - Successfully computed statistics
/// * `Err(StorageError)` - Failed to query the runs
pub async fn load_statistics(
    storage: &dyn Storage,
    query: &RunQuery,
) -> Result<StatisticsSnapshot, StorageError> {
    let runs = storage.find_runs(query).await?;
    Ok(StatisticsSnapshot::from_runs(&runs))
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &StatisticsSnapshot) {
    println!("=== Scraping Statistics ===\n");

    println!("Overview:");
    println!("  Total runs: {}", stats.totals.runs);
    println!("  Successful runs: {}", stats.totals.successes);
    println!("  Failed runs: {}", stats.totals.failures());
    println!("  Success rate: {:.1}%", stats.success_rate());
    println!("  Total items extracted: {}", stats.totals.items);
    println!("  Average items per successful run: {:.1}", stats.average_items());
    if let (Some(first), Some(last)) = (stats.first_run, stats.last_run) {
        println!(
            "  Period: {} to {}",
            first.format("%Y-%m-%d %H:%M"),
            last.format("%Y-%m-%d %H:%M")
        );
    }
    println!();

    if !stats.by_mode.is_empty() {
        println!("Runs by Mode:");
        for (mode, counts) in &stats.by_mode {
            println!(
                "  {}: {} runs, {} items ({:.1}% success)",
                mode,
                counts.runs,
                counts.items,
                counts.success_rate()
            );
        }
        println!();
    }

    if !stats.by_domain.is_empty() {
        println!("Top Domains:");
        for (domain, counts) in stats.top_domains(10) {
            let name = if domain.is_empty() { "(none)" } else { domain };
            println!("  {}: {} runs", name, counts.runs);
        }
        println!();
    }

    if !stats.top_errors.is_empty() {
        println!("Most Common Errors:");
        for (message, count) in &stats.top_errors {
            println!("  {} x {}", count, message);
        }
        println!();
    }
}
