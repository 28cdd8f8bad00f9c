//! Statistics and chart reports over persisted runs
//!
//! This module handles:
//! - Aggregating stored runs into statistics snapshots
//! - Rendering SVG charts (domains, timeline, success rate, volume)
//! - Writing a combined HTML report

pub mod charts;
mod html;
pub mod stats;

pub use html::render_html_report;
pub use stats::{load_statistics, print_statistics, RunCounts, StatisticsSnapshot};

use crate::storage::{RunQuery, Storage, StorageError};
use chrono::{DateTime, Duration, Utc};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur while generating reports
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to load runs: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to render {chart}: {message}")]
    Render { chart: String, message: String },
}

/// Result type for report operations
pub type ReportResult<T> = Result<T, ReportError>;

pub const DOMAIN_CHART_FILE: &str = "domain_distribution.svg";
pub const TIMELINE_CHART_FILE: &str = "timeline.svg";
pub const SUCCESS_CHART_FILE: &str = "success_rate.svg";
pub const VOLUME_CHART_FILE: &str = "volume.svg";
pub const HTML_REPORT_FILE: &str = "report.html";

/// Number of newest runs listed in the activity table
pub const RECENT_RUNS: usize = 10;

/// Where and over which period a report is generated
#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub output_dir: PathBuf,
    /// Inclusive lower bound
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound
    pub until: Option<DateTime<Utc>>,
}

impl ReportOptions {
    /// Report over all stored runs
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            since: None,
            until: None,
        }
    }

    /// Restricts the report to the last `days` days
    pub fn last_days(mut self, days: u32) -> Self {
        self.since = Some(Utc::now() - Duration::days(i64::from(days)));
        self
    }

    /// Human-readable description of the period
    pub fn period_label(&self) -> String {
        let fmt = |ts: &DateTime<Utc>| ts.format("%Y-%m-%d %H:%M UTC").to_string();
        match (&self.since, &self.until) {
            (None, None) => "All recorded runs".to_string(),
            (Some(since), None) => format!("Since {}", fmt(since)),
            (None, Some(until)) => format!("Before {}", fmt(until)),
            (Some(since), Some(until)) => format!("{} to {}", fmt(since), fmt(until)),
        }
    }

    fn query(&self) -> RunQuery {
        RunQuery {
            since: self.since,
            until: self.until,
            ..RunQuery::default()
        }
    }
}

/// Paths of everything a report run wrote
#[derive(Debug, Clone)]
pub struct ReportArtifacts {
    pub domain_chart: PathBuf,
    pub timeline_chart: PathBuf,
    pub success_chart: PathBuf,
    pub volume_chart: PathBuf,
    pub html_report: PathBuf,
    /// Number of runs the report covers
    pub run_count: usize,
}

impl ReportArtifacts {
    pub fn paths(&self) -> Vec<&Path> {
        vec![
            &self.domain_chart,
            &self.timeline_chart,
            &self.success_chart,
            &self.volume_chart,
            &self.html_report,
        ]
    }
}

/// Generates all charts and the HTML report for the selected period
///
/// An empty period is not an error: every chart is replaced by a
/// placeholder and the report says there is nothing to show.
pub async fn generate_report(
    storage: &dyn Storage,
    options: &ReportOptions,
) -> ReportResult<ReportArtifacts> {
    let runs = storage.find_runs(&options.query()).await?;
    let snapshot = StatisticsSnapshot::from_runs(&runs);

    tracing::info!(
        "Generating report for {} runs into {}",
        runs.len(),
        options.output_dir.display()
    );

    std::fs::create_dir_all(&options.output_dir)?;
    let write = |name: &str, content: &str| -> ReportResult<PathBuf> {
        let path = options.output_dir.join(name);
        std::fs::write(&path, content)?;
        tracing::debug!("Wrote {}", path.display());
        Ok(path)
    };

    let domain_chart = write(DOMAIN_CHART_FILE, &charts::domain_chart(&snapshot)?)?;
    let timeline_chart = write(TIMELINE_CHART_FILE, &charts::timeline_chart(&snapshot)?)?;
    let success_chart = write(SUCCESS_CHART_FILE, &charts::success_rate_chart(&snapshot)?)?;
    let volume_chart = write(VOLUME_CHART_FILE, &charts::volume_chart(&snapshot)?)?;

    let recent: Vec<_> = runs.iter().take(RECENT_RUNS).cloned().collect();
    let html = render_html_report(&snapshot, &recent, &options.period_label(), Utc::now());
    let html_report = write(HTML_REPORT_FILE, &html)?;

    Ok(ReportArtifacts {
        domain_chart,
        timeline_chart,
        success_chart,
        volume_chart,
        html_report,
        run_count: runs.len(),
    })
}

/// Escapes text for inclusion in HTML or SVG
pub(crate) fn escape_markup(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}
