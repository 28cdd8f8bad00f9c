//! HTML report generation
//!
//! Builds a single self-contained page combining summary figures, tables and
//! the SVG charts written next to it.

use crate::report::stats::StatisticsSnapshot;
use crate::report::{
    escape_markup, DOMAIN_CHART_FILE, SUCCESS_CHART_FILE, TIMELINE_CHART_FILE, VOLUME_CHART_FILE,
};
use crate::storage::RunRecord;
use chrono::{DateTime, Utc};

const STYLE: &str = r#"
body { font-family: Helvetica, Arial, sans-serif; margin: 2em auto; max-width: 1000px; color: #222; }
h1 { border-bottom: 2px solid #4e79a7; padding-bottom: .3em; }
.cards { display: flex; flex-wrap: wrap; gap: 1em; }
.card { flex: 1 1 150px; background: #f4f6f9; border-radius: 6px; padding: 1em; }
.card .value { font-size: 1.8em; font-weight: bold; }
.card .label { color: #666; }
table { border-collapse: collapse; width: 100%; margin-bottom: 1.5em; }
th, td { border: 1px solid #ddd; padding: .4em .6em; text-align: left; }
th { background: #f4f6f9; }
.ok { color: #2e7d32; }
.failed { color: #c62828; }
.chart { margin: 1em 0; max-width: 100%; }
.empty { color: #777; font-style: italic; }
"#;

/// Renders the report page
///
/// `recent` should be the newest runs, newest first.
pub fn render_html_report(
    stats: &StatisticsSnapshot,
    recent: &[RunRecord],
    period: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut html = String::new();

    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>Web Scraper Report</title>\n");
    html.push_str(&format!("<style>{}</style>\n</head>\n<body>\n", STYLE));

    html.push_str("<h1>Web Scraper Report</h1>\n");
    html.push_str(&format!(
        "<p>{} &middot; generated {}</p>\n",
        escape_markup(period),
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    // Summary cards
    html.push_str("<div class=\"cards\">\n");
    for (label, value) in [
        ("Total runs", stats.totals.runs.to_string()),
        ("Successful", stats.totals.successes.to_string()),
        ("Failed", stats.totals.failures().to_string()),
        ("Success rate", format!("{:.1}%", stats.success_rate())),
        ("Items extracted", stats.totals.items.to_string()),
        ("Avg items / run", format!("{:.1}", stats.average_items())),
        ("Domains", stats.by_domain.len().to_string()),
    ] {
        html.push_str(&format!(
            "<div class=\"card\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>\n",
            value, label
        ));
    }
    html.push_str("</div>\n");

    if stats.is_empty() {
        html.push_str("<p class=\"empty\">No runs were recorded in this period.</p>\n");
    }

    // Charts
    html.push_str("<h2>Charts</h2>\n");
    for (file, alt) in [
        (DOMAIN_CHART_FILE, "Runs by domain"),
        (TIMELINE_CHART_FILE, "Extraction timeline"),
        (SUCCESS_CHART_FILE, "Success rate"),
        (VOLUME_CHART_FILE, "Items extracted by mode"),
    ] {
        html.push_str(&format!(
            "<img class=\"chart\" src=\"{}\" alt=\"{}\">\n",
            file, alt
        ));
    }

    // Mode breakdown
    if !stats.by_mode.is_empty() {
        html.push_str("<h2>By Mode</h2>\n<table>\n");
        html.push_str("<tr><th>Mode</th><th>Runs</th><th>Successful</th><th>Success rate</th><th>Items</th></tr>\n");
        for (mode, counts) in &stats.by_mode {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}</td></tr>\n",
                mode,
                counts.runs,
                counts.successes,
                counts.success_rate(),
                counts.items
            ));
        }
        html.push_str("</table>\n");
    }

    // Domain breakdown
    if !stats.by_domain.is_empty() {
        html.push_str("<h2>Top Domains</h2>\n<table>\n");
        html.push_str("<tr><th>Domain</th><th>Runs</th><th>Success rate</th><th>Items</th></tr>\n");
        for (domain, counts) in stats.top_domains(super::charts::MAX_DOMAINS) {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{:.1}%</td><td>{}</td></tr>\n",
                escape_markup(domain),
                counts.runs,
                counts.success_rate(),
                counts.items
            ));
        }
        html.push_str("</table>\n");
    }

    // Recent activity
    if !recent.is_empty() {
        html.push_str("<h2>Recent Activity</h2>\n<table>\n");
        html.push_str("<tr><th>Time (UTC)</th><th>URL</th><th>Mode</th><th>Items</th><th>Status</th></tr>\n");
        for run in recent {
            let status = if run.success {
                "<span class=\"ok\">success</span>".to_string()
            } else {
                format!(
                    "<span class=\"failed\">failed</span>{}",
                    run.error_message
                        .as_deref()
                        .map(|m| format!(": {}", escape_markup(m)))
                        .unwrap_or_default()
                )
            };
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
                run.timestamp.format("%Y-%m-%d %H:%M:%S"),
                escape_markup(&run.url),
                run.mode,
                run.item_count,
                status
            ));
        }
        html.push_str("</table>\n");
    }

    // Errors
    if !stats.top_errors.is_empty() {
        html.push_str("<h2>Most Common Errors</h2>\n<table>\n");
        html.push_str("<tr><th>Count</th><th>Message</th></tr>\n");
        for (message, count) in &stats.top_errors {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td></tr>\n",
                count,
                escape_markup(message)
            ));
        }
        html.push_str("</table>\n");
    }

    html.push_str("</body>\n</html>\n");
    html
}
