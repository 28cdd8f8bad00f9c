//! Hand-rendered SVG charts
//!
//! Every renderer returns a complete standalone SVG document. Data sets with
//! nothing to plot produce a framed placeholder instead.

use crate::extract::ExtractionMode;
use crate::report::stats::StatisticsSnapshot;
use crate::report::{escape_markup, ReportError, ReportResult};
use std::fmt::Write;

/// Text shown on placeholder charts
pub const NO_DATA_MESSAGE: &str = "No data for this period";

/// Domains shown on the distribution chart
pub const MAX_DOMAINS: usize = 15;

const WIDTH: f64 = 800.0;
const FONT: &str = "font-family=\"Helvetica, Arial, sans-serif\"";
const PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2b", "#59a14f", "#e15759", "#76b7b2", "#edc948", "#b07aa1",
];

/// One bar of a horizontal bar chart
#[derive(Debug, Clone)]
pub struct Bar {
    pub label: String,
    pub value: f64,
    /// Text drawn after the bar, defaults to the value
    pub annotation: Option<String>,
}

/// One line of a line chart, with a point per x label
#[derive(Debug, Clone)]
pub struct Series {
    pub name: String,
    pub points: Vec<f64>,
}

fn color(index: usize) -> &'static str {
    PALETTE[index % PALETTE.len()]
}

fn check_values<'a>(chart: &str, values: impl IntoIterator<Item = &'a f64>) -> ReportResult<()> {
    for value in values {
        if !value.is_finite() || *value < 0.0 {
            return Err(ReportError::Render {
                chart: chart.to_string(),
                message: format!("cannot plot value {}", value),
            });
        }
    }
    Ok(())
}

fn render_error(chart: &str) -> impl Fn(std::fmt::Error) -> ReportError + '_ {
    move |_| ReportError::Render {
        chart: chart.to_string(),
        message: "formatting failed".to_string(),
    }
}

fn open_svg(svg: &mut String, height: f64, title: &str) -> std::fmt::Result {
    write!(
        svg,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}" {font}>"#,
        w = WIDTH,
        h = height,
        font = FONT
    )?;
    write!(
        svg,
        r##"<rect width="100%" height="100%" fill="#ffffff"/><text x="{}" y="28" font-size="18" font-weight="bold" text-anchor="middle">{}</text>"##,
        WIDTH / 2.0,
        escape_markup(title)
    )
}

/// Framed placeholder used when there is nothing to plot
pub fn render_placeholder(title: &str) -> String {
    let height = 300.0;
    let mut svg = String::new();
    let _ = open_svg(&mut svg, height, title);
    let _ = write!(
        svg,
        r##"<rect x="20" y="50" width="{}" height="{}" fill="none" stroke="#cccccc" stroke-dasharray="6,4"/><text x="{}" y="{}" font-size="16" fill="#777777" text-anchor="middle">{}</text></svg>"##,
        WIDTH - 40.0,
        height - 70.0,
        WIDTH / 2.0,
        height / 2.0 + 10.0,
        NO_DATA_MESSAGE
    );
    svg
}

/// Renders a horizontal bar chart
///
/// Bars are scaled against `max_value`, or the largest value when `None`.
pub fn render_bar_chart(title: &str, bars: &[Bar], max_value: Option<f64>) -> ReportResult<String> {
    if bars.is_empty() {
        return Ok(render_placeholder(title));
    }
    check_values(title, bars.iter().map(|b| &b.value))?;

    let label_width = 220.0;
    let row_height = 28.0;
    let top = 50.0;
    let plot_width = WIDTH - label_width - 90.0;
    let height = top + row_height * bars.len() as f64 + 20.0;

    let max = max_value
        .unwrap_or_else(|| bars.iter().map(|b| b.value).fold(0.0, f64::max))
        .max(f64::EPSILON);

    let mut svg = String::new();
    let fail = render_error(title);
    open_svg(&mut svg, height, title).map_err(&fail)?;

    for (i, bar) in bars.iter().enumerate() {
        let y = top + row_height * i as f64;
        let length = (bar.value / max).min(1.0) * plot_width;
        let annotation = bar
            .annotation
            .clone()
            .unwrap_or_else(|| format_value(bar.value));

        write!(
            svg,
            r#"<text x="{}" y="{}" font-size="12" text-anchor="end">{}</text>"#,
            label_width - 8.0,
            y + row_height / 2.0 + 4.0,
            escape_markup(&truncate_label(&bar.label, 32))
        )
        .map_err(&fail)?;
        write!(
            svg,
            r#"<rect x="{}" y="{}" width="{:.1}" height="{}" fill="{}"/>"#,
            label_width,
            y + 4.0,
            length,
            row_height - 8.0,
            color(i)
        )
        .map_err(&fail)?;
        write!(
            svg,
            r#"<text x="{:.1}" y="{}" font-size="12">{}</text>"#,
            label_width + length + 6.0,
            y + row_height / 2.0 + 4.0,
            escape_markup(&annotation)
        )
        .map_err(&fail)?;
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Renders a line chart with one polyline per series
pub fn render_line_chart(
    title: &str,
    x_labels: &[String],
    series: &[Series],
) -> ReportResult<String> {
    if x_labels.is_empty() || series.iter().all(|s| s.points.is_empty()) {
        return Ok(render_placeholder(title));
    }
    check_values(title, series.iter().flat_map(|s| s.points.iter()))?;

    let height = 400.0;
    let (left, right, top, bottom) = (60.0, 160.0, 50.0, 60.0);
    let plot_w = WIDTH - left - right;
    let plot_h = height - top - bottom;

    let max = series
        .iter()
        .flat_map(|s| s.points.iter().copied())
        .fold(0.0, f64::max)
        .max(1.0);
    let step = if x_labels.len() > 1 {
        plot_w / (x_labels.len() - 1) as f64
    } else {
        0.0
    };
    let x_at = |i: usize| {
        if x_labels.len() > 1 {
            left + step * i as f64
        } else {
            left + plot_w / 2.0
        }
    };
    let y_at = |v: f64| top + plot_h - (v / max) * plot_h;

    let mut svg = String::new();
    let fail = render_error(title);
    open_svg(&mut svg, height, title).map_err(&fail)?;

    // Axes and horizontal grid
    write!(
        svg,
        r##"<line x1="{l}" y1="{b}" x2="{r}" y2="{b}" stroke="#333333"/><line x1="{l}" y1="{t}" x2="{l}" y2="{b}" stroke="#333333"/>"##,
        l = left,
        r = left + plot_w,
        t = top,
        b = top + plot_h
    )
    .map_err(&fail)?;
    for tick in 0..=4 {
        let value = max * tick as f64 / 4.0;
        let y = y_at(value);
        write!(
            svg,
            r##"<line x1="{}" y1="{y:.1}" x2="{}" y2="{y:.1}" stroke="#eeeeee"/><text x="{}" y="{:.1}" font-size="11" text-anchor="end">{}</text>"##,
            left,
            left + plot_w,
            left - 6.0,
            y + 4.0,
            format_value(value),
            y = y
        )
        .map_err(&fail)?;
    }

    // At most ~10 x labels
    let label_every = (x_labels.len() + 9) / 10;
    for (i, label) in x_labels.iter().enumerate() {
        if i % label_every.max(1) != 0 {
            continue;
        }
        write!(
            svg,
            r#"<text x="{:.1}" y="{}" font-size="11" text-anchor="middle">{}</text>"#,
            x_at(i),
            top + plot_h + 18.0,
            escape_markup(label)
        )
        .map_err(&fail)?;
    }

    for (index, s) in series.iter().enumerate() {
        let points: Vec<String> = s
            .points
            .iter()
            .enumerate()
            .map(|(i, v)| format!("{:.1},{:.1}", x_at(i), y_at(*v)))
            .collect();

        if points.len() == 1 {
            let (x, y) = (x_at(0), y_at(s.points[0]));
            write!(svg, r#"<circle cx="{:.1}" cy="{:.1}" r="4" fill="{}"/>"#, x, y, color(index))
                .map_err(&fail)?;
        } else {
            write!(
                svg,
                r#"<polyline points="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
                points.join(" "),
                color(index)
            )
            .map_err(&fail)?;
        }

        let legend_y = top + 20.0 * index as f64;
        write!(
            svg,
            r#"<rect x="{}" y="{}" width="12" height="12" fill="{}"/><text x="{}" y="{}" font-size="12">{}</text>"#,
            left + plot_w + 20.0,
            legend_y,
            color(index),
            left + plot_w + 38.0,
            legend_y + 11.0,
            escape_markup(&s.name)
        )
        .map_err(&fail)?;
    }

    svg.push_str("</svg>");
    Ok(svg)
}

/// Runs per domain (top domains) annotated with their success rate
pub fn domain_chart(stats: &StatisticsSnapshot) -> ReportResult<String> {
    let bars: Vec<Bar> = stats
        .top_domains(MAX_DOMAINS)
        .into_iter()
        .map(|(domain, counts)| Bar {
            label: if domain.is_empty() { "(none)".to_string() } else { domain.to_string() },
            value: counts.runs as f64,
            annotation: Some(format!("{} runs, {:.0}% ok", counts.runs, counts.success_rate())),
        })
        .collect();

    render_bar_chart("Runs by Domain", &bars, None)
}

/// Runs per UTC day, one line per mode
pub fn timeline_chart(stats: &StatisticsSnapshot) -> ReportResult<String> {
    let dates: Vec<_> = stats.by_date.keys().copied().collect();
    let labels: Vec<String> = dates.iter().map(|d| d.format("%m-%d").to_string()).collect();

    let series: Vec<Series> = ExtractionMode::ALL
        .iter()
        .filter(|mode| stats.by_mode.contains_key(*mode))
        .map(|mode| Series {
            name: mode.to_string(),
            points: dates
                .iter()
                .map(|date| {
                    stats.by_date[date].get(mode).copied().unwrap_or(0) as f64
                })
                .collect(),
        })
        .collect();

    render_line_chart("Extraction Timeline", &labels, &series)
}

/// Overall and per-mode success rate
pub fn success_rate_chart(stats: &StatisticsSnapshot) -> ReportResult<String> {
    if stats.is_empty() {
        return Ok(render_placeholder("Success Rate"));
    }

    let mut bars = vec![Bar {
        label: "overall".to_string(),
        value: stats.success_rate(),
        annotation: Some(format!("{:.1}%", stats.success_rate())),
    }];
    bars.extend(stats.by_mode.iter().map(|(mode, counts)| Bar {
        label: mode.to_string(),
        value: counts.success_rate(),
        annotation: Some(format!(
            "{:.1}% ({}/{})",
            counts.success_rate(),
            counts.successes,
            counts.runs
        )),
    }));

    render_bar_chart("Success Rate", &bars, Some(100.0))
}

/// Total items extracted per mode
pub fn volume_chart(stats: &StatisticsSnapshot) -> ReportResult<String> {
    let bars: Vec<Bar> = stats
        .by_mode
        .iter()
        .filter(|(_, counts)| counts.items > 0)
        .map(|(mode, counts)| Bar {
            label: mode.noun().to_string(),
            value: counts.items as f64,
            annotation: None,
        })
        .collect();

    render_bar_chart("Items Extracted by Mode", &bars, None)
}

fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{:.1}", value)
    }
}

fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let cut: String = label.chars().take(max_chars - 1).collect();
        format!("{}…", cut)
    }
}
