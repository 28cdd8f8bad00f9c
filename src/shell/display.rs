//! Console rendering of results, history and outcomes

use crate::extract::{ExtractedItem, ExtractionResult};
use crate::pipeline::RunOutcome;
use crate::storage::RunRecord;
use console::style;

/// Longest URL shown in the history table
const URL_WIDTH: usize = 50;

/// Formats one item as a numbered console line
pub fn format_item(index: usize, item: &ExtractedItem) -> String {
    match item {
        ExtractedItem::Text(text) => format!("{:>4}. {}", index + 1, text),
        ExtractedItem::Link(link) => match &link.text {
            Some(text) => format!("{:>4}. {} ({})", index + 1, link.url, text),
            None => format!("{:>4}. {}", index + 1, link.url),
        },
        ExtractedItem::Image(image) => {
            let mut line = format!("{:>4}. {}", index + 1, image.url);
            if let Some(alt) = &image.alt {
                line.push_str(&format!(" [alt: {}]", alt));
            }
            if let (Some(w), Some(h)) = (image.width, image.height) {
                line.push_str(&format!(" {}x{}", w, h));
            }
            line
        }
    }
}

/// Prints every item of a result
pub fn print_result(result: &ExtractionResult) {
    if result.is_empty() {
        println!("{}", style(format!("No {} found.", result.mode.noun())).yellow());
        return;
    }

    println!(
        "{}",
        style(format!("Found {} {}:", result.len(), result.mode.noun()))
            .green()
            .bold()
    );
    for (i, item) in result.items.iter().enumerate() {
        println!("{}", format_item(i, item));
    }
}

/// Prints the extraction result followed by save and export status
pub fn print_outcome(outcome: &RunOutcome) {
    match &outcome.result {
        Ok(result) => print_result(result),
        Err(e) => println!("{}", style(format!("✗ {}", e)).red()),
    }

    if let Some(run) = &outcome.run {
        let message = if run.success {
            format!("✓ Saved to database as run #{}", run.id)
        } else {
            format!("Failure recorded as run #{}", run.id)
        };
        println!("{}", style(message).cyan());
    }
    if let Some(e) = &outcome.persistence_error {
        println!("{}", style(format!("✗ Could not save to database: {}", e)).red());
    }
    for path in &outcome.exported {
        println!("{}", style(format!("✓ Written to {}", path.display())).green());
    }
    for e in &outcome.export_errors {
        println!("{}", style(format!("✗ {}", e)).red());
    }
}

/// Formats runs as a fixed-width table
pub fn format_history_table(runs: &[RunRecord]) -> String {
    let mut table = format!(
        "{:<6} {:<19} {:<8} {:<w$} {:>6}  {}\n",
        "ID",
        "Time (UTC)",
        "Mode",
        "URL",
        "Items",
        "Status",
        w = URL_WIDTH
    );
    table.push_str(&"-".repeat(URL_WIDTH + 52));
    table.push('\n');

    for run in runs {
        let status = if run.success {
            "success".to_string()
        } else {
            match &run.error_message {
                Some(message) => format!("failed: {}", shorten(message, 40)),
                None => "failed".to_string(),
            }
        };

        table.push_str(&format!(
            "{:<6} {:<19} {:<8} {:<w$} {:>6}  {}\n",
            run.id,
            run.timestamp.format("%Y-%m-%d %H:%M:%S"),
            run.mode.to_string(),
            shorten(&run.url, URL_WIDTH),
            run.item_count,
            status,
            w = URL_WIDTH
        ));
    }

    table
}

fn shorten(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}
