use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{Html, Node, Selector};
use std::collections::HashSet;

/// Pattern an address must match to be reported
pub const EMAIL_PATTERN: &str = r"[^\s@]+@[^\s@]+\.[^\s@]+";

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(EMAIL_PATTERN).expect("email pattern is a valid regex"));

/// Elements whose text is never rendered
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Characters that end an address when they appear next to its `@`
const BOUNDARY_CHARS: &[char] = &[',', ';', ':', '<', '>', '(', ')', '[', ']', '{', '}', '"', '\'', '|'];

/// Returns one match of [`EMAIL_PATTERN`] per `@` that can be part of one
///
/// The scan restarts just past the `@` of every match, so an address whose
/// local part was consumed by the previous match's domain is still found.
/// Each match is narrowed to the address around its `@`, cut at punctuation
/// such as `,` `;` `<` and without trailing dots, when that still matches
/// the whole pattern.
pub fn extract_emails_from_text(text: &str) -> Vec<String> {
    let mut emails = Vec::new();
    let mut start = 0;

    while let Some(m) = EMAIL_REGEX.find_at(text, start) {
        let raw = m.as_str();
        // A match holds exactly one '@'
        let Some(at) = raw.find('@') else {
            break;
        };

        emails.push(narrow(raw, at).to_string());
        start = m.start() + at + 1;
    }

    emails
}

fn narrow(raw: &str, at: usize) -> &str {
    let local_start = raw[..at].rfind(BOUNDARY_CHARS).map_or(0, |i| i + 1);
    let domain_end = raw[at + 1..]
        .find(BOUNDARY_CHARS)
        .map_or(raw.len(), |i| at + 1 + i);

    let candidate = raw[local_start..domain_end].trim_end_matches('.');
    if is_full_match(candidate) {
        candidate
    } else {
        raw
    }
}

fn is_full_match(candidate: &str) -> bool {
    EMAIL_REGEX
        .find(candidate)
        .is_some_and(|m| m.start() == 0 && m.end() == candidate.len())
}

/// Extracts email addresses from a page
///
/// Scans the visible text of the document followed by the addresses of
/// `mailto:` links. The result is deduplicated, keeping the order of first
/// appearance. Addresses are not checked for deliverability.
pub fn extract_emails(document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut emails = Vec::new();

    let text = visible_text(document);
    let candidates = extract_emails_from_text(&text)
        .into_iter()
        .chain(mailto_addresses(document));

    for email in candidates {
        if seen.insert(email.clone()) {
            emails.push(email);
        }
    }

    tracing::debug!("Found {} unique email addresses", emails.len());
    emails
}

/// Concatenates text nodes outside hidden elements, separated by spaces
fn visible_text(document: &Html) -> String {
    let mut parts: Vec<&str> = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
        });

        if !hidden {
            parts.push(text);
        }
    }

    parts.join(" ")
}

/// Address part of each `mailto:` link that itself looks like an email
fn mailto_addresses(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| {
            let href = href.trim();
            let scheme = href.get(..7)?;
            if !scheme.eq_ignore_ascii_case("mailto:") {
                return None;
            }
            let address = href[7..].split('?').next().unwrap_or_default().trim();
            is_full_match(address).then(|| address.to_string())
        })
        .collect()
}
