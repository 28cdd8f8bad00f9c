//! Extractors
//!
//! Four stateless transforms over a parsed document:
//! - CSS selector text/attribute extraction
//! - Link extraction with URL resolution
//! - Image reference extraction
//! - Email address pattern extraction
//!
//! Sitemap mode reuses the link extractor; the XML document itself is built
//! by `output::sitemap`.

mod emails;
mod images;
mod links;
mod selector;

pub use emails::{extract_emails, extract_emails_from_text, EMAIL_PATTERN};
pub use images::extract_images;
pub use links::extract_links;
pub use selector::extract_elements;

use scraper::Html;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::fmt;
use url::Url;

/// The five supported extraction behaviours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    Selector,
    Links,
    Images,
    Emails,
    Sitemap,
}

impl ExtractionMode {
    /// All modes in menu order
    pub const ALL: [ExtractionMode; 5] = [
        Self::Selector,
        Self::Links,
        Self::Emails,
        Self::Images,
        Self::Sitemap,
    ];

    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Selector => "selector",
            Self::Links => "links",
            Self::Images => "images",
            Self::Emails => "emails",
            Self::Sitemap => "sitemap",
        }
    }

    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "selector" => Some(Self::Selector),
            "links" => Some(Self::Links),
            "images" => Some(Self::Images),
            "emails" => Some(Self::Emails),
            "sitemap" => Some(Self::Sitemap),
            _ => None,
        }
    }

    /// Human-readable name of what the mode collects
    pub fn noun(&self) -> &'static str {
        match self {
            Self::Selector => "elements",
            Self::Links => "links",
            Self::Images => "images",
            Self::Emails => "emails",
            Self::Sitemap => "sitemap links",
        }
    }
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// A hyperlink found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkItem {
    /// Absolute URL
    pub url: String,
    /// Trimmed anchor text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Whether the link leaves the page's host
    pub external: bool,
}

/// An image reference found on a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageItem {
    /// Absolute URL
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One extracted value
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ExtractedItem {
    /// Element text, attribute value, or email address
    Text(String),
    Link(LinkItem),
    Image(ImageItem),
}

impl ExtractedItem {
    /// The primary value: the text itself, or the absolute URL
    pub fn value(&self) -> &str {
        match self {
            Self::Text(s) => s,
            Self::Link(link) => &link.url,
            Self::Image(image) => &image.url,
        }
    }

    /// Returns the URL for link and image items
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Text(_) => None,
            Self::Link(link) => Some(&link.url),
            Self::Image(image) => Some(&image.url),
        }
    }

    /// Metadata stored alongside the value, if the item has any
    pub fn attributes(&self) -> Option<Value> {
        match self {
            Self::Text(_) => None,
            Self::Link(link) => {
                let mut map = Map::new();
                if let Some(text) = &link.text {
                    map.insert("text".to_string(), json!(text));
                }
                map.insert("external".to_string(), json!(link.external));
                Some(Value::Object(map))
            }
            Self::Image(image) => {
                let mut map = Map::new();
                if let Some(alt) = &image.alt {
                    map.insert("alt".to_string(), json!(alt));
                }
                if let Some(title) = &image.title {
                    map.insert("title".to_string(), json!(title));
                }
                if let Some(width) = image.width {
                    map.insert("width".to_string(), json!(width));
                }
                if let Some(height) = image.height {
                    map.insert("height".to_string(), json!(height));
                }
                (!map.is_empty()).then_some(Value::Object(map))
            }
        }
    }
}

/// The ordered output of one extraction call
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionResult {
    /// The page URL that was requested
    pub url: String,
    pub mode: ExtractionMode,
    pub items: Vec<ExtractedItem>,
}

impl ExtractionResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Absolute URLs of link and image items, in order
    pub fn urls(&self) -> Vec<String> {
        self.items
            .iter()
            .filter_map(|item| item.url().map(|u| u.to_string()))
            .collect()
    }

    /// Primary value of every item, in order
    pub fn values(&self) -> Vec<String> {
        self.items.iter().map(|item| item.value().to_string()).collect()
    }
}

/// Mode-specific options
#[derive(Debug, Clone, Default)]
pub struct ExtractOptions {
    /// CSS selector (selector mode only)
    pub selector: Option<String>,
    /// Attribute to read instead of text content (selector mode only)
    pub attribute: Option<String>,
}

/// Runs the extractor for `mode` over a parsed document
///
/// `base` is the page's final URL; link and image references are resolved
/// against it.
pub fn extract(
    document: &Html,
    base: &Url,
    mode: ExtractionMode,
    options: &ExtractOptions,
) -> crate::Result<Vec<ExtractedItem>> {
    let items = match mode {
        ExtractionMode::Selector => {
            let selector = options.selector.as_deref().unwrap_or_default();
            extract_elements(document, selector, options.attribute.as_deref())?
                .into_iter()
                .map(ExtractedItem::Text)
                .collect()
        }
        ExtractionMode::Links | ExtractionMode::Sitemap => extract_links(document, base)
            .into_iter()
            .map(ExtractedItem::Link)
            .collect(),
        ExtractionMode::Images => extract_images(document, base)
            .into_iter()
            .map(ExtractedItem::Image)
            .collect(),
        ExtractionMode::Emails => extract_emails(document)
            .into_iter()
            .map(ExtractedItem::Text)
            .collect(),
    };

    Ok(items)
}
