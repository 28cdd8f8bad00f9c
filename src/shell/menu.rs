//! Main menu entries

use crate::extract::ExtractionMode;

/// One entry of the main menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Extract(ExtractionMode),
    History,
    Statistics,
    ConfigureDatabase,
    Reports,
    Quit,
}

impl MenuChoice {
    /// All entries in display order
    pub const ALL: [MenuChoice; 10] = [
        Self::Extract(ExtractionMode::Selector),
        Self::Extract(ExtractionMode::Links),
        Self::Extract(ExtractionMode::Emails),
        Self::Extract(ExtractionMode::Images),
        Self::Extract(ExtractionMode::Sitemap),
        Self::History,
        Self::Statistics,
        Self::ConfigureDatabase,
        Self::Reports,
        Self::Quit,
    ];

    /// Shortcut key shown before the label
    pub fn key(&self) -> &'static str {
        match self {
            Self::Extract(ExtractionMode::Selector) => "1",
            Self::Extract(ExtractionMode::Links) => "2",
            Self::Extract(ExtractionMode::Emails) => "3",
            Self::Extract(ExtractionMode::Images) => "4",
            Self::Extract(ExtractionMode::Sitemap) => "5",
            Self::History => "6",
            Self::Statistics => "7",
            Self::ConfigureDatabase => "8",
            Self::Reports => "9",
            Self::Quit => "q",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Extract(ExtractionMode::Selector) => "Extract elements by CSS selector",
            Self::Extract(ExtractionMode::Links) => "Extract all links from a page",
            Self::Extract(ExtractionMode::Emails) => "Extract emails from a page",
            Self::Extract(ExtractionMode::Images) => "Extract all images from a page",
            Self::Extract(ExtractionMode::Sitemap) => "Generate sitemap from links",
            Self::History => "View scraping history",
            Self::Statistics => "View database statistics",
            Self::ConfigureDatabase => "Configure database settings",
            Self::Reports => "Generate reports",
            Self::Quit => "Quit",
        }
    }

    /// Menu line as displayed
    pub fn display(&self) -> String {
        format!("{}. {}", self.key(), self.label())
    }

    /// Whether the entry needs a database
    pub fn requires_database(&self) -> bool {
        matches!(self, Self::History | Self::Statistics | Self::Reports)
    }
}
