//! Source models for polled content origins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::SourceStatus;
use crate::scrapers::config::SelectorOverrides;
use crate::scrapers::StrategyKind;

/// Type of content source.
///
/// Unknown type strings are preserved so the router can report them instead
/// of the registry silently rewriting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SourceKind {
    Rss,
    Html,
    Other(String),
}

impl SourceKind {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Rss => "rss",
            Self::Html => "html",
            Self::Other(s) => s.as_str(),
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "rss" => Self::Rss,
            "html" => Self::Html,
            _ => Self::Other(s.to_string()),
        }
    }
}

impl From<String> for SourceKind {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<SourceKind> for String {
    fn from(kind: SourceKind) -> Self {
        kind.as_str().to_string()
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-source HTML scraping settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceScraping {
    /// Key into the website scraping config registry.
    #[serde(default)]
    pub website_id: Option<String>,
    /// Forces a strategy for this source, bypassing membership and auto.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<StrategyKind>,
    /// Custom selectors merged over the registry config for this source only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selectors: Option<SelectorOverrides>,
}

/// A configured origin polled for content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Unique identifier for this source.
    pub id: String,
    /// Human-readable name, copied onto every article it produces.
    pub name: String,
    /// Feed URL or page URL.
    pub url: String,
    /// Type of source.
    pub kind: SourceKind,
    /// Disabled sources are skipped by bulk runs and rejected by single runs.
    pub enabled: bool,
    /// HTML scraping settings (ignored for RSS).
    pub scraping: Option<SourceScraping>,
    /// When the source was added.
    pub created_at: DateTime<Utc>,
    /// Last-fetch bookkeeping, written by the orchestrator only.
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub last_status: Option<SourceStatus>,
    pub last_fetch_message: Option<String>,
    pub last_error: Option<String>,
}

impl Source {
    /// Create a new enabled source.
    pub fn new(id: String, name: String, url: String, kind: SourceKind) -> Self {
        Self {
            id,
            name,
            url,
            kind,
            enabled: true,
            scraping: None,
            created_at: Utc::now(),
            last_fetched_at: None,
            last_status: None,
            last_fetch_message: None,
            last_error: None,
        }
    }

    /// Attach HTML scraping settings.
    pub fn with_scraping(mut self, scraping: SourceScraping) -> Self {
        self.scraping = Some(scraping);
        self
    }

    /// Website id from the scraping settings, if any.
    pub fn website_id(&self) -> Option<&str> {
        self.scraping
            .as_ref()
            .and_then(|s| s.website_id.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Last-fetch fields written back after each attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchBookkeeping {
    pub fetched_at: DateTime<Utc>,
    pub status: SourceStatus,
    pub message: String,
    pub error: Option<String>,
}
