//! Article models: raw extracted items and the canonical persisted record.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One item parsed out of an RSS feed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RssItem {
    pub title: Option<String>,
    pub link: Option<String>,
    pub guid: Option<String>,
    /// ISO 8601 date (Dublin Core `dc:date`).
    pub iso_date: Option<String>,
    /// RFC 2822 date (`pubDate`).
    pub pub_date: Option<String>,
    pub content_snippet: Option<String>,
    pub categories: Vec<String>,
}

/// One article extracted from a scraped HTML page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedArticle {
    pub title: String,
    /// Absolute URL, resolved against the website base URL.
    pub url: String,
    pub description: Option<String>,
    /// Raw date text as found on the page.
    pub published_date: Option<String>,
    /// Website id the article was scraped with.
    pub source: String,
}

/// Transient union of the two extraction shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum RawExtractedItem {
    Rss(RssItem),
    Scraped(ScrapedArticle),
}

/// Persisted, deduplicated representation of one piece of content.
///
/// `link` is the natural key; `guid` is unique when present.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub link: String,
    pub source_name: String,
    pub published_date: DateTime<Utc>,
    pub description: Option<String>,
    pub guid: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub is_read: bool,
    pub is_starred: bool,
    pub is_hidden: bool,
    pub categories: Vec<String>,
}

impl Article {
    /// Build a fresh, unread article with a new id.
    pub fn new(
        title: String,
        link: String,
        source_name: String,
        published_date: DateTime<Utc>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            title,
            link,
            source_name,
            published_date,
            description: None,
            guid: None,
            fetched_at: Utc::now(),
            is_read: false,
            is_starred: false,
            is_hidden: false,
            categories: Vec::new(),
        }
    }
}
