//! Article normalization and deduplication.
//!
//! Both extraction shapes are folded into one canonical [`Article`]. An item
//! is stored only if neither its guid nor its link is already known; known
//! items are skipped and never overwritten.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::models::{Article, ProcessingSummary, RawExtractedItem};
use crate::repository::ArticleStore;
use crate::utils::{
    collapse_whitespace, html_text, parse_iso_date, parse_published_date, parse_rfc2822_date,
    truncate_snippet,
};

/// Title used when an item has none.
pub const UNTITLED: &str = "Untitled Article";

/// Maximum characters kept from an RSS content snippet.
pub const SNIPPET_MAX_CHARS: usize = 300;

/// Item-level error for a feed item without a link.
pub const MISSING_LINK: &str = "Item missing link.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalizeAction {
    Added,
    Skipped,
}

/// Result of handing one item to the normalizer.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizeOutcome {
    pub action: NormalizeAction,
    /// Set when the item could not be stored.
    pub error: Option<String>,
}

impl NormalizeOutcome {
    fn added() -> Self {
        Self {
            action: NormalizeAction::Added,
            error: None,
        }
    }

    fn skipped() -> Self {
        Self {
            action: NormalizeAction::Skipped,
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            action: NormalizeAction::Skipped,
            error: Some(error),
        }
    }

    /// Fold this outcome into a source summary.
    pub fn tally(self, summary: &mut ProcessingSummary) {
        match self.action {
            NormalizeAction::Added => summary.new_items_added += 1,
            NormalizeAction::Skipped => summary.items_skipped += 1,
        }
        if let Some(error) = self.error {
            summary.errors.push(error);
        }
    }
}

fn non_blank(s: Option<&str>) -> Option<&str> {
    s.map(str::trim).filter(|s| !s.is_empty())
}

fn title_or_default(title: Option<&str>) -> String {
    non_blank(title)
        .map(collapse_whitespace)
        .unwrap_or_else(|| UNTITLED.to_string())
}

/// ISO date first, then the RFC date, then now.
fn rss_published_date(iso: Option<&str>, rfc: Option<&str>, now: DateTime<Utc>) -> DateTime<Utc> {
    non_blank(iso)
        .and_then(|s| parse_iso_date(s).or_else(|| parse_published_date(s)))
        .or_else(|| {
            non_blank(rfc).and_then(|s| parse_rfc2822_date(s).or_else(|| parse_published_date(s)))
        })
        .unwrap_or(now)
}

/// Plain-text snippet of feed content.
pub fn content_snippet(content: &str) -> Option<String> {
    let text = html_text(content);
    if text.is_empty() {
        None
    } else {
        Some(truncate_snippet(&text, SNIPPET_MAX_CHARS))
    }
}

/// Build the canonical article for an item. `None` when the item has no link.
pub fn canonicalize(item: &RawExtractedItem, source_name: &str) -> Option<Article> {
    let now = Utc::now();
    match item {
        RawExtractedItem::Rss(rss) => {
            let link = non_blank(rss.link.as_deref())?;
            let mut article = Article::new(
                title_or_default(rss.title.as_deref()),
                link.to_string(),
                source_name.to_string(),
                rss_published_date(rss.iso_date.as_deref(), rss.pub_date.as_deref(), now),
            );
            article.description = rss.content_snippet.as_deref().and_then(content_snippet);
            article.guid = non_blank(rss.guid.as_deref()).map(str::to_string);
            article.categories = rss
                .categories
                .iter()
                .map(|c| c.trim())
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            Some(article)
        }
        RawExtractedItem::Scraped(scraped) => {
            let link = non_blank(Some(scraped.url.as_str()))?;
            let mut article = Article::new(
                title_or_default(Some(scraped.title.as_str())),
                link.to_string(),
                source_name.to_string(),
                non_blank(scraped.published_date.as_deref())
                    .and_then(parse_published_date)
                    .unwrap_or(now),
            );
            article.description = non_blank(scraped.description.as_deref()).map(str::to_string);
            Some(article)
        }
    }
}

/// Dedups items against the article store and inserts new ones.
#[derive(Clone)]
pub struct Normalizer {
    store: Arc<dyn ArticleStore>,
}

impl Normalizer {
    pub fn new(store: Arc<dyn ArticleStore>) -> Self {
        Self { store }
    }

    /// Store `item` unless it is already known.
    ///
    /// Never fails: lookup or insert errors come back as a skipped outcome
    /// carrying the message, so one bad item does not abort the batch.
    pub async fn process(&self, item: &RawExtractedItem, source_name: &str) -> NormalizeOutcome {
        let Some(article) = canonicalize(item, source_name) else {
            return NormalizeOutcome::failed(MISSING_LINK.to_string());
        };

        match self.find_existing(&article).await {
            Ok(true) => {
                debug!(link = %article.link, "Article already stored, skipping");
                return NormalizeOutcome::skipped();
            }
            Ok(false) => {}
            Err(e) => {
                warn!(link = %article.link, error = %e, "Duplicate lookup failed");
                return NormalizeOutcome::failed(format!(
                    "Failed to check existing article {}: {}",
                    article.link, e
                ));
            }
        }

        match self.store.insert(&article).await {
            Ok(()) => {
                debug!(link = %article.link, "Stored new article");
                NormalizeOutcome::added()
            }
            Err(e) => {
                warn!(link = %article.link, error = %e, "Failed to store article");
                NormalizeOutcome::failed(format!(
                    "Failed to save article {}: {}",
                    article.link, e
                ))
            }
        }
    }

    /// Guid first when present, then link.
    async fn find_existing(&self, article: &Article) -> Result<bool, crate::repository::DbError> {
        if let Some(ref guid) = article.guid {
            if self.store.find_by_guid(guid).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(self.store.find_by_link(&article.link).await?.is_some())
    }
}
