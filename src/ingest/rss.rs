//! RSS feed processing.

use chrono::{DateTime, Utc};
use rss::Channel;
use tracing::{debug, warn};

use super::normalizer::{Normalizer, MISSING_LINK};
use super::status::finish_summary;
use crate::error::ScrapeError;
use crate::models::{ProcessingSummary, RawExtractedItem, RssItem, Source};

/// Parse feed text into items, in feed order.
///
/// A malformed feed is an error; no partial item list is returned.
pub fn parse_feed(body: &str) -> Result<Vec<RssItem>, ScrapeError> {
    let channel =
        Channel::read_from(body.as_bytes()).map_err(|e| ScrapeError::FeedParse(e.to_string()))?;

    Ok(channel
        .items()
        .iter()
        .map(|item| RssItem {
            title: item.title().map(str::to_string),
            link: item.link().map(str::to_string),
            guid: item.guid().map(|g| g.value().to_string()),
            iso_date: item
                .dublin_core_ext()
                .and_then(|dc| dc.dates().first())
                .cloned(),
            pub_date: item.pub_date().map(str::to_string),
            content_snippet: item
                .content()
                .or_else(|| item.description())
                .map(str::to_string),
            categories: item
                .categories()
                .iter()
                .map(|c| c.name().to_string())
                .collect(),
        })
        .collect())
}

/// Turns a fetched feed body into stored articles.
#[derive(Clone)]
pub struct RssProcessor {
    normalizer: Normalizer,
}

impl RssProcessor {
    pub fn new(normalizer: Normalizer) -> Self {
        Self { normalizer }
    }

    /// Process at most `limit` items of `body` for `source`.
    ///
    /// `started_at` is when the attempt began, before the feed was fetched.
    pub async fn process(
        &self,
        source: &Source,
        body: &str,
        limit: usize,
        started_at: DateTime<Utc>,
    ) -> Result<ProcessingSummary, ScrapeError> {
        let mut summary = ProcessingSummary::begin_at(source, started_at);
        let items = parse_feed(body)?;

        summary.items_found = items.len();
        summary.items_considered = items.len().min(limit);
        debug!(
            source_id = %source.id,
            found = summary.items_found,
            considered = summary.items_considered,
            "Parsed feed"
        );

        for mut item in items.into_iter().take(limit) {
            summary.items_processed += 1;

            let link = item
                .link
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            let Some(link) = link else {
                warn!(source_id = %source.id, title = ?item.title, "Feed item has no link");
                summary.errors.push(MISSING_LINK.to_string());
                continue;
            };
            item.link = Some(link);

            self.normalizer
                .process(&RawExtractedItem::Rss(item), &source.name)
                .await
                .tally(&mut summary);
        }

        Ok(finish_summary(summary, limit))
    }
}
