//! Dispatch of a source to the processor for its type.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::html::HtmlProcessor;
use super::normalizer::Normalizer;
use super::rss::RssProcessor;
use crate::error::IngestError;
use crate::models::{ProcessingSummary, Source, SourceKind};
use crate::repository::ArticleStore;
use crate::scrapers::{
    BrowserLauncher, PageFetcher, ScraperSelector, StrategyPolicy, WebsiteRegistry,
};

#[derive(Clone)]
pub struct SourceRouter {
    fetcher: Arc<dyn PageFetcher>,
    rss: RssProcessor,
    html: HtmlProcessor,
}

impl SourceRouter {
    pub fn new(fetcher: Arc<dyn PageFetcher>, rss: RssProcessor, html: HtmlProcessor) -> Self {
        Self { fetcher, rss, html }
    }

    /// Wire both processors over shared collaborators.
    pub fn build(
        fetcher: Arc<dyn PageFetcher>,
        launcher: Arc<dyn BrowserLauncher>,
        articles: Arc<dyn ArticleStore>,
        websites: Arc<WebsiteRegistry>,
        policy: StrategyPolicy,
    ) -> Self {
        let normalizer = Normalizer::new(articles);
        let selector = ScraperSelector::with_defaults(fetcher.clone(), launcher, policy);
        Self::new(
            fetcher,
            RssProcessor::new(normalizer.clone()),
            HtmlProcessor::new(websites, Arc::new(selector), normalizer),
        )
    }

    /// Process one source with at most `limit` items.
    ///
    /// RSS bodies are fetched here; HTML sources fetch through their
    /// strategy. Unsupported types fail before any network I/O. The summary's
    /// attempt window opens at `started_at`, so it covers the fetch.
    pub async fn route(
        &self,
        source: &Source,
        limit: usize,
        started_at: DateTime<Utc>,
    ) -> Result<ProcessingSummary, IngestError> {
        match &source.kind {
            SourceKind::Rss => {
                let body = self.fetcher.fetch_text(&source.url).await?;
                debug!(source_id = %source.id, bytes = body.len(), "Fetched feed");
                Ok(self.rss.process(source, &body, limit, started_at).await?)
            }
            SourceKind::Html => Ok(self.html.process(source, limit, started_at).await?),
            SourceKind::Other(kind) => Err(IngestError::UnsupportedSourceType(kind.clone())),
        }
    }
}
