//! HTML page processing via the scraper strategy selector.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::normalizer::Normalizer;
use super::status::finish_summary;
use crate::error::ScrapeError;
use crate::models::{ProcessingSummary, RawExtractedItem, Source};
use crate::scrapers::{ScraperSelector, WebsiteRegistry};

#[derive(Clone)]
pub struct HtmlProcessor {
    websites: Arc<WebsiteRegistry>,
    selector: Arc<ScraperSelector>,
    normalizer: Normalizer,
}

impl HtmlProcessor {
    pub fn new(
        websites: Arc<WebsiteRegistry>,
        selector: Arc<ScraperSelector>,
        normalizer: Normalizer,
    ) -> Self {
        Self {
            websites,
            selector,
            normalizer,
        }
    }

    /// Scrape `source` and store up to `limit` new articles.
    ///
    /// A missing or unknown website id fails before any page is fetched.
    pub async fn process(
        &self,
        source: &Source,
        limit: usize,
        started_at: DateTime<Utc>,
    ) -> Result<ProcessingSummary, ScrapeError> {
        let website_id = source.website_id().ok_or(ScrapeError::MissingWebsiteId)?;
        let scraping = source.scraping.as_ref();
        let config = self
            .websites
            .resolve(website_id, scraping.and_then(|s| s.selectors.as_ref()))
            .ok_or_else(|| ScrapeError::UnknownWebsite(website_id.to_string()))?;

        let cap = config.effective_cap(limit);
        let url = if source.url.trim().is_empty() {
            config.base_url.as_str()
        } else {
            source.url.trim()
        };

        let outcome = self
            .selector
            .scrape(url, &config, scraping.and_then(|s| s.strategy), cap)
            .await?;

        let mut summary = ProcessingSummary::begin_at(source, started_at);
        summary.strategy = Some(outcome.strategy);
        summary.items_found = outcome.extraction.candidates;
        summary.items_considered = outcome.extraction.articles.len();
        debug!(
            source_id = %source.id,
            website = website_id,
            strategy = %outcome.strategy,
            fell_back = outcome.fell_back,
            found = summary.items_found,
            considered = summary.items_considered,
            "Scraped page"
        );

        for article in outcome.extraction.articles {
            summary.items_processed += 1;
            self.normalizer
                .process(&RawExtractedItem::Scraped(article), &source.name)
                .await
                .tally(&mut summary);
        }

        Ok(finish_summary(summary, cap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceKind, SourceScraping, SourceStatus};
    use crate::repository::{ArticleStore, MemoryArticleStore};
    use crate::scrapers::browser::UnavailableLauncher;
    use crate::scrapers::config::{ArticleSelectors, ScrapingConfig};
    use crate::scrapers::{PageFetcher, StrategyKind, StrategyPolicy};
    use async_trait::async_trait;
    use std::collections::BTreeMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct StaticPage {
        html: String,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl PageFetcher for StaticPage {
        async fn fetch_text(&self, _url: &str) -> Result<String, ScrapeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.html.clone())
        }
    }

    fn page(n: usize) -> String {
        let items: String = (0..n)
            .map(|i| format!(r#"<article><a href="/story/{i}"><h2>Story {i}</h2></a></article>"#))
            .collect();
        format!("<html><body>{}</body></html>", items)
    }

    fn websites(max_articles: Option<usize>) -> Arc<WebsiteRegistry> {
        let mut table = BTreeMap::new();
        table.insert(
            "example".to_string(),
            ScrapingConfig {
                base_url: "https://example.com".into(),
                selectors: ArticleSelectors {
                    container: "article".into(),
                    title: Some("h2".into()),
                    url: Some("a".into()),
                    url_attribute: "href".into(),
                    ..Default::default()
                },
                max_articles,
                ..Default::default()
            },
        );
        Arc::new(WebsiteRegistry::new(table))
    }

    fn setup(
        html: String,
        max_articles: Option<usize>,
    ) -> (HtmlProcessor, Arc<StaticPage>, Arc<MemoryArticleStore>) {
        let fetcher = Arc::new(StaticPage {
            html,
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(MemoryArticleStore::new());
        let selector = ScraperSelector::with_defaults(
            fetcher.clone(),
            Arc::new(UnavailableLauncher),
            StrategyPolicy::default(),
        );
        let processor = HtmlProcessor::new(
            websites(max_articles),
            Arc::new(selector),
            Normalizer::new(store.clone()),
        );
        (processor, fetcher, store)
    }

    fn source(website_id: Option<&str>) -> Source {
        Source::new(
            "site".into(),
            "Example Site".into(),
            "https://example.com/news".into(),
            SourceKind::Html,
        )
        .with_scraping(SourceScraping {
            website_id: website_id.map(str::to_string),
            ..Default::default()
        })
    }

    #[tokio::test]
    async fn missing_website_id_fails_without_fetching() {
        let (p, fetcher, _) = setup(page(5), None);
        let result = p.process(&source(None), 10, Utc::now()).await;
        assert!(matches!(result, Err(ScrapeError::MissingWebsiteId)));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_website_fails_without_fetching() {
        let (p, fetcher, _) = setup(page(5), None);
        let result = p.process(&source(Some("nope")), 10, Utc::now()).await;
        assert!(matches!(result, Err(ScrapeError::UnknownWebsite(ref id)) if id == "nope"));
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn stores_scraped_articles() {
        let (p, _, store) = setup(page(4), None);
        let summary = p.process(&source(Some("example")), 10, Utc::now()).await.unwrap();
        assert_eq!(summary.items_found, 4);
        assert_eq!(summary.new_items_added, 4);
        assert_eq!(summary.strategy, Some(StrategyKind::Lightweight));
        assert_eq!(summary.status, SourceStatus::Success);
        assert_eq!(store.articles()[0].link, "https://example.com/story/0");
        assert_eq!(store.articles()[0].source_name, "Example Site");
    }

    #[tokio::test]
    async fn website_cap_and_run_limit_take_the_smaller() {
        let (p, _, store) = setup(page(8), Some(5));
        let summary = p.process(&source(Some("example")), 3, Utc::now()).await.unwrap();
        assert_eq!(summary.items_found, 8);
        assert_eq!(summary.items_considered, 3);
        assert!(summary.message.contains("article limit of 3"));
        assert_eq!(store.count().await.unwrap(), 3);

        let again = p.process(&source(Some("example")), 50, Utc::now()).await.unwrap();
        assert_eq!(again.items_considered, 5);
    }

    #[tokio::test]
    async fn thin_page_with_no_browser_keeps_lightweight_result() {
        let (p, _, _) = setup(page(1), None);
        let summary = p.process(&source(Some("example")), 10, Utc::now()).await.unwrap();
        assert_eq!(summary.strategy, Some(StrategyKind::Lightweight));
        assert_eq!(summary.new_items_added, 1);
    }
}
