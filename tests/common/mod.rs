//! Shared stubs for integration tests. No network, no browser.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use feedacquire::error::ScrapeError;
use feedacquire::ingest::{FetchOrchestrator, SourceRouter};
use feedacquire::models::{FetchBookkeeping, RunLog, Source, SourceKind, SourceScraping};
use feedacquire::repository::{
    ArticleStore, DbError, MemoryArticleStore, MemoryRunLogStore, MemorySourceRegistry,
    RunLogStore, SourceRegistry,
};
use feedacquire::scrapers::browser::BrowserSession;
use feedacquire::scrapers::config::{ArticleSelectors, ScrapingConfig};
use feedacquire::scrapers::{BrowserLauncher, PageFetcher, StrategyPolicy, WebsiteRegistry};

/// Serves canned bodies by URL and counts requests.
#[derive(Default)]
pub struct StubFetcher {
    pages: HashMap<String, String>,
    pub calls: AtomicUsize,
}

impl StubFetcher {
    pub fn with_page(mut self, url: &str, body: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), body.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for StubFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, ScrapeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| ScrapeError::HttpStatus {
                url: url.to_string(),
                status: 404,
            })
    }
}

/// Browser whose sessions render a fixed DOM (or fail), counting launches
/// and releases.
pub struct StubLauncher {
    rendered: Result<String, String>,
    pub launches: Arc<AtomicUsize>,
    pub closes: Arc<AtomicUsize>,
}

impl StubLauncher {
    pub fn rendering(html: impl Into<String>) -> Self {
        Self {
            rendered: Ok(html.into()),
            launches: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn crashing(message: &str) -> Self {
        Self {
            rendered: Err(message.to_string()),
            launches: Arc::new(AtomicUsize::new(0)),
            closes: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }
}

struct StubSession {
    rendered: Result<String, String>,
    closes: Arc<AtomicUsize>,
}

#[async_trait]
impl BrowserLauncher for StubLauncher {
    async fn launch(&self) -> Result<Box<dyn BrowserSession>, ScrapeError> {
        self.launches.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(StubSession {
            rendered: self.rendered.clone(),
            closes: self.closes.clone(),
        }))
    }
}

#[async_trait]
impl BrowserSession for StubSession {
    async fn render(&mut self, _url: &str) -> Result<String, ScrapeError> {
        self.rendered.clone().map_err(ScrapeError::Browser)
    }

    async fn close(&mut self) -> Result<(), ScrapeError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Source registry whose bookkeeping writes always fail.
pub struct ReadOnlyRegistry(pub MemorySourceRegistry);

#[async_trait]
impl SourceRegistry for ReadOnlyRegistry {
    async fn get(&self, id: &str) -> Result<Option<Source>, DbError> {
        self.0.get(id).await
    }

    async fn list(&self) -> Result<Vec<Source>, DbError> {
        self.0.list().await
    }

    async fn list_enabled(&self) -> Result<Vec<Source>, DbError> {
        self.0.list_enabled().await
    }

    async fn save(&self, _source: &Source) -> Result<(), DbError> {
        Err(DbError::RollbackTransaction)
    }

    async fn set_enabled(&self, _id: &str, _enabled: bool) -> Result<bool, DbError> {
        Err(DbError::RollbackTransaction)
    }

    async fn record_fetch(&self, _id: &str, _fetch: &FetchBookkeeping) -> Result<(), DbError> {
        Err(DbError::RollbackTransaction)
    }
}

/// Run log store that cannot create logs.
pub struct BrokenRunLogStore;

#[async_trait]
impl RunLogStore for BrokenRunLogStore {
    async fn create(&self, _log: &RunLog) -> Result<String, DbError> {
        Err(DbError::BrokenTransactionManager)
    }

    async fn update(&self, _id: &str, _log: &RunLog) -> Result<(), DbError> {
        Err(DbError::BrokenTransactionManager)
    }

    async fn recent(&self, _limit: usize) -> Result<Vec<RunLog>, DbError> {
        Ok(Vec::new())
    }
}

pub const SITE_URL: &str = "https://news.example.com/latest";

/// Website registry with a single `example` site.
pub fn websites() -> Arc<WebsiteRegistry> {
    let mut table = BTreeMap::new();
    table.insert(
        "example".to_string(),
        ScrapingConfig {
            base_url: "https://news.example.com".into(),
            selectors: ArticleSelectors {
                container: "div.story".into(),
                title: Some("h3".into()),
                url: Some("a".into()),
                url_attribute: "href".into(),
                description: Some("p".into()),
                ..Default::default()
            },
            ..Default::default()
        },
    );
    Arc::new(WebsiteRegistry::new(table))
}

/// A listing page with `n` stories.
pub fn listing(n: usize) -> String {
    let stories: String = (0..n)
        .map(|i| {
            format!(
                r#"<div class="story"><h3>Story {i}</h3><a href="/stories/{i}">Read more</a><p>Teaser {i}</p></div>"#
            )
        })
        .collect();
    format!("<html><body><main>{}</main></body></html>", stories)
}

pub fn rss_source(id: &str, url: &str) -> Source {
    Source::new(id.into(), format!("{} feed", id), url.into(), SourceKind::Rss)
}

pub fn html_source(id: &str) -> Source {
    Source::new(id.into(), format!("{} site", id), SITE_URL.into(), SourceKind::Html).with_scraping(
        SourceScraping {
            website_id: Some("example".into()),
            ..Default::default()
        },
    )
}

/// Wire an orchestrator over in-memory stores.
pub fn orchestrator(
    sources: Arc<dyn SourceRegistry>,
    runs: Arc<dyn RunLogStore>,
    fetcher: Arc<StubFetcher>,
    launcher: Arc<StubLauncher>,
    articles: Arc<dyn ArticleStore>,
    policy: StrategyPolicy,
) -> FetchOrchestrator {
    let router = SourceRouter::build(fetcher, launcher, articles, websites(), policy);
    FetchOrchestrator::new(sources, runs, router)
}

/// The common case: memory registry, memory run logs, memory articles.
pub struct Harness {
    pub sources: Arc<MemorySourceRegistry>,
    pub runs: Arc<MemoryRunLogStore>,
    pub articles: Arc<MemoryArticleStore>,
    pub fetcher: Arc<StubFetcher>,
    pub launcher: Arc<StubLauncher>,
    pub orchestrator: FetchOrchestrator,
}

impl Harness {
    pub fn new(sources: Vec<Source>, fetcher: StubFetcher, launcher: StubLauncher) -> Self {
        Self::with_policy(sources, fetcher, launcher, StrategyPolicy::default())
    }

    pub fn with_policy(
        sources: Vec<Source>,
        fetcher: StubFetcher,
        launcher: StubLauncher,
        policy: StrategyPolicy,
    ) -> Self {
        let sources = Arc::new(MemorySourceRegistry::new(sources));
        let runs = Arc::new(MemoryRunLogStore::new());
        let articles = Arc::new(MemoryArticleStore::new());
        let fetcher = Arc::new(fetcher);
        let launcher = Arc::new(launcher);
        let orchestrator = orchestrator(
            sources.clone(),
            runs.clone(),
            fetcher.clone(),
            launcher.clone(),
            articles.clone(),
            policy,
        );
        Self {
            sources,
            runs,
            articles,
            fetcher,
            launcher,
            orchestrator,
        }
    }
}
