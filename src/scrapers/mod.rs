//! Page fetching and article extraction for scraped sources.

pub mod browser;
pub mod config;
pub mod extract;
pub mod http_client;
pub mod strategy;

pub use browser::{default_launcher, with_browser_page, BrowserEngineConfig, BrowserLauncher};
pub use config::{ScrapingConfig, SelectorOverrides, WebsiteRegistry};
pub use extract::{extract_articles, Extraction};
pub use http_client::{HttpClient, PageFetcher};
pub use strategy::{
    ExtractionStrategy, ScrapeOutcome, ScraperSelector, StrategyKind, StrategyPolicy,
    AUTO_FALLBACK_THRESHOLD,
};
