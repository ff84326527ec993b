//! Scraper strategy selection.
//!
//! Two interchangeable extraction strategies sit behind [`ExtractionStrategy`]:
//! a lightweight one (plain HTTP GET) and an enhanced one (headless browser).
//! Which one runs is decided by [`plan_strategy`]; under `auto` the lightweight
//! result is kept unless it looks too thin, see [`needs_fallback`] and
//! [`resolve_auto`]. Both decisions are pure so they can be tested without
//! any network or browser I/O.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::browser::{with_browser_page, BrowserLauncher};
use super::config::ScrapingConfig;
use super::extract::{extract_articles, Extraction};
use super::http_client::PageFetcher;
use crate::error::ScrapeError;

/// Lightweight results with fewer candidates than this trigger an enhanced
/// attempt under `auto`.
pub const AUTO_FALLBACK_THRESHOLD: usize = 3;

/// A concrete extraction strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Lightweight,
    Enhanced,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Lightweight => "lightweight",
            Self::Enhanced => "enhanced",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lightweight" | "http" => Ok(Self::Lightweight),
            "enhanced" | "browser" => Ok(Self::Enhanced),
            other => Err(format!("Unknown strategy '{}'", other)),
        }
    }
}

/// What to run for one website.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyPlan {
    /// Run exactly this strategy.
    Fixed(StrategyKind),
    /// Lightweight first, enhanced when the result is too thin.
    Auto,
}

/// Static strategy policy from settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyPolicy {
    /// Forces one strategy for every website in the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force: Option<StrategyKind>,
    /// Websites that always need a rendered page.
    #[serde(default)]
    pub enhanced_websites: BTreeSet<String>,
    /// Websites that must never launch a browser.
    #[serde(default)]
    pub lightweight_websites: BTreeSet<String>,
}

/// Decide what to run for `website_id`.
///
/// Priority: run-wide force, then the source's own forced strategy, then
/// website membership lists, then auto.
pub fn plan_strategy(
    policy: &StrategyPolicy,
    source_override: Option<StrategyKind>,
    website_id: &str,
) -> StrategyPlan {
    if let Some(kind) = policy.force.or(source_override) {
        return StrategyPlan::Fixed(kind);
    }
    if policy.enhanced_websites.contains(website_id) {
        return StrategyPlan::Fixed(StrategyKind::Enhanced);
    }
    if policy.lightweight_websites.contains(website_id) {
        return StrategyPlan::Fixed(StrategyKind::Lightweight);
    }
    StrategyPlan::Auto
}

/// Whether a lightweight attempt should be followed by an enhanced one.
pub fn needs_fallback(lightweight: &Result<Extraction, ScrapeError>) -> bool {
    match lightweight {
        Ok(extraction) => extraction.candidates < AUTO_FALLBACK_THRESHOLD,
        Err(_) => true,
    }
}

/// Pick the auto result once both attempts have run.
///
/// A non-empty enhanced result wins. Otherwise the lightweight outcome
/// stands, including its error if it had one.
pub fn resolve_auto(
    lightweight: Result<Extraction, ScrapeError>,
    enhanced: Result<Extraction, ScrapeError>,
) -> (Result<Extraction, ScrapeError>, StrategyKind) {
    match enhanced {
        Ok(extraction) if !extraction.is_empty() => (Ok(extraction), StrategyKind::Enhanced),
        Ok(_) => (lightweight, StrategyKind::Lightweight),
        Err(e) => {
            warn!(error = %e, "Enhanced fallback failed, keeping lightweight result");
            (lightweight, StrategyKind::Lightweight)
        }
    }
}

/// One way of turning a listing page URL into articles.
#[async_trait]
pub trait ExtractionStrategy: Send + Sync {
    /// Extract at most `cap` articles from the page at `url`.
    async fn extract(
        &self,
        url: &str,
        config: &ScrapingConfig,
        cap: usize,
    ) -> Result<Extraction, ScrapeError>;
}

/// Plain HTTP GET plus DOM extraction.
pub struct LightweightStrategy {
    fetcher: Arc<dyn PageFetcher>,
}

impl LightweightStrategy {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl ExtractionStrategy for LightweightStrategy {
    async fn extract(
        &self,
        url: &str,
        config: &ScrapingConfig,
        cap: usize,
    ) -> Result<Extraction, ScrapeError> {
        let html = self.fetcher.fetch_text(url).await?;
        extract_articles(&html, config, cap)
    }
}

/// Headless browser render plus the same DOM extraction.
pub struct EnhancedStrategy {
    launcher: Arc<dyn BrowserLauncher>,
}

impl EnhancedStrategy {
    pub fn new(launcher: Arc<dyn BrowserLauncher>) -> Self {
        Self { launcher }
    }
}

#[async_trait]
impl ExtractionStrategy for EnhancedStrategy {
    async fn extract(
        &self,
        url: &str,
        config: &ScrapingConfig,
        cap: usize,
    ) -> Result<Extraction, ScrapeError> {
        with_browser_page(self.launcher.as_ref(), url, |html| {
            extract_articles(html, config, cap)
        })
        .await
    }
}

/// Result of a scrape and the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapeOutcome {
    pub extraction: Extraction,
    pub strategy: StrategyKind,
    /// True when auto mode ran the enhanced strategy after a thin result.
    pub fell_back: bool,
}

/// Runs the planned strategy (or the auto sequence) for one website.
pub struct ScraperSelector {
    lightweight: Arc<dyn ExtractionStrategy>,
    enhanced: Arc<dyn ExtractionStrategy>,
    policy: StrategyPolicy,
}

impl ScraperSelector {
    pub fn new(
        lightweight: Arc<dyn ExtractionStrategy>,
        enhanced: Arc<dyn ExtractionStrategy>,
        policy: StrategyPolicy,
    ) -> Self {
        Self {
            lightweight,
            enhanced,
            policy,
        }
    }

    /// Selector over the HTTP fetcher and a browser launcher.
    pub fn with_defaults(
        fetcher: Arc<dyn PageFetcher>,
        launcher: Arc<dyn BrowserLauncher>,
        policy: StrategyPolicy,
    ) -> Self {
        Self::new(
            Arc::new(LightweightStrategy::new(fetcher)),
            Arc::new(EnhancedStrategy::new(launcher)),
            policy,
        )
    }

    fn strategy(&self, kind: StrategyKind) -> &dyn ExtractionStrategy {
        match kind {
            StrategyKind::Lightweight => self.lightweight.as_ref(),
            StrategyKind::Enhanced => self.enhanced.as_ref(),
        }
    }

    pub async fn scrape(
        &self,
        url: &str,
        config: &ScrapingConfig,
        source_override: Option<StrategyKind>,
        cap: usize,
    ) -> Result<ScrapeOutcome, ScrapeError> {
        let plan = plan_strategy(&self.policy, source_override, &config.website_id);
        debug!(website = %config.website_id, ?plan, "Planned scrape strategy");

        match plan {
            StrategyPlan::Fixed(kind) => {
                let extraction = self.strategy(kind).extract(url, config, cap).await?;
                Ok(ScrapeOutcome {
                    extraction,
                    strategy: kind,
                    fell_back: false,
                })
            }
            StrategyPlan::Auto => {
                let lightweight = self.lightweight.extract(url, config, cap).await;
                if !needs_fallback(&lightweight) {
                    return lightweight.map(|extraction| ScrapeOutcome {
                        extraction,
                        strategy: StrategyKind::Lightweight,
                        fell_back: false,
                    });
                }

                match &lightweight {
                    Ok(e) => info!(
                        website = %config.website_id,
                        candidates = e.candidates,
                        "Lightweight scrape found too few articles, trying enhanced"
                    ),
                    Err(e) => info!(
                        website = %config.website_id,
                        error = %e,
                        "Lightweight scrape failed, trying enhanced"
                    ),
                }

                let enhanced = self.enhanced.extract(url, config, cap).await;
                let (result, strategy) = resolve_auto(lightweight, enhanced);
                result.map(|extraction| ScrapeOutcome {
                    extraction,
                    strategy,
                    fell_back: true,
                })
            }
        }
    }
}
