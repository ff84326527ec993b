//! Website scraping configuration types.
//!
//! These structs define how articles are located on a listing page: one
//! container selector per article plus sub-selectors for each field. The
//! registry is static for the lifetime of a run and keyed by website id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Extraction rules for one website.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapingConfig {
    /// Registry key. Filled from the table key when loaded from settings.
    #[serde(default)]
    pub website_id: String,
    /// Display name (optional).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Base URL used to resolve relative article links.
    pub base_url: String,
    pub selectors: ArticleSelectors,
    #[serde(default, skip_serializing_if = "TitleCleaning::is_empty")]
    pub title_cleaning: TitleCleaning,
    /// Maximum articles kept from one page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_articles: Option<usize>,
    /// Drop articles whose date could not be extracted.
    #[serde(default)]
    pub skip_if_no_date: bool,
}

impl ScrapingConfig {
    /// Cap to apply given the run-wide article limit.
    pub fn effective_cap(&self, run_limit: usize) -> usize {
        match self.max_articles {
            Some(max) => max.min(run_limit),
            None => run_limit,
        }
    }

    /// Copy of this config with per-source selector overrides applied.
    pub fn with_overrides(&self, overrides: &SelectorOverrides) -> Self {
        let mut merged = self.clone();
        let s = &mut merged.selectors;
        if let Some(ref v) = overrides.container {
            s.container = v.clone();
        }
        if let Some(ref v) = overrides.title {
            s.title = Some(v.clone());
        }
        if let Some(ref v) = overrides.url {
            s.url = Some(v.clone());
        }
        if let Some(ref v) = overrides.description {
            s.description = Some(v.clone());
        }
        if let Some(ref v) = overrides.date {
            s.date = Some(v.clone());
        }
        if let Some(ref v) = overrides.date_attribute {
            s.date_attribute = Some(v.clone());
        }
        merged
    }
}

/// CSS selectors for one article on a listing page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticleSelectors {
    /// Matches one element per article.
    pub container: String,
    /// Title element inside the container. `None` uses the container text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Link element inside the container. `None` uses the container itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Attribute holding the link (default: `href`).
    #[serde(default = "default_url_attribute")]
    pub url_attribute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    /// Read the date from this attribute (e.g. `datetime`) instead of text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_attribute: Option<String>,
}

fn default_url_attribute() -> String {
    "href".to_string()
}

/// Title-cleaning rules, applied in order: prefixes, then patterns.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitleCleaning {
    /// Literal prefixes removed case-insensitively (e.g. "Breaking:").
    #[serde(default)]
    pub strip_prefixes: Vec<String>,
    /// Regular expressions whose matches are removed.
    #[serde(default)]
    pub remove_patterns: Vec<String>,
}

impl TitleCleaning {
    pub fn is_empty(&self) -> bool {
        self.strip_prefixes.is_empty() && self.remove_patterns.is_empty()
    }
}

/// Per-source selector overrides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorOverrides {
    #[serde(default)]
    pub container: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub date_attribute: Option<String>,
}

/// Static lookup of scraping configs by website id.
#[derive(Debug, Clone, Default)]
pub struct WebsiteRegistry {
    configs: BTreeMap<String, ScrapingConfig>,
}

impl WebsiteRegistry {
    /// Build a registry from a keyed table, stamping each config with its key.
    pub fn new(configs: BTreeMap<String, ScrapingConfig>) -> Self {
        let configs = configs
            .into_iter()
            .map(|(id, mut config)| {
                config.website_id = id.clone();
                (id, config)
            })
            .collect();
        Self { configs }
    }

    pub fn get(&self, website_id: &str) -> Option<&ScrapingConfig> {
        self.configs.get(website_id)
    }

    /// Look up a config and apply the source's overrides, if any.
    pub fn resolve(
        &self,
        website_id: &str,
        overrides: Option<&SelectorOverrides>,
    ) -> Option<ScrapingConfig> {
        let base = self.get(website_id)?;
        Some(match overrides {
            Some(o) => base.with_overrides(o),
            None => base.clone(),
        })
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.configs.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }
}
