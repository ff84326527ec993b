//! Article extraction from a listing page's HTML.
//!
//! Both scraping strategies end up here: the lightweight strategy with the
//! body of a plain HTTP GET, the enhanced strategy with the DOM serialized
//! out of a rendered browser page.

use std::collections::HashSet;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::config::{ScrapingConfig, TitleCleaning};
use crate::error::ScrapeError;
use crate::models::ScrapedArticle;
use crate::utils::collapse_whitespace;

/// Articles kept from one page plus how many candidates there were before
/// the cap was applied.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    pub articles: Vec<ScrapedArticle>,
    /// Distinct, usable articles on the page before truncation.
    pub candidates: usize,
}

impl Extraction {
    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }
}

fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn parse_optional(selector: Option<&str>) -> Result<Option<Selector>, ScrapeError> {
    selector
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(parse_selector)
        .transpose()
}

/// Compiled selectors for one extraction pass.
struct CompiledSelectors {
    container: Selector,
    title: Option<Selector>,
    url: Option<Selector>,
    description: Option<Selector>,
    date: Option<Selector>,
}

impl CompiledSelectors {
    fn compile(config: &ScrapingConfig) -> Result<Self, ScrapeError> {
        let s = &config.selectors;
        Ok(Self {
            container: parse_selector(&s.container)?,
            title: parse_optional(s.title.as_deref())?,
            url: parse_optional(s.url.as_deref())?,
            description: parse_optional(s.description.as_deref())?,
            date: parse_optional(s.date.as_deref())?,
        })
    }
}

/// Compiled title-cleaning rules.
pub struct TitleCleaner {
    prefixes: Vec<String>,
    patterns: Vec<Regex>,
}

impl TitleCleaner {
    pub fn new(rules: &TitleCleaning) -> Result<Self, ScrapeError> {
        let patterns = rules
            .remove_patterns
            .iter()
            .map(|p| {
                Regex::new(p).map_err(|e| {
                    ScrapeError::Config(format!("Invalid title pattern '{}': {}", p, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            prefixes: rules
                .strip_prefixes
                .iter()
                .map(|p| p.to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
            patterns,
        })
    }

    pub fn clean(&self, title: &str) -> String {
        let mut title = collapse_whitespace(title);

        // Prefixes can stack ("Breaking: Live: ...").
        loop {
            let stripped = self.prefixes.iter().find_map(|p| strip_prefix_ignore_case(&title, p));
            let Some(rest) = stripped else { break };
            title = rest.trim_start().to_string();
        }

        for pattern in &self.patterns {
            title = pattern.replace_all(&title, "").into_owned();
        }

        collapse_whitespace(&title)
    }
}

/// Strip an already-lowercased `prefix` from `s`, comparing case-insensitively
/// one char at a time so the cut lands on a char boundary of `s`.
fn strip_prefix_ignore_case<'a>(s: &'a str, prefix: &str) -> Option<&'a str> {
    let mut expected = prefix.chars().peekable();
    for (i, c) in s.char_indices() {
        if expected.peek().is_none() {
            return Some(&s[i..]);
        }
        for lc in c.to_lowercase() {
            if expected.next() != Some(lc) {
                return None;
            }
        }
    }
    expected.next().is_none().then_some("")
}

fn element_text(el: &ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

fn first_match<'a>(
    container: &ElementRef<'a>,
    selector: Option<&Selector>,
) -> Option<ElementRef<'a>> {
    match selector {
        Some(sel) => container.select(sel).next(),
        None => Some(*container),
    }
}

/// Resolve an href against the website base URL. Fragments, `javascript:`
/// and `mailto:` links are not article URLs.
pub fn resolve_article_url(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty()
        || href.starts_with('#')
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
    {
        return None;
    }
    let mut resolved = base.join(href).ok()?;
    resolved.set_fragment(None);
    match resolved.scheme() {
        "http" | "https" => Some(resolved.to_string()),
        _ => None,
    }
}

/// Extract articles from page HTML using the website's selectors.
///
/// Articles are de-duplicated by resolved URL, optionally dropped when they
/// lack a date, then truncated to `cap`.
pub fn extract_articles(
    html: &str,
    config: &ScrapingConfig,
    cap: usize,
) -> Result<Extraction, ScrapeError> {
    let selectors = CompiledSelectors::compile(config)?;
    let cleaner = TitleCleaner::new(&config.title_cleaning)?;
    let base = Url::parse(&config.base_url)
        .map_err(|_| ScrapeError::InvalidUrl(config.base_url.clone()))?;
    let url_attribute = config.selectors.url_attribute.as_str();
    let date_attribute = config.selectors.date_attribute.as_deref();

    let document = Html::parse_document(html);
    let mut seen = HashSet::new();
    let mut articles = Vec::new();

    for container in document.select(&selectors.container) {
        let Some(url) = first_match(&container, selectors.url.as_ref())
            .and_then(|el| el.value().attr(url_attribute))
            .and_then(|href| resolve_article_url(&base, href))
        else {
            continue;
        };

        if !seen.insert(url.clone()) {
            continue;
        }

        let title = first_match(&container, selectors.title.as_ref())
            .map(|el| element_text(&el))
            .map(|t| cleaner.clean(&t))
            .unwrap_or_default();

        let description = selectors
            .description
            .as_ref()
            .and_then(|sel| container.select(sel).next())
            .map(|el| element_text(&el))
            .filter(|d| !d.is_empty());

        let published_date = selectors
            .date
            .as_ref()
            .and_then(|sel| container.select(sel).next())
            .and_then(|el| match date_attribute {
                Some(attr) => el.value().attr(attr).map(str::to_string),
                None => Some(element_text(&el)),
            })
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        if config.skip_if_no_date && published_date.is_none() {
            continue;
        }

        articles.push(ScrapedArticle {
            title,
            url,
            description,
            published_date,
            source: config.website_id.clone(),
        });
    }

    let candidates = articles.len();
    articles.truncate(cap);

    Ok(Extraction {
        articles,
        candidates,
    })
}
