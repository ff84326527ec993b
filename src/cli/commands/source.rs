//! Source management commands.

use anyhow::Context;
use console::style;

use crate::cli::helpers::{open_database, truncate};
use crate::config::Settings;
use crate::models::{Source, SourceKind, SourceScraping};
use crate::repository::{DieselSourceRepository, SourceRegistry};
use crate::scrapers::StrategyKind;

/// Arguments of `source add`.
pub struct NewSourceArgs {
    pub id: String,
    pub name: String,
    pub url: String,
    pub kind: String,
    pub website: Option<String>,
    pub strategy: Option<StrategyKind>,
    pub enabled: bool,
}

impl NewSourceArgs {
    fn into_source(self) -> Source {
        let scraping = if self.website.is_some() || self.strategy.is_some() {
            Some(SourceScraping {
                website_id: self.website,
                strategy: self.strategy,
                selectors: None,
            })
        } else {
            None
        };

        let mut source = Source::new(self.id, self.name, self.url, SourceKind::parse(&self.kind));
        source.enabled = self.enabled;
        source.scraping = scraping;
        source
    }
}

/// List configured sources.
pub async fn cmd_source_list(settings: &Settings) -> anyhow::Result<()> {
    let repo = DieselSourceRepository::new(open_database(settings).await?);
    let sources = repo.list().await.context("Failed to load sources")?;

    if sources.is_empty() {
        println!(
            "{} No sources configured. Add one with 'feedacquire source add'.",
            style("!").yellow()
        );
        return Ok(());
    }

    println!("\n{}", style("Sources").bold());
    println!("{}", "-".repeat(80));
    println!(
        "{:<15} {:<25} {:<6} {:<8} {:<16} Last Status",
        "ID", "Name", "Type", "Enabled", "Last Fetched"
    );
    println!("{}", "-".repeat(80));

    for source in sources {
        let last_fetched = source
            .last_fetched_at
            .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "Never".to_string());
        let last_status = source
            .last_status
            .map(|s| s.as_str().to_string())
            .unwrap_or_else(|| "-".to_string());

        println!(
            "{:<15} {:<25} {:<6} {:<8} {:<16} {}",
            truncate(&source.id, 15),
            truncate(&source.name, 24),
            source.kind.as_str(),
            if source.enabled { "yes" } else { "no" },
            last_fetched,
            last_status
        );
        if let Some(ref error) = source.last_error {
            println!("    {}", style(truncate(error, 74)).red());
        }
    }

    Ok(())
}

/// Add or replace a source.
pub async fn cmd_source_add(settings: &Settings, args: NewSourceArgs) -> anyhow::Result<()> {
    let source = args.into_source();

    if let SourceKind::Other(ref kind) = source.kind {
        println!(
            "{} Source type '{}' is not supported; fetches of this source will fail",
            style("!").yellow(),
            kind
        );
    }
    if source.kind == SourceKind::Html && source.website_id().is_none() {
        println!(
            "{} HTML source has no --website; fetches of this source will fail",
            style("!").yellow()
        );
    }

    let repo = DieselSourceRepository::new(open_database(settings).await?);
    repo.save(&source)
        .await
        .with_context(|| format!("Failed to save source '{}'", source.id))?;

    println!(
        "{} Saved source {} ({}, {})",
        style("✓").green(),
        source.id,
        source.kind,
        if source.enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

/// Enable or disable a source.
pub async fn cmd_source_set_enabled(
    settings: &Settings,
    id: &str,
    enabled: bool,
) -> anyhow::Result<()> {
    let repo = DieselSourceRepository::new(open_database(settings).await?);
    let found = repo
        .set_enabled(id, enabled)
        .await
        .with_context(|| format!("Failed to update source '{}'", id))?;

    if !found {
        println!("{} Source '{}' not found", style("✗").red(), id);
        return Ok(());
    }

    println!(
        "{} Source {} {}",
        style("✓").green(),
        id,
        if enabled { "enabled" } else { "disabled" }
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(kind: &str, website: Option<&str>) -> NewSourceArgs {
        NewSourceArgs {
            id: "s".into(),
            name: "S".into(),
            url: "https://example.com".into(),
            kind: kind.into(),
            website: website.map(str::to_string),
            strategy: None,
            enabled: true,
        }
    }

    #[test]
    fn rss_source_has_no_scraping() {
        let source = args("rss", None).into_source();
        assert_eq!(source.kind, SourceKind::Rss);
        assert!(source.scraping.is_none());
    }

    #[test]
    fn html_source_carries_website() {
        let source = args("HTML", Some("example")).into_source();
        assert_eq!(source.kind, SourceKind::Html);
        assert_eq!(source.website_id(), Some("example"));
    }
}
