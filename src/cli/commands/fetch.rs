//! Fetch command: runs the orchestrator once.

use std::sync::Arc;

use anyhow::Context;
use console::style;

use crate::cli::helpers::{build_router, open_database, truncate};
use crate::config::Settings;
use crate::ingest::{FetchOrchestrator, RunOptions};
use crate::models::{ProcessingSummary, RunResult, RunStatus, SourceStatus};
use crate::repository::{
    ArticleStore, DieselArticleRepository, DieselRunLogRepository, DieselSourceRepository,
    MemoryArticleStore, MemoryRunLogStore, MemorySourceRegistry, RunLogStore, SourceRegistry,
};
use crate::scrapers::{StrategyKind, StrategyPolicy};

/// Strategy selection from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StrategyArg {
    /// Per-website membership lists, then automatic fallback
    Auto,
    /// Plain HTTP fetch and parse
    Lightweight,
    /// Headless browser rendering
    Enhanced,
}

impl StrategyArg {
    /// Apply to a policy. `auto` clears any forced strategy from config.
    pub fn apply(self, mut policy: StrategyPolicy) -> StrategyPolicy {
        policy.force = match self {
            Self::Auto => None,
            Self::Lightweight => Some(StrategyKind::Lightweight),
            Self::Enhanced => Some(StrategyKind::Enhanced),
        };
        policy
    }
}

pub struct FetchOptions {
    pub article_limit: Option<usize>,
    pub strategy: Option<StrategyArg>,
    pub dry_run: bool,
}

/// Fetch one source, or every enabled source when `source_id` is `None`.
pub async fn cmd_fetch(
    settings: &Settings,
    source_id: Option<&str>,
    options: FetchOptions,
) -> anyhow::Result<()> {
    let pool = open_database(settings).await?;

    let mut run_options: RunOptions = settings.run_options();
    if let Some(limit) = options.article_limit {
        run_options.article_limit = limit;
    }
    let policy = match options.strategy {
        Some(arg) => arg.apply(settings.strategy.clone()),
        None => settings.strategy.clone(),
    };

    let db_sources: Arc<dyn SourceRegistry> = Arc::new(DieselSourceRepository::new(pool.clone()));
    let db_articles: Arc<dyn ArticleStore> = Arc::new(DieselArticleRepository::new(pool.clone()));

    let (sources, articles, runs): (
        Arc<dyn SourceRegistry>,
        Arc<dyn ArticleStore>,
        Arc<dyn RunLogStore>,
    ) = if options.dry_run {
        let snapshot = db_sources
            .list()
            .await
            .context("Failed to load sources")?;
        println!(
            "{} Dry run: nothing will be written to the database",
            style("!").yellow()
        );
        (
            Arc::new(MemorySourceRegistry::new(snapshot)) as Arc<dyn SourceRegistry>,
            Arc::new(MemoryArticleStore::over(db_articles)) as Arc<dyn ArticleStore>,
            Arc::new(MemoryRunLogStore::new()) as Arc<dyn RunLogStore>,
        )
    } else {
        (
            db_sources,
            db_articles,
            Arc::new(DieselRunLogRepository::new(pool.clone())) as Arc<dyn RunLogStore>,
        )
    };

    let router = build_router(settings, articles, policy)?;
    let orchestrator = FetchOrchestrator::new(sources, runs, router);

    let result = match source_id {
        Some(id) => orchestrator
            .run_single(id, run_options)
            .await
            .with_context(|| format!("Cannot fetch source '{}'", id))?,
        None => orchestrator.run_all(run_options).await,
    };

    print_result(&result, run_options.article_limit);

    if result.status == RunStatus::Failed {
        anyhow::bail!("Fetch run failed");
    }
    Ok(())
}

fn print_summary(summary: &ProcessingSummary) {
    let marker = match summary.status {
        SourceStatus::Success => style("✓").green(),
        SourceStatus::PartialSuccess => style("!").yellow(),
        SourceStatus::Failed => style("✗").red(),
    };
    let strategy = summary
        .strategy
        .map(|s| format!(" [{}]", s))
        .unwrap_or_default();

    println!(
        "{} {:<15} {:<8}{} {}",
        marker,
        truncate(&summary.source_id, 15),
        summary.source_type,
        strategy,
        summary.message
    );
    if let Some(ref error) = summary.fetch_error {
        println!("    {}", style(error).red());
    }
    for error in &summary.errors {
        println!("    {} {}", style("-").dim(), error);
    }
}

fn print_result(result: &RunResult, article_limit: usize) {
    println!();
    for summary in &result.summaries {
        print_summary(summary);
    }
    if result.summaries.is_empty() && result.status != RunStatus::Failed {
        println!("{} No enabled sources to fetch", style("!").yellow());
    }

    for error in &result.orchestration_errors {
        println!("{} {}", style("✗").red(), error);
    }

    let status = match result.status {
        RunStatus::Completed => style(result.status.as_str()).green(),
        RunStatus::CompletedWithErrors => style(result.status.as_str()).yellow(),
        _ => style(result.status.as_str()).red(),
    };
    println!("{}", "-".repeat(60));
    println!(
        "Run {}: {} ({} sources, {} failed, {} added, {} skipped, limit {})",
        result.run_id.as_deref().unwrap_or("-"),
        status,
        result.summaries.len(),
        result.sources_failed,
        result.items_added,
        result.items_skipped,
        article_limit
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_clears_configured_force() {
        let policy = StrategyPolicy {
            force: Some(StrategyKind::Enhanced),
            ..Default::default()
        };
        assert_eq!(StrategyArg::Auto.apply(policy.clone()).force, None);
        assert_eq!(
            StrategyArg::Lightweight.apply(policy).force,
            Some(StrategyKind::Lightweight)
        );
    }
}
