//! Shared helper functions for CLI commands.

use std::sync::Arc;

use anyhow::Context;

use crate::config::Settings;
use crate::ingest::SourceRouter;
use crate::repository::{run_migrations, ArticleStore, SqlitePool};
use crate::scrapers::{default_launcher, HttpClient, StrategyPolicy};

/// Truncate a string to at most `max_chars` characters, marking the cut.
pub fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    let cut: String = s.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", cut)
}

/// Open the configured database, creating the schema if needed.
pub async fn open_database(settings: &Settings) -> anyhow::Result<SqlitePool> {
    settings
        .ensure_directories()
        .context("Failed to prepare data directory")?;
    let pool = SqlitePool::new(&settings.database_url());
    run_migrations(&pool)
        .await
        .with_context(|| format!("Failed to initialize database {}", pool.database_url()))?;
    Ok(pool)
}

/// Build the source router from settings over the given article store.
pub fn build_router(
    settings: &Settings,
    articles: Arc<dyn ArticleStore>,
    policy: StrategyPolicy,
) -> anyhow::Result<SourceRouter> {
    let fetcher =
        HttpClient::with_user_agent(settings.http_timeout(), settings.user_agent.as_deref())
            .context("Failed to create HTTP client")?;
    Ok(SourceRouter::build(
        Arc::new(fetcher),
        default_launcher(settings.browser.clone()),
        articles,
        Arc::new(settings.website_registry()),
        policy,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer source name", 10), "a longe...");
    }
}
