//! Diesel-based source registry for SQLite.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{NewSource, SourceRecord};
use super::pool::{DbError, SqlitePool};
use super::util::format_datetime;
use super::SourceRegistry;
use crate::models::{FetchBookkeeping, Source};
use crate::schema::sources;

/// Diesel-based source repository with compile-time query checking.
#[derive(Clone)]
pub struct DieselSourceRepository {
    pool: SqlitePool,
}

impl DieselSourceRepository {
    /// Create a new Diesel source repository with an existing pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRegistry for DieselSourceRepository {
    async fn get(&self, id: &str) -> Result<Option<Source>, DbError> {
        let mut conn = self.pool.get().await?;

        sources::table
            .find(id)
            .select(SourceRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Source::from))
    }

    async fn list(&self) -> Result<Vec<Source>, DbError> {
        let mut conn = self.pool.get().await?;

        sources::table
            .order((sources::created_at.asc(), sources::id.asc()))
            .select(SourceRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Source::from).collect())
    }

    async fn list_enabled(&self) -> Result<Vec<Source>, DbError> {
        let mut conn = self.pool.get().await?;

        sources::table
            .filter(sources::enabled.eq(true))
            .order((sources::created_at.asc(), sources::id.asc()))
            .select(SourceRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Source::from).collect())
    }

    async fn save(&self, source: &Source) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        // Use replace_into for SQLite upsert
        diesel::replace_into(sources::table)
            .values(NewSource::from(source))
            .execute(&mut conn)
            .await?;

        Ok(())
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool, DbError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(sources::table.find(id))
            .set(sources::enabled.eq(enabled))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    async fn record_fetch(&self, id: &str, fetch: &FetchBookkeeping) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(sources::table.find(id))
            .set((
                sources::last_fetched_at.eq(Some(format_datetime(&fetch.fetched_at))),
                sources::last_status.eq(Some(fetch.status.as_str())),
                sources::last_fetch_message.eq(Some(&fetch.message)),
                sources::last_error.eq(fetch.error.as_deref()),
            ))
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SourceKind, SourceScraping, SourceStatus};
    use crate::repository::run_migrations;
    use chrono::{Duration, Utc};
    use tempfile::tempdir;

    async fn setup_test_db() -> (SqlitePool, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let pool = SqlitePool::from_path(&dir.path().join("test.db"));
        run_migrations(&pool).await.unwrap();
        (pool, dir)
    }

    fn source(id: &str, offset_secs: i64) -> Source {
        let mut s = Source::new(
            id.to_string(),
            format!("Source {}", id),
            format!("https://example.com/{}.xml", id),
            SourceKind::Rss,
        );
        s.created_at = Utc::now() + Duration::seconds(offset_secs);
        s
    }

    #[tokio::test]
    async fn test_source_crud() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselSourceRepository::new(pool);

        let html = source("page", 0).with_scraping(SourceScraping {
            website_id: Some("example".into()),
            ..Default::default()
        });
        repo.save(&html).await.unwrap();

        let fetched = repo.get("page").await.unwrap().unwrap();
        assert_eq!(fetched.name, "Source page");
        assert_eq!(fetched.website_id(), Some("example"));
        assert!(fetched.enabled);
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn enabled_sources_in_registry_order() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselSourceRepository::new(pool);

        repo.save(&source("c", 10)).await.unwrap();
        repo.save(&source("a", 20)).await.unwrap();
        repo.save(&source("b", 0)).await.unwrap();
        assert!(repo.set_enabled("a", false).await.unwrap());
        assert!(!repo.set_enabled("nope", false).await.unwrap());

        let ids: Vec<_> = repo
            .list_enabled()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["b", "c"]);
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn unknown_source_type_is_preserved() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselSourceRepository::new(pool);

        let mut s = source("atom", 0);
        s.kind = SourceKind::Other("atom".into());
        repo.save(&s).await.unwrap();

        let fetched = repo.get("atom").await.unwrap().unwrap();
        assert_eq!(fetched.kind, SourceKind::Other("atom".into()));
    }

    #[tokio::test]
    async fn record_fetch_writes_bookkeeping() {
        let (pool, _dir) = setup_test_db().await;
        let repo = DieselSourceRepository::new(pool);
        repo.save(&source("feed", 0)).await.unwrap();

        let fetch = FetchBookkeeping {
            fetched_at: Utc::now(),
            status: SourceStatus::Failed,
            message: "Fetch failed: HTTP 500".into(),
            error: Some("HTTP 500".into()),
        };
        repo.record_fetch("feed", &fetch).await.unwrap();

        let fetched = repo.get("feed").await.unwrap().unwrap();
        assert_eq!(fetched.last_status, Some(SourceStatus::Failed));
        assert_eq!(fetched.last_error.as_deref(), Some("HTTP 500"));
        assert!(fetched.last_fetched_at.is_some());

        assert!(matches!(
            repo.record_fetch("missing", &fetch).await,
            Err(DbError::NotFound)
        ));
    }
}
