//! Diesel-based run log store for SQLite.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::models::{RunLogRecord, RunLogRow};
use super::pool::{DbError, SqlitePool};
use super::RunLogStore;
use crate::models::RunLog;
use crate::schema::run_logs;

#[derive(Clone)]
pub struct DieselRunLogRepository {
    pool: SqlitePool,
}

impl DieselRunLogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RunLogStore for DieselRunLogRepository {
    async fn create(&self, log: &RunLog) -> Result<String, DbError> {
        let mut conn = self.pool.get().await?;
        let id = uuid::Uuid::new_v4().to_string();

        diesel::insert_into(run_logs::table)
            .values(RunLogRow::from_log(&id, log))
            .execute(&mut conn)
            .await?;

        Ok(id)
    }

    async fn update(&self, id: &str, log: &RunLog) -> Result<(), DbError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(run_logs::table.find(id))
            .set(RunLogRow::from_log(id, log))
            .execute(&mut conn)
            .await?;

        if rows == 0 {
            return Err(DbError::NotFound);
        }
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<RunLog>, DbError> {
        let mut conn = self.pool.get().await?;

        run_logs::table
            .order(run_logs::started_at.desc())
            .limit(i64::try_from(limit).unwrap_or(i64::MAX))
            .select(RunLogRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(RunLog::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProcessingSummary, RunStatus, Source, SourceKind};
    use crate::repository::run_migrations;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselRunLogRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let pool = SqlitePool::from_path(&dir.path().join("test.db"));
        run_migrations(&pool).await.unwrap();
        (DieselRunLogRepository::new(pool), dir)
    }

    #[tokio::test]
    async fn create_then_finalize_in_place() {
        let (repo, _dir) = setup_test_db().await;

        let mut log = RunLog::start();
        let id = repo.create(&log).await.unwrap();

        let stored = repo.recent(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, RunStatus::InProgress);
        assert_eq!(stored[0].id.as_deref(), Some(id.as_str()));

        let source = Source::new(
            "feed".into(),
            "Feed".into(),
            "https://example.com/feed.xml".into(),
            SourceKind::Rss,
        );
        log.record(ProcessingSummary::failed(&source, "HTTP 404"));
        log.finish();
        repo.update(&id, &log).await.unwrap();

        let stored = repo.recent(10).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, RunStatus::CompletedWithErrors);
        assert_eq!(stored[0].sources_failed, 1);
        assert_eq!(stored[0].summaries[0].fetch_error.as_deref(), Some("HTTP 404"));
        assert!(stored[0].finished_at.is_some());
    }

    #[tokio::test]
    async fn update_of_unknown_run_fails() {
        let (repo, _dir) = setup_test_db().await;
        assert!(matches!(
            repo.update("nope", &RunLog::start()).await,
            Err(DbError::NotFound)
        ));
    }
}
