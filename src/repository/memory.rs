//! In-memory stores for tests and dry runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use diesel::result::DatabaseErrorKind;

use super::pool::DbError;
use super::util::{database_error, to_diesel_error};
use super::{ArticleStore, RunLogStore, SourceRegistry};
use crate::models::{Article, FetchBookkeeping, RunLog, Source};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, DbError> {
    mutex.lock().map_err(to_diesel_error)
}

/// Sources kept in insertion order.
#[derive(Default)]
pub struct MemorySourceRegistry {
    sources: Mutex<Vec<Source>>,
}

impl MemorySourceRegistry {
    pub fn new(sources: Vec<Source>) -> Self {
        Self {
            sources: Mutex::new(sources),
        }
    }
}

#[async_trait]
impl SourceRegistry for MemorySourceRegistry {
    async fn get(&self, id: &str) -> Result<Option<Source>, DbError> {
        Ok(lock(&self.sources)?.iter().find(|s| s.id == id).cloned())
    }

    async fn list(&self) -> Result<Vec<Source>, DbError> {
        Ok(lock(&self.sources)?.clone())
    }

    async fn list_enabled(&self) -> Result<Vec<Source>, DbError> {
        Ok(lock(&self.sources)?
            .iter()
            .filter(|s| s.enabled)
            .cloned()
            .collect())
    }

    async fn save(&self, source: &Source) -> Result<(), DbError> {
        let mut sources = lock(&self.sources)?;
        match sources.iter_mut().find(|s| s.id == source.id) {
            Some(existing) => *existing = source.clone(),
            None => sources.push(source.clone()),
        }
        Ok(())
    }

    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool, DbError> {
        let mut sources = lock(&self.sources)?;
        Ok(match sources.iter_mut().find(|s| s.id == id) {
            Some(source) => {
                source.enabled = enabled;
                true
            }
            None => false,
        })
    }

    async fn record_fetch(&self, id: &str, fetch: &FetchBookkeeping) -> Result<(), DbError> {
        let mut sources = lock(&self.sources)?;
        let source = sources
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or(DbError::NotFound)?;
        source.last_fetched_at = Some(fetch.fetched_at);
        source.last_status = Some(fetch.status);
        source.last_fetch_message = Some(fetch.message.clone());
        source.last_error = fetch.error.clone();
        Ok(())
    }
}

/// Articles held in memory, optionally layered over a read-only base store.
///
/// With a base, lookups consult the base first and inserts stay in memory,
/// so a dry run dedups against the database without writing to it.
#[derive(Default)]
pub struct MemoryArticleStore {
    articles: Mutex<Vec<Article>>,
    base: Option<Arc<dyn ArticleStore>>,
}

impl MemoryArticleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn over(base: Arc<dyn ArticleStore>) -> Self {
        Self {
            articles: Mutex::new(Vec::new()),
            base: Some(base),
        }
    }

    /// Articles inserted into this store (not the base).
    pub fn articles(&self) -> Vec<Article> {
        self.articles
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl ArticleStore for MemoryArticleStore {
    async fn find_by_guid(&self, guid: &str) -> Result<Option<Article>, DbError> {
        if let Some(ref base) = self.base {
            if let Some(found) = base.find_by_guid(guid).await? {
                return Ok(Some(found));
            }
        }
        Ok(lock(&self.articles)?
            .iter()
            .find(|a| a.guid.as_deref() == Some(guid))
            .cloned())
    }

    async fn find_by_link(&self, link: &str) -> Result<Option<Article>, DbError> {
        if let Some(ref base) = self.base {
            if let Some(found) = base.find_by_link(link).await? {
                return Ok(Some(found));
            }
        }
        Ok(lock(&self.articles)?.iter().find(|a| a.link == link).cloned())
    }

    async fn insert(&self, article: &Article) -> Result<(), DbError> {
        let mut articles = lock(&self.articles)?;
        let duplicate = articles.iter().any(|a| {
            a.link == article.link || (a.guid.is_some() && a.guid == article.guid)
        });
        if duplicate {
            return Err(database_error(
                DatabaseErrorKind::UniqueViolation,
                format!("UNIQUE constraint failed: articles ({})", article.link),
            ));
        }
        articles.push(article.clone());
        Ok(())
    }

    async fn count(&self) -> Result<usize, DbError> {
        let base = match self.base {
            Some(ref base) => base.count().await?,
            None => 0,
        };
        Ok(base + lock(&self.articles)?.len())
    }
}

/// Run logs keyed by generated id.
#[derive(Default)]
pub struct MemoryRunLogStore {
    logs: Mutex<HashMap<String, RunLog>>,
}

impl MemoryRunLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<RunLog> {
        self.logs.lock().ok().and_then(|logs| logs.get(id).cloned())
    }
}

#[async_trait]
impl RunLogStore for MemoryRunLogStore {
    async fn create(&self, log: &RunLog) -> Result<String, DbError> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut stored = log.clone();
        stored.id = Some(id.clone());
        lock(&self.logs)?.insert(id.clone(), stored);
        Ok(id)
    }

    async fn update(&self, id: &str, log: &RunLog) -> Result<(), DbError> {
        let mut logs = lock(&self.logs)?;
        let slot = logs.get_mut(id).ok_or(DbError::NotFound)?;
        *slot = log.clone();
        slot.id = Some(id.to_string());
        Ok(())
    }

    async fn recent(&self, limit: usize) -> Result<Vec<RunLog>, DbError> {
        let mut logs: Vec<RunLog> = lock(&self.logs)?.values().cloned().collect();
        logs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        logs.truncate(limit);
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind;
    use chrono::Utc;

    fn article(link: &str, guid: Option<&str>) -> Article {
        let mut a = Article::new("T".into(), link.into(), "S".into(), Utc::now());
        a.guid = guid.map(str::to_string);
        a
    }

    #[tokio::test]
    async fn memory_articles_enforce_uniqueness() {
        let store = MemoryArticleStore::new();
        store.insert(&article("https://a", Some("g"))).await.unwrap();
        assert!(store.insert(&article("https://a", None)).await.is_err());
        assert!(store.insert(&article("https://b", Some("g"))).await.is_err());
        store.insert(&article("https://c", None)).await.unwrap();
        store.insert(&article("https://d", None)).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn overlay_reads_base_and_writes_memory() {
        let base = Arc::new(MemoryArticleStore::new());
        base.insert(&article("https://old", Some("old-guid")))
            .await
            .unwrap();

        let overlay = MemoryArticleStore::over(base.clone());
        assert!(overlay.find_by_guid("old-guid").await.unwrap().is_some());
        overlay.insert(&article("https://new", None)).await.unwrap();

        assert!(overlay.find_by_link("https://new").await.unwrap().is_some());
        assert!(base.find_by_link("https://new").await.unwrap().is_none());
        assert_eq!(overlay.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn memory_sources_record_fetch() {
        let registry = MemorySourceRegistry::new(vec![Source::new(
            "s".into(),
            "S".into(),
            "https://example.com".into(),
            SourceKind::Rss,
        )]);
        let fetch = FetchBookkeeping {
            fetched_at: Utc::now(),
            status: crate::models::SourceStatus::Success,
            message: "ok".into(),
            error: None,
        };
        registry.record_fetch("s", &fetch).await.unwrap();
        assert!(registry.record_fetch("x", &fetch).await.is_err());
        let s = registry.get("s").await.unwrap().unwrap();
        assert_eq!(s.last_fetch_message.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn memory_run_logs_update_in_place() {
        let store = MemoryRunLogStore::new();
        let mut log = RunLog::start();
        let id = store.create(&log).await.unwrap();
        log.finish();
        store.update(&id, &log).await.unwrap();
        assert_eq!(store.recent(5).await.unwrap().len(), 1);
        assert_eq!(
            store.get(&id).unwrap().status,
            crate::models::RunStatus::Completed
        );
        assert!(store.update("missing", &log).await.is_err());
    }
}
