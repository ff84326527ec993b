//! Repository layer for database persistence.
//!
//! The ingestion pipeline talks to three store traits. Each has a Diesel
//! implementation over SQLite and an in-memory one used by tests and by
//! dry runs.

pub mod article;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod pool;
pub mod run_log;
pub mod source;
pub mod util;

use async_trait::async_trait;

use crate::models::{Article, FetchBookkeeping, RunLog, Source};

pub use article::DieselArticleRepository;
pub use memory::{MemoryArticleStore, MemoryRunLogStore, MemorySourceRegistry};
pub use migrations::run_migrations;
pub use pool::{DbError, SqlitePool};
pub use run_log::DieselRunLogRepository;
pub use source::DieselSourceRepository;

/// Configured sources, in registry order (`created_at`, then `id`).
#[async_trait]
pub trait SourceRegistry: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<Source>, DbError>;

    async fn list(&self) -> Result<Vec<Source>, DbError>;

    async fn list_enabled(&self) -> Result<Vec<Source>, DbError>;

    /// Insert or replace a source.
    async fn save(&self, source: &Source) -> Result<(), DbError>;

    /// Returns false when no such source exists.
    async fn set_enabled(&self, id: &str, enabled: bool) -> Result<bool, DbError>;

    /// Write back the last-fetch fields after an attempt.
    async fn record_fetch(&self, id: &str, fetch: &FetchBookkeeping) -> Result<(), DbError>;
}

/// Canonical articles. `link` is unique, and so is `guid` when present.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    async fn find_by_guid(&self, guid: &str) -> Result<Option<Article>, DbError>;

    async fn find_by_link(&self, link: &str) -> Result<Option<Article>, DbError>;

    /// Insert a new article. Fails on a duplicate link or guid.
    async fn insert(&self, article: &Article) -> Result<(), DbError>;

    async fn count(&self) -> Result<usize, DbError>;
}

/// Run logs: inserted once in progress, updated in place once finalized.
#[async_trait]
pub trait RunLogStore: Send + Sync {
    /// Persist a new log and return its id.
    async fn create(&self, log: &RunLog) -> Result<String, DbError>;

    async fn update(&self, id: &str, log: &RunLog) -> Result<(), DbError>;

    /// Most recent runs first.
    async fn recent(&self, limit: usize) -> Result<Vec<RunLog>, DbError>;
}
