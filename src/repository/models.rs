//! Diesel ORM records for database tables.
//!
//! Timestamps are stored as fixed-width RFC 3339 text; structured fields
//! (scraping settings, categories, summaries) as JSON text.

use diesel::prelude::*;

use super::util::{format_datetime, parse_datetime, parse_datetime_opt};
use crate::models::{
    Article, ProcessingSummary, RunLog, RunStatus, Source, SourceKind, SourceStatus,
};
use crate::schema;

/// Source record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::sources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SourceRecord {
    pub id: String,
    pub name: String,
    pub url: String,
    pub source_type: String,
    pub enabled: bool,
    pub scraping: Option<String>,
    pub created_at: String,
    pub last_fetched_at: Option<String>,
    pub last_status: Option<String>,
    pub last_fetch_message: Option<String>,
    pub last_error: Option<String>,
}

/// New or replacement source row.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::sources)]
pub struct NewSource {
    pub id: String,
    pub name: String,
    pub url: String,
    pub source_type: String,
    pub enabled: bool,
    pub scraping: Option<String>,
    pub created_at: String,
    pub last_fetched_at: Option<String>,
    pub last_status: Option<String>,
    pub last_fetch_message: Option<String>,
    pub last_error: Option<String>,
}

impl From<SourceRecord> for Source {
    fn from(record: SourceRecord) -> Self {
        Source {
            id: record.id,
            name: record.name,
            url: record.url,
            kind: SourceKind::parse(&record.source_type),
            enabled: record.enabled,
            scraping: record
                .scraping
                .and_then(|s| serde_json::from_str(&s).ok()),
            created_at: parse_datetime(&record.created_at),
            last_fetched_at: parse_datetime_opt(record.last_fetched_at),
            last_status: record.last_status.as_deref().and_then(SourceStatus::from_str),
            last_fetch_message: record.last_fetch_message,
            last_error: record.last_error,
        }
    }
}

impl From<&Source> for NewSource {
    fn from(source: &Source) -> Self {
        NewSource {
            id: source.id.clone(),
            name: source.name.clone(),
            url: source.url.clone(),
            source_type: source.kind.as_str().to_string(),
            enabled: source.enabled,
            scraping: source
                .scraping
                .as_ref()
                .and_then(|s| serde_json::to_string(s).ok()),
            created_at: format_datetime(&source.created_at),
            last_fetched_at: source.last_fetched_at.as_ref().map(format_datetime),
            last_status: source.last_status.map(|s| s.as_str().to_string()),
            last_fetch_message: source.last_fetch_message.clone(),
            last_error: source.last_error.clone(),
        }
    }
}

/// Article record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::articles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ArticleRecord {
    pub id: String,
    pub title: String,
    pub link: String,
    pub source_name: String,
    pub published_date: String,
    pub description: Option<String>,
    pub guid: Option<String>,
    pub fetched_at: String,
    pub is_read: bool,
    pub is_starred: bool,
    pub is_hidden: bool,
    pub categories: String,
}

/// New article for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::articles)]
pub struct NewArticle<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub link: &'a str,
    pub source_name: &'a str,
    pub published_date: String,
    pub description: Option<&'a str>,
    pub guid: Option<&'a str>,
    pub fetched_at: String,
    pub is_read: bool,
    pub is_starred: bool,
    pub is_hidden: bool,
    pub categories: String,
}

impl From<ArticleRecord> for Article {
    fn from(record: ArticleRecord) -> Self {
        Article {
            id: record.id,
            title: record.title,
            link: record.link,
            source_name: record.source_name,
            published_date: parse_datetime(&record.published_date),
            description: record.description,
            guid: record.guid,
            fetched_at: parse_datetime(&record.fetched_at),
            is_read: record.is_read,
            is_starred: record.is_starred,
            is_hidden: record.is_hidden,
            categories: serde_json::from_str(&record.categories).unwrap_or_default(),
        }
    }
}

impl<'a> From<&'a Article> for NewArticle<'a> {
    fn from(article: &'a Article) -> Self {
        NewArticle {
            id: &article.id,
            title: &article.title,
            link: &article.link,
            source_name: &article.source_name,
            published_date: format_datetime(&article.published_date),
            description: article.description.as_deref(),
            guid: article.guid.as_deref(),
            fetched_at: format_datetime(&article.fetched_at),
            is_read: article.is_read,
            is_starred: article.is_starred,
            is_hidden: article.is_hidden,
            categories: serde_json::to_string(&article.categories)
                .unwrap_or_else(|_| "[]".to_string()),
        }
    }
}

/// Run log record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::run_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RunLogRecord {
    pub id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub sources_total: i32,
    pub sources_failed: i32,
    pub items_added: i32,
    pub items_skipped: i32,
    pub summaries: String,
    pub orchestration_errors: String,
}

/// Full run log row, used for both the initial insert and the final update.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::run_logs)]
pub struct RunLogRow {
    pub id: String,
    pub started_at: String,
    pub finished_at: Option<String>,
    pub status: String,
    pub sources_total: i32,
    pub sources_failed: i32,
    pub items_added: i32,
    pub items_skipped: i32,
    pub summaries: String,
    pub orchestration_errors: String,
}

impl RunLogRow {
    pub fn from_log(id: &str, log: &RunLog) -> Self {
        RunLogRow {
            id: id.to_string(),
            started_at: format_datetime(&log.started_at),
            finished_at: log.finished_at.as_ref().map(format_datetime),
            status: log.status.as_str().to_string(),
            sources_total: count(log.sources_total),
            sources_failed: count(log.sources_failed),
            items_added: count(log.items_added),
            items_skipped: count(log.items_skipped),
            summaries: serde_json::to_string(&log.summaries).unwrap_or_else(|_| "[]".to_string()),
            orchestration_errors: serde_json::to_string(&log.orchestration_errors)
                .unwrap_or_else(|_| "[]".to_string()),
        }
    }
}

fn count(n: usize) -> i32 {
    i32::try_from(n).unwrap_or(i32::MAX)
}

impl From<RunLogRecord> for RunLog {
    fn from(record: RunLogRecord) -> Self {
        let summaries: Vec<ProcessingSummary> =
            serde_json::from_str(&record.summaries).unwrap_or_default();
        RunLog {
            id: Some(record.id),
            started_at: parse_datetime(&record.started_at),
            finished_at: parse_datetime_opt(record.finished_at),
            status: RunStatus::from_str(&record.status).unwrap_or(RunStatus::Failed),
            sources_total: record.sources_total.max(0) as usize,
            sources_failed: record.sources_failed.max(0) as usize,
            items_added: record.items_added.max(0) as usize,
            items_skipped: record.items_skipped.max(0) as usize,
            summaries,
            orchestration_errors: serde_json::from_str(&record.orchestration_errors)
                .unwrap_or_default(),
        }
    }
}
