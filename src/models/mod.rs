//! Data models for feedacquire.

mod article;
mod run;
mod source;

pub use article::{Article, RawExtractedItem, RssItem, ScrapedArticle};
pub use run::{ProcessingSummary, RunLog, RunResult, RunStatus, SourceStatus};
pub use source::{FetchBookkeeping, Source, SourceKind, SourceScraping};
