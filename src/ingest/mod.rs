//! The ingestion pipeline.
//!
//! Orchestrator -> router -> RSS or HTML processor -> normalizer, with
//! status derivation turning each source's counters into a summary.

pub mod html;
pub mod normalizer;
pub mod orchestrator;
pub mod router;
pub mod rss;
pub mod status;

pub use html::HtmlProcessor;
pub use normalizer::{NormalizeAction, NormalizeOutcome, Normalizer};
pub use orchestrator::{FetchOrchestrator, RunOptions, DEFAULT_ARTICLE_LIMIT};
pub use router::SourceRouter;
pub use rss::RssProcessor;
pub use status::derive_status;
