//! Error types for the ingestion pipeline.

use thiserror::Error;

/// Failure of a fetch or extraction for a whole source.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },
    #[error("Timed out after {secs}s: {url}")]
    Timeout { url: String, secs: u64 },
    #[error("Failed to parse feed: {0}")]
    FeedParse(String),
    #[error("Invalid selector '{selector}': {reason}")]
    Selector { selector: String, reason: String },
    #[error("Invalid URL '{0}'")]
    InvalidUrl(String),
    #[error("Source has no website id configured")]
    MissingWebsiteId,
    #[error("No scraping config for website '{0}'")]
    UnknownWebsite(String),
    #[error("Browser error: {0}")]
    Browser(String),
    #[error("{0}")]
    Config(String),
}

/// Orchestration-level failures.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Source not found: {0}")]
    SourceNotFound(String),
    #[error("Source is disabled: {0}")]
    SourceDisabled(String),
    #[error("Unsupported source type: {0}")]
    UnsupportedSourceType(String),
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
}

/// Settings could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid value for {key}: {value}")]
    InvalidEnv { key: &'static str, value: String },
}
