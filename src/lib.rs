//! feedacquire - RSS and HTML article ingestion.
//!
//! Polls configured sources, normalizes what they publish into canonical
//! articles, skips anything already stored and records every run.

pub mod cli;
pub mod config;
pub mod error;
pub mod ingest;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod utils;
