//! Shared utility functions.
//!
//! - `dates`: lenient publication-date parsing
//! - `text`: whitespace collapsing, HTML text extraction and snippet truncation

mod dates;
mod text;

pub use dates::{parse_iso_date, parse_published_date, parse_rfc2822_date};
pub use text::{collapse_whitespace, html_text, truncate_snippet};
