//! Publication date parsing.
//!
//! Feeds and pages are inconsistent about date formats. Parsing is lenient
//! and returns `None` rather than guessing when nothing matches.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Formats tried for bare dates scraped from page text.
const NAIVE_DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

const NAIVE_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"];

/// Parse an ISO 8601 / RFC 3339 timestamp.
pub fn parse_iso_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Parse an RFC 2822 timestamp as used by RSS `pubDate`.
pub fn parse_rfc2822_date(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(s.trim())
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
}

/// Parse a date in any of the supported formats.
pub fn parse_published_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(dt) = parse_iso_date(s).or_else(|| parse_rfc2822_date(s)) {
        return Some(dt);
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.and_utc());
        }
    }

    for fmt in NAIVE_DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_rfc3339() {
        let dt = parse_published_date("2024-03-05T10:30:00+02:00").unwrap();
        assert_eq!(dt.hour(), 8);
        assert_eq!(dt.day(), 5);
    }

    #[test]
    fn parses_rfc2822() {
        let dt = parse_published_date("Tue, 05 Mar 2024 10:30:00 GMT").unwrap();
        assert_eq!(dt.month(), 3);
        assert_eq!(dt.hour(), 10);
    }

    #[test]
    fn parses_human_dates() {
        let dt = parse_published_date("March 5, 2024").unwrap();
        assert_eq!((dt.year(), dt.month(), dt.day()), (2024, 3, 5));

        let dt = parse_published_date("Mar 05, 2024").unwrap();
        assert_eq!(dt.day(), 5);

        let dt = parse_published_date("2024-03-05").unwrap();
        assert_eq!(dt.hour(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_published_date("").is_none());
        assert!(parse_published_date("yesterday-ish").is_none());
        assert!(parse_iso_date("Tue, 05 Mar 2024 10:30:00 GMT").is_none());
    }
}
