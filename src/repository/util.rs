//! Repository utilities.

use chrono::{DateTime, SecondsFormat, Utc};
use diesel::result::{DatabaseErrorInformation, DatabaseErrorKind};

/// Simple error info wrapper for database errors.
#[derive(Debug)]
pub struct DbErrorInfo(pub String);

impl DatabaseErrorInformation for DbErrorInfo {
    fn message(&self) -> &str {
        &self.0
    }
    fn details(&self) -> Option<&str> {
        None
    }
    fn hint(&self) -> Option<&str> {
        None
    }
    fn table_name(&self) -> Option<&str> {
        None
    }
    fn column_name(&self) -> Option<&str> {
        None
    }
    fn constraint_name(&self) -> Option<&str> {
        None
    }
    fn statement_position(&self) -> Option<i32> {
        None
    }
}

/// Convert any displayable error to a diesel error with proper message.
pub fn to_diesel_error(e: impl std::fmt::Display) -> diesel::result::Error {
    database_error(DatabaseErrorKind::Unknown, e)
}

/// Build a diesel database error of a specific kind.
pub fn database_error(kind: DatabaseErrorKind, e: impl std::fmt::Display) -> diesel::result::Error {
    diesel::result::Error::DatabaseError(kind, Box::new(DbErrorInfo(e.to_string())))
}

/// Fixed-width RFC 3339 so text columns sort chronologically.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse a datetime string from the database, defaulting to Unix epoch on error.
pub fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Parse an optional datetime string from the database.
pub fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn datetimes_round_trip_and_sort() {
        let a = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        let b = a + chrono::Duration::milliseconds(120);
        let (fa, fb) = (format_datetime(&a), format_datetime(&b));
        assert_eq!(fa, "2024-01-02T03:04:05.000000Z");
        assert!(fa < fb);
        assert_eq!(parse_datetime(&fb), b);
    }

    #[test]
    fn bad_datetimes_fall_back() {
        assert_eq!(parse_datetime("garbage"), DateTime::UNIX_EPOCH);
        assert_eq!(parse_datetime_opt(Some("garbage".into())), None);
        assert_eq!(parse_datetime_opt(None), None);
    }

    #[test]
    fn unique_violation_kind_is_preserved() {
        let err = database_error(DatabaseErrorKind::UniqueViolation, "duplicate link");
        assert!(matches!(
            err,
            diesel::result::Error::DatabaseError(DatabaseErrorKind::UniqueViolation, _)
        ));
        assert!(err.to_string().contains("duplicate link"));
    }
}
