//! Database schema and queries

pub mod catalog;
pub mod init;
pub mod migrations;
pub mod novels;
pub mod series;
pub mod sessions;
pub mod settings;
pub mod users;

pub use init::init_database;

use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;

/// Parse a stored timestamp.
///
/// Rows written by this application are RFC3339; rows copied from the legacy
/// deployment carry naive `YYYY-MM-DD HH:MM:SS` text and are read as UTC.
pub(crate) fn parse_timestamp(value: &str) -> crate::Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }
    Err(crate::Error::Internal(format!(
        "Unparseable timestamp in database: {}",
        value
    )))
}

pub(crate) fn parse_opt_timestamp(value: Option<String>) -> crate::Result<Option<DateTime<Utc>>> {
    match value {
        Some(s) if !s.is_empty() => Ok(Some(parse_timestamp(&s)?)),
        _ => Ok(None),
    }
}

pub(crate) fn parse_uuid(value: &str) -> crate::Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| crate::Error::Internal(format!("Invalid UUID in database: {} ({})", value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rfc3339_timestamp() {
        let dt = parse_timestamp("2024-03-01T10:30:00+00:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-03-01T10:30:00+00:00");
    }

    #[test]
    fn test_parse_legacy_naive_timestamp() {
        let dt = parse_timestamp("2023-10-05 12:34:56").unwrap();
        assert_eq!(dt.to_rfc3339(), "2023-10-05T12:34:56+00:00");

        // Fractional seconds variant
        assert!(parse_timestamp("2023-10-05 12:34:56.789").is_ok());
    }

    #[test]
    fn test_parse_garbage_timestamp_is_error() {
        assert!(parse_timestamp("next tuesday").is_err());
        assert!(parse_opt_timestamp(Some("next tuesday".into())).is_err());
    }

    #[test]
    fn test_parse_opt_timestamp_none_and_empty() {
        assert_eq!(parse_opt_timestamp(None).unwrap(), None);
        assert_eq!(parse_opt_timestamp(Some(String::new())).unwrap(), None);
    }
}
