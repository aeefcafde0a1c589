use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

/// Parse a SQLite timestamp column into a UTC datetime.
///
/// SQLite's `datetime('now')` stores "YYYY-MM-DD HH:MM:SS" without a
/// timezone, so an RFC 3339 parse is tried first and the naive format is the
/// fallback. Corrupt values are logged and mapped to the epoch rather than
/// failing the whole listing.
pub(crate) fn parse_db_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

pub(crate) fn parse_db_uuid(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, context, e);
        Uuid::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_sqlite_datetime_format() {
        let dt = parse_db_timestamp("2024-05-03 14:30:00", "test");
        assert_eq!(dt.to_rfc3339(), "2024-05-03T14:30:00+00:00");
    }

    #[test]
    fn test_parses_rfc3339() {
        let dt = parse_db_timestamp("2024-05-03T14:30:00Z", "test");
        assert_eq!(dt.to_rfc3339(), "2024-05-03T14:30:00+00:00");
    }

    #[test]
    fn test_corrupt_timestamp_falls_back_to_epoch() {
        let dt = parse_db_timestamp("not a date", "test");
        assert_eq!(dt, DateTime::<Utc>::default());
    }
}
