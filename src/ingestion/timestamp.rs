//! Timestamp text parsing shared by the CSV and JSON adapters.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

/// Parse a timestamp cell.
///
/// Accepts RFC 3339 with an offset (converted to UTC, e.g. `2009-04-21T18:51:11.767205+00:00`),
/// naive `YYYY-MM-DD HH:MM:SS[.f]` with a space or `T` separator, and a bare `YYYY-MM-DD`
/// (midnight).
pub fn parse_timestamp(s: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(s, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::parse_timestamp;
    use chrono::{Datelike, Timelike};

    #[test]
    fn parses_offset_timestamps_as_utc() {
        let ts = parse_timestamp("2009-12-31T23:30:00-05:00").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day(), ts.hour()), (2010, 1, 1, 4));

        let ts = parse_timestamp("2009-04-21T18:51:11.767205+00:00").unwrap();
        assert_eq!((ts.year(), ts.hour(), ts.second()), (2009, 18, 11));
    }

    #[test]
    fn parses_naive_and_date_only_forms() {
        assert!(parse_timestamp("2010-03-05 07:01:02").is_some());
        assert!(parse_timestamp("2010-03-05T07:01:02.5").is_some());
        let ts = parse_timestamp("2011-07-04").unwrap();
        assert_eq!(ts.hour(), 0);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2010-13-01 00:00:00").is_none());
    }
}
