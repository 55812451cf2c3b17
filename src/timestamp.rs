//! Export timestamp parsing
//!
//! Health exports write timestamps as `2024-01-01 08:00:00 -0700`, but older
//! exports and third-party tools also produce naive or ISO-8601 forms. Parsing is
//! best-effort: anything that matches none of the accepted shapes is `None`, and
//! callers skip the node.
//!
//! Offsets are never applied. The day key is the wall-clock date as written.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";
const NAIVE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const ISO_NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an export timestamp into its local wall-clock date-time
///
/// Sub-second fractions are cut before the two export formats are tried: the
/// input is truncated at its first `.`. Only if both fail is the untouched input
/// handed to the generic ISO-8601 fallback, with `Z` read as `+00:00`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let truncated = raw.split('.').next().unwrap_or(raw);

    parse_export_format(truncated).or_else(|| parse_iso8601(&raw.replace('Z', "+00:00")))
}

/// ISO day key (`YYYY-MM-DD`) for an export timestamp
pub fn day_key(raw: &str) -> Option<String> {
    parse_timestamp(raw).map(|dt| format_day(dt.date()))
}

/// Format a date as an ISO day key
pub fn format_day(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn parse_export_format(text: &str) -> Option<NaiveDateTime> {
    let with_offset = match text.strip_suffix('Z') {
        Some(stem) => DateTime::parse_from_str(&format!("{stem}+0000"), OFFSET_FORMAT),
        None => DateTime::parse_from_str(text, OFFSET_FORMAT),
    };

    with_offset
        .map(|dt| dt.naive_local())
        .or_else(|_| NaiveDateTime::parse_from_str(text, NAIVE_FORMAT))
        .ok()
}

fn parse_iso8601(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_local());
    }

    ISO_NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_export_format_with_offset() {
        let dt = parse_timestamp("2024-01-01 08:00:00 -0700").unwrap();
        assert_eq!(format_day(dt.date()), "2024-01-01");
        assert_eq!(dt.hour(), 8);
    }

    #[test]
    fn test_offset_is_not_applied_to_day() {
        // 23:30 at -0700 is already the next day in UTC
        assert_eq!(
            day_key("2024-03-10 23:30:00 -0700").as_deref(),
            Some("2024-03-10")
        );
        assert_eq!(
            day_key("2024-03-10 00:15:00 +1400").as_deref(),
            Some("2024-03-10")
        );
    }

    #[test]
    fn test_naive_export_format() {
        assert_eq!(
            day_key("2023-12-31 23:59:59").as_deref(),
            Some("2023-12-31")
        );
    }

    #[test]
    fn test_fraction_is_truncated() {
        // Truncation drops the offset too; the naive pattern then matches
        assert_eq!(
            day_key("2024-05-06 07:08:09.123 -0700").as_deref(),
            Some("2024-05-06")
        );
        assert_eq!(
            day_key("2024-05-06 07:08:09.5").as_deref(),
            Some("2024-05-06")
        );
    }

    #[test]
    fn test_zulu_suffix() {
        assert_eq!(
            day_key("2024-02-29 12:00:00 Z").as_deref(),
            Some("2024-02-29")
        );
        assert_eq!(
            day_key("2024-02-29T12:00:00Z").as_deref(),
            Some("2024-02-29")
        );
        assert_eq!(
            day_key("2024-02-29T12:00:00.250Z").as_deref(),
            Some("2024-02-29")
        );
    }

    #[test]
    fn test_iso8601_fallbacks() {
        assert_eq!(
            day_key("2024-07-04T10:00:00+02:00").as_deref(),
            Some("2024-07-04")
        );
        assert_eq!(
            day_key("2024-07-04T10:00:00").as_deref(),
            Some("2024-07-04")
        );
        assert_eq!(day_key("2024-07-04T10:00").as_deref(), Some("2024-07-04"));
        assert_eq!(day_key("2024-07-04").as_deref(), Some("2024-07-04"));
    }

    #[test]
    fn test_unparseable_timestamps() {
        assert!(parse_timestamp("").is_none());
        assert!(parse_timestamp("yesterday").is_none());
        assert!(parse_timestamp("2024-13-01 08:00:00 -0700").is_none());
        assert!(parse_timestamp("01/02/2024 08:00").is_none());
    }
}
