//! Duration and timestamp formatting.

use chrono::{DateTime, Duration, Utc};

/// Format used for every human-facing timestamp.
pub const DISPLAY_TIME_FORMAT: &str = "%A, %B %-d %Y, %-I:%M:%S %p";

const UNITS: [(&str, i64); 5] = [
    ("w", 7 * 24 * 60 * 60),
    ("d", 24 * 60 * 60),
    ("h", 60 * 60),
    ("m", 60),
    ("s", 1),
];

/// Render an elapsed duration as `1w 2d 3h 4m 5s`, keeping only non-zero
/// units. Zero or negative durations render as `0s`.
pub fn format_duration(elapsed: Duration) -> String {
    let mut remaining = elapsed.num_seconds().max(0);
    let mut parts = Vec::new();

    for (suffix, unit) in UNITS {
        let count = remaining / unit;
        remaining %= unit;
        if count > 0 {
            parts.push(format!("{}{}", count, suffix));
        }
    }

    if parts.is_empty() {
        "0s".to_string()
    } else {
        parts.join(" ")
    }
}

/// Elapsed time between `start` and `end`, formatted.
pub fn format_elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format_duration(end - start)
}

pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format(DISPLAY_TIME_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_duration_mixed_units() {
        let elapsed = Duration::hours(2) + Duration::minutes(15) + Duration::seconds(3);
        assert_eq!(format_duration(elapsed), "2h 15m 3s");
    }

    #[test]
    fn test_format_duration_zero() {
        assert_eq!(format_duration(Duration::zero()), "0s");
    }

    #[test]
    fn test_format_duration_skips_zero_units() {
        let elapsed = Duration::weeks(1) + Duration::hours(3);
        assert_eq!(format_duration(elapsed), "1w 3h");
        assert_eq!(format_duration(Duration::days(2)), "2d");
        assert_eq!(format_duration(Duration::minutes(1) + Duration::seconds(1)), "1m 1s");
    }

    #[test]
    fn test_format_duration_negative_clamps() {
        assert_eq!(format_duration(Duration::seconds(-30)), "0s");
    }

    #[test]
    fn test_format_duration_drops_subsecond() {
        assert_eq!(format_duration(Duration::milliseconds(1_999)), "1s");
    }

    #[test]
    fn test_format_timestamp() {
        let at = Utc.with_ymd_and_hms(2024, 3, 5, 14, 7, 9).unwrap();
        assert_eq!(format_timestamp(at), "Tuesday, March 5 2024, 2:07:09 PM");
    }

    #[test]
    fn test_format_elapsed() {
        let start = Utc.with_ymd_and_hms(2024, 3, 5, 14, 0, 0).unwrap();
        let end = start + Duration::days(8) + Duration::seconds(42);
        assert_eq!(format_elapsed(start, end), "1w 1d 42s");
    }
}
