use chrono::{DateTime, SecondsFormat, Utc};

/// Length of a ranking week in milliseconds. Weeks are aligned to the Unix
/// epoch, not to calendar weeks, so bucket boundaries are stable across
/// timezones and server restarts.
pub const WEEK_MS: i64 = 7 * 24 * 60 * 60 * 1000;

/// Format a timestamp as fixed-width RFC 3339 with millisecond precision
/// and a `Z` suffix. Stored values sort lexicographically in time order,
/// which the keyset pagination queries rely on.
pub fn fmt_ts(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_ts() -> String {
    fmt_ts(Utc::now())
}

/// Parse a stored timestamp, falling back to now for corrupt values.
pub fn parse_ts(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub fn ts_to_millis(s: &str) -> i64 {
    parse_ts(s).timestamp_millis()
}

/// Start of the epoch-aligned week bucket containing `now_ms`.
pub fn week_start_ms(now_ms: i64) -> i64 {
    now_ms - now_ms.rem_euclid(WEEK_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fmt_ts_is_fixed_width() {
        let a = Utc.with_ymd_and_hms(2025, 1, 5, 9, 3, 7).unwrap();
        let b = Utc.with_ymd_and_hms(2025, 11, 30, 23, 59, 59).unwrap();
        assert_eq!(fmt_ts(a), "2025-01-05T09:03:07.000Z");
        assert_eq!(fmt_ts(a).len(), fmt_ts(b).len());
    }

    #[test]
    fn lexicographic_order_matches_chronological() {
        let early = Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2025, 10, 1, 0, 0, 0).unwrap();
        assert!(fmt_ts(early) < fmt_ts(late));
    }

    #[test]
    fn parse_roundtrips() {
        let t = Utc.with_ymd_and_hms(2025, 6, 15, 12, 30, 45).unwrap();
        assert_eq!(parse_ts(&fmt_ts(t)), t);
    }

    #[test]
    fn week_start_is_aligned_and_stable() {
        let start = week_start_ms(1_700_000_000_000);
        assert_eq!(start % WEEK_MS, 0);
        assert!(start <= 1_700_000_000_000);
        assert!(1_700_000_000_000 - start < WEEK_MS);
        // Every instant inside the bucket maps to the same start.
        assert_eq!(week_start_ms(start), start);
        assert_eq!(week_start_ms(start + WEEK_MS - 1), start);
        assert_eq!(week_start_ms(start + WEEK_MS), start + WEEK_MS);
    }
}
