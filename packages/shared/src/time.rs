//! Wall-clock helpers. All timestamps on the wire are Unix milliseconds (UTC).

use chrono::{DateTime, SecondsFormat, Utc};

/// Current Unix timestamp in milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Format a Unix millisecond timestamp as RFC 3339 (UTC).
///
/// Out-of-range values fall back to the epoch.
pub fn millis_to_rfc3339(millis: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Seconds elapsed between two millisecond timestamps, never negative.
pub fn elapsed_seconds(from_millis: i64, to_millis: i64) -> f64 {
    (to_millis.saturating_sub(from_millis)).max(0) as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_to_rfc3339() {
        assert_eq!(millis_to_rfc3339(0), "1970-01-01T00:00:00.000Z");
        assert_eq!(millis_to_rfc3339(1_500), "1970-01-01T00:00:01.500Z");
    }

    #[test]
    fn test_elapsed_seconds_clamps_negative() {
        assert_eq!(elapsed_seconds(2_000, 3_500), 1.5);
        assert_eq!(elapsed_seconds(3_500, 2_000), 0.0);
    }
}
