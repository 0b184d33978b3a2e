//! Coarse relative-time formatting for last-action timestamps.
//!
//! The overlay only needs a freshness hint ("3 minutes", "2 days"), so the
//! formatter picks the largest unit that fits and truncates by integer
//! division. No rounding, no compound units.

use chrono::Utc;

const MINUTE: i64 = 60;
const HOUR: i64 = 3600;
const DAY: i64 = 86400;

/// Format the age of `past_ts` relative to `now_ts` (both epoch seconds).
///
/// Negative deltas (clock skew, future timestamp) clamp to zero and render
/// as `"0 seconds"`.
pub fn format_time_ago(past_ts: i64, now_ts: i64) -> String {
    let delta = (now_ts - past_ts).max(0);

    if delta < MINUTE {
        pluralize(delta, "second")
    } else if delta < HOUR {
        pluralize(delta / MINUTE, "minute")
    } else if delta < DAY {
        pluralize(delta / HOUR, "hour")
    } else {
        pluralize(delta / DAY, "day")
    }
}

/// Format the age of `past_ts` against the current wall clock.
pub fn time_ago(past_ts: i64) -> String {
    format_time_ago(past_ts, Utc::now().timestamp())
}

fn pluralize(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_below_one_minute() {
        assert_eq!(format_time_ago(100, 100), "0 seconds");
        assert_eq!(format_time_ago(100, 101), "1 second");
        assert_eq!(format_time_ago(100, 102), "2 seconds");
        assert_eq!(format_time_ago(100, 159), "59 seconds");
    }

    #[test]
    fn minute_boundaries() {
        assert_eq!(format_time_ago(0, 60), "1 minute");
        assert_eq!(format_time_ago(0, 119), "1 minute");
        assert_eq!(format_time_ago(0, 120), "2 minutes");
        assert_eq!(format_time_ago(0, 3599), "59 minutes");
    }

    #[test]
    fn hour_boundaries() {
        assert_eq!(format_time_ago(0, 3600), "1 hour");
        assert_eq!(format_time_ago(0, 7199), "1 hour");
        assert_eq!(format_time_ago(0, 7200), "2 hours");
        assert_eq!(format_time_ago(0, 86399), "23 hours");
    }

    #[test]
    fn days_are_unbounded() {
        assert_eq!(format_time_ago(0, 86400), "1 day");
        assert_eq!(format_time_ago(0, 172_800), "2 days");
        assert_eq!(format_time_ago(0, 86400 * 400), "400 days");
    }

    #[test]
    fn future_timestamp_clamps_to_zero() {
        assert_eq!(format_time_ago(200, 100), "0 seconds");
    }
}
