use chrono::{DateTime, Utc};

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

/// Formats elapsed seconds as `1h:01m:01s` or `1m:05s`.
///
/// Returns `-` for NaN, infinite or negative input, which is what callers get
/// when a timestamp is missing. Fractional seconds are truncated.
pub fn format_duration(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "-".to_string();
    }

    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "finite and non-negative here; values above u64::MAX saturate"
    )]
    let whole = seconds.trunc() as u64;
    format_whole_seconds(whole)
}

pub fn format_whole_seconds(seconds: u64) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let remainder = seconds % SECONDS_PER_MINUTE;

    if hours > 0 {
        format!("{hours}h:{minutes:02}m:{remainder:02}s")
    } else {
        format!("{minutes}m:{remainder:02}s")
    }
}

/// "3 hours ago" style distance between `then` and `now`.
pub fn format_relative(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let Ok(elapsed) = (now - then).to_std() else {
        return "just now".to_string();
    };
    timeago::Formatter::new().convert(elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_format_duration_under_an_hour() {
        assert_eq!(format_duration(0.0), "0m:00s");
        assert_eq!(format_duration(65.0), "1m:05s");
        assert_eq!(format_duration(3599.0), "59m:59s");
    }

    #[test]
    fn test_format_duration_with_hours() {
        assert_eq!(format_duration(3600.0), "1h:00m:00s");
        assert_eq!(format_duration(3661.0), "1h:01m:01s");
        assert_eq!(format_duration(36_000.0 + 125.0), "10h:02m:05s");
    }

    #[test]
    fn test_format_duration_placeholder() {
        assert_eq!(format_duration(f64::NAN), "-");
        assert_eq!(format_duration(-1.0), "-");
        assert_eq!(format_duration(f64::INFINITY), "-");
    }

    #[test]
    fn test_format_duration_truncates_fractions() {
        assert_eq!(format_duration(65.9), "1m:05s");
        assert_eq!(format_whole_seconds(3661), "1h:01m:01s");
    }

    #[test]
    fn test_format_duration_matches_minute_formula_below_one_hour() {
        for s in (0..3600_u64).step_by(7) {
            let expected = format!("{}m:{:02}s", s / 60, s % 60);
            assert_eq!(format_whole_seconds(s), expected);
        }
    }

    #[test]
    fn test_format_relative() {
        let now = Utc::now();
        assert_eq!(format_relative(now - Duration::hours(3), now), "3 hours ago");
        assert_eq!(format_relative(now + Duration::minutes(5), now), "just now");
    }
}
