//! Relaxed due-time input parsing.
//!
//! Accepts absolute and relative forms. All input is interpreted as UTC,
//! relative to the supplied `now`.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;

static RELATIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\+|in\s+)(\d+)\s*(m|min|mins|minute|minutes|h|hr|hrs|hour|hours|d|day|days)$",
    )
    .expect("valid regex")
});

static DAY_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(today|tomorrow)\s+(\d{1,2}):(\d{2})$").expect("valid regex"));

static TIME_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid regex"));

/// Hint shown by the CLI when parsing fails.
pub const HINT: &str =
    "examples: '2025-10-12 18:00', '14:30', 'today 19:00', 'tomorrow 09:00', '+2h', 'in 90m', 'now'";

/// Parse relaxed user input into a UTC due time. Returns `None` on
/// unrecognized input.
pub fn parse_due(input: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let input = input.trim().to_lowercase();
    let today = now.date_naive();

    if input == "now" {
        return Some(now);
    }

    // Relative: +2h, +3d, in 90m
    if let Some(caps) = RELATIVE.captures(&input) {
        let n: i64 = caps[1].parse().ok()?;
        let delta = match &caps[2] {
            "m" | "min" | "mins" | "minute" | "minutes" => Duration::minutes(n),
            "h" | "hr" | "hrs" | "hour" | "hours" => Duration::hours(n),
            _ => Duration::days(n),
        };
        return Some(now + delta);
    }

    // today/tomorrow HH:MM
    if let Some(caps) = DAY_TIME.captures(&input) {
        let day = if &caps[1] == "today" {
            today
        } else {
            today.succ_opt()?
        };
        let time = NaiveTime::from_hms_opt(caps[2].parse().ok()?, caps[3].parse().ok()?, 0)?;
        return Some(day.and_time(time).and_utc());
    }

    // HH:MM, meaning today or tomorrow if already passed
    if let Some(caps) = TIME_ONLY.captures(&input) {
        let time = NaiveTime::from_hms_opt(caps[1].parse().ok()?, caps[2].parse().ok()?, 0)?;
        let mut due = today.and_time(time).and_utc();
        if due <= now {
            due += Duration::days(1);
        }
        return Some(due);
    }

    // YYYY-MM-DD HH:MM
    if let Ok(dt) = NaiveDateTime::parse_from_str(&input, "%Y-%m-%d %H:%M") {
        return Some(dt.and_utc());
    }

    // YYYY-MM-DD, due at end of day
    if let Ok(date) = NaiveDate::parse_from_str(&input, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::from_hms_opt(23, 59, 0)?).and_utc());
    }

    // Fallback: full RFC3339
    DateTime::parse_from_rfc3339(&input)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 10, 12, 0, 0).unwrap()
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn keyword_now() {
        assert_eq!(parse_due("now", noon()), Some(noon()));
    }

    #[test]
    fn relative_offsets() {
        assert_eq!(parse_due("+2h", noon()), Some(at(10, 14, 0)));
        assert_eq!(parse_due("in 90m", noon()), Some(at(10, 13, 30)));
        assert_eq!(parse_due("+3d", noon()), Some(at(13, 12, 0)));
    }

    #[test]
    fn today_and_tomorrow() {
        assert_eq!(parse_due("today 19:00", noon()), Some(at(10, 19, 0)));
        assert_eq!(parse_due("tomorrow 09:00", noon()), Some(at(11, 9, 0)));
    }

    #[test]
    fn bare_time_takes_next_occurrence() {
        assert_eq!(parse_due("14:30", noon()), Some(at(10, 14, 30)));
        // 09:00 already passed at noon, so it means tomorrow.
        assert_eq!(parse_due("09:00", noon()), Some(at(11, 9, 0)));
    }

    #[test]
    fn absolute_forms() {
        assert_eq!(parse_due("2025-10-12 18:00", noon()), Some(at(12, 18, 0)));
        assert_eq!(parse_due("2025-10-12", noon()), Some(at(12, 23, 59)));
        assert_eq!(
            parse_due("2025-10-12T18:00:00Z", noon()),
            Some(at(12, 18, 0))
        );
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_due("whenever", noon()), None);
        assert_eq!(parse_due("", noon()), None);
    }
}
