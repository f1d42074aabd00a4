//! Human friendly time arguments and durations.
//!
//! Commands such as `close` and `block` accept an optional leading duration
//! followed by free text: `in 2 hours The issue has been resolved.`,
//! `2m30s`, `10m silently`.

use chrono::{DateTime, Duration, Utc};
use fancy_regex::Regex;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

/// Upper bound for parsed durations (roughly a century).
const MAX_SECONDS: i64 = 100 * YEAR;

const DURATION_TOKEN: &str = r"^(\d{1,9})\s*(years?|yrs?|y|months?|mo|weeks?|wks?|w|days?|d|hours?|hrs?|h|minutes?|mins?|m|seconds?|secs?|s)(?![A-Za-z])";
const SEPARATOR: &str = r"^\s*(?:,\s*|and\s+)?";

/// A point in time plus the text that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserFriendlyTime {
    pub dt: DateTime<Utc>,
    pub now: DateTime<Utc>,
    /// Free text after the time, `None` when nothing followed.
    pub arg: Option<String>,
}

impl UserFriendlyTime {
    /// Parse `text` relative to `now`.
    ///
    /// Text that does not start with a duration keeps `dt == now` and
    /// becomes the argument as a whole.
    pub fn parse(text: &str, now: DateTime<Utc>) -> Self {
        let trimmed = text.trim();

        let attempt = strip_in(trimmed)
            .and_then(parse_leading_duration)
            .or_else(|| parse_leading_duration(trimmed));

        let (seconds, rest) = match attempt {
            Some((seconds, rest)) => (seconds, rest),
            None => (0, trimmed),
        };

        let rest = rest.trim();
        Self {
            dt: now + Duration::seconds(seconds),
            now,
            arg: if rest.is_empty() {
                None
            } else {
                Some(rest.to_string())
            },
        }
    }

    pub fn is_future(&self) -> bool {
        self.dt > self.now
    }

    /// Seconds between `now` and `dt`, never negative.
    pub fn delay_seconds(&self) -> u64 {
        (self.dt - self.now).num_seconds().max(0) as u64
    }
}

fn strip_in(text: &str) -> Option<&str> {
    let lower = text.get(..3)?.to_ascii_lowercase();
    if lower == "in " {
        Some(&text[3..])
    } else {
        None
    }
}

/// Consume a run of `<number><unit>` tokens from the start of `text`.
fn parse_leading_duration(text: &str) -> Option<(i64, &str)> {
    let token = Regex::new(DURATION_TOKEN).ok()?;
    let separator = Regex::new(SEPARATOR).ok()?;

    let mut rest = text.trim_start();
    let mut total: i64 = 0;
    let mut matched = false;

    loop {
        let candidate = if matched {
            let sep_len = separator
                .find(rest)
                .ok()
                .flatten()
                .map(|m| m.end())
                .unwrap_or(0);
            &rest[sep_len..]
        } else {
            rest
        };

        let Some(captures) = token.captures(candidate).ok().flatten() else {
            break;
        };
        let (Some(whole), Some(number), Some(unit)) =
            (captures.get(0), captures.get(1), captures.get(2))
        else {
            break;
        };

        let amount: i64 = number.as_str().parse().ok()?;
        total = total.saturating_add(amount.saturating_mul(unit_seconds(unit.as_str())));
        rest = &candidate[whole.end()..];
        matched = true;
    }

    if matched {
        Some((total.min(MAX_SECONDS), rest))
    } else {
        None
    }
}

fn unit_seconds(unit: &str) -> i64 {
    match unit {
        "y" | "yr" | "yrs" | "year" | "years" => YEAR,
        "mo" | "month" | "months" => MONTH,
        "w" | "wk" | "wks" | "week" | "weeks" => WEEK,
        "d" | "day" | "days" => DAY,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE,
        _ => 1,
    }
}

/// Break a number of seconds into `(amount, unit)` pairs, largest first.
fn components(mut seconds: i64) -> Vec<(i64, &'static str)> {
    let units = [
        (YEAR, "year"),
        (MONTH, "month"),
        (DAY, "day"),
        (HOUR, "hour"),
        (MINUTE, "minute"),
        (1, "second"),
    ];
    let mut out = Vec::new();
    for (size, name) in units {
        let amount = seconds / size;
        seconds %= size;
        if amount > 0 {
            out.push((amount, name));
        }
    }
    out
}

fn plural(amount: i64, unit: &str) -> String {
    if amount == 1 {
        format!("{} {}", amount, unit)
    } else {
        format!("{} {}s", amount, unit)
    }
}

/// "5 hours", "1 hour and 2 minutes", "2 days ago".
///
/// Shows at most three units. Past times get an "ago" suffix.
pub fn human_timedelta(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let (delta, suffix) = if dt > now {
        (dt - now, "")
    } else {
        (now - dt, " ago")
    };

    let mut seconds = delta.num_seconds();
    if seconds > 0 && delta.num_milliseconds() % 1000 != 0 {
        seconds += 1;
    }

    let parts: Vec<String> = components(seconds)
        .into_iter()
        .take(3)
        .map(|(amount, unit)| plural(amount, unit))
        .collect();

    match parts.as_slice() {
        [] => "now".to_string(),
        [one] => format!("{}{}", one, suffix),
        [first, second] => format!("{} and {}{}", first, second, suffix),
        [first, second, third, ..] => format!("{}, {} and {}{}", first, second, third, suffix),
    }
}

/// Coarse age of a past event: "3 days ago", "just now".
pub fn human_duration_since(dt: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - dt).num_seconds();
    if seconds < 1 {
        return "just now".to_string();
    }
    match components(seconds).first() {
        Some((amount, unit)) => format!("{} ago", plural(*amount, unit)),
        None => "just now".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_compact_duration() {
        let t = UserFriendlyTime::parse("2m30s", now());
        assert_eq!(t.delay_seconds(), 150);
        assert_eq!(t.arg, None);
        assert!(t.is_future());
    }

    #[test]
    fn test_in_prefix_with_words() {
        let t = UserFriendlyTime::parse("in 5 hours", now());
        assert_eq!(t.delay_seconds(), 5 * 3600);
        assert_eq!(t.arg, None);
    }

    #[test]
    fn test_duration_followed_by_message() {
        let t = UserFriendlyTime::parse("2 hours The issue has been resolved.", now());
        assert_eq!(t.delay_seconds(), 7200);
        assert_eq!(t.arg.as_deref(), Some("The issue has been resolved."));
    }

    #[test]
    fn test_joined_units() {
        let t = UserFriendlyTime::parse("1 day, 2 hours and 3 minutes later", now());
        assert_eq!(t.delay_seconds(), 86400 + 7200 + 180);
        assert_eq!(t.arg.as_deref(), Some("later"));
    }

    #[test]
    fn test_no_time_keeps_text() {
        let t = UserFriendlyTime::parse("We will contact you once we find out more.", now());
        assert_eq!(t.dt, now());
        assert!(!t.is_future());
        assert_eq!(
            t.arg.as_deref(),
            Some("We will contact you once we find out more.")
        );
    }

    #[test]
    fn test_keywords_are_arguments() {
        assert_eq!(UserFriendlyTime::parse("silently", now()).arg.as_deref(), Some("silently"));
        assert_eq!(UserFriendlyTime::parse("cancel", now()).arg.as_deref(), Some("cancel"));

        let t = UserFriendlyTime::parse("in 10m silently", now());
        assert_eq!(t.delay_seconds(), 600);
        assert_eq!(t.arg.as_deref(), Some("silently"));
    }

    #[test]
    fn test_number_without_unit_is_text() {
        let t = UserFriendlyTime::parse("3 dogs ate my homework", now());
        assert_eq!(t.delay_seconds(), 0);
        assert_eq!(t.arg.as_deref(), Some("3 dogs ate my homework"));
    }

    #[test]
    fn test_months_and_minutes_are_distinct() {
        assert_eq!(UserFriendlyTime::parse("1mo", now()).delay_seconds(), 30 * 86400);
        assert_eq!(UserFriendlyTime::parse("1m", now()).delay_seconds(), 60);
    }

    #[test]
    fn test_huge_values_are_capped() {
        let t = UserFriendlyTime::parse("999999999y", now());
        assert_eq!(t.delay_seconds() as i64, MAX_SECONDS);
    }

    #[test]
    fn test_human_timedelta() {
        let base = now();
        assert_eq!(human_timedelta(base + Duration::hours(5), base), "5 hours");
        assert_eq!(
            human_timedelta(base + Duration::minutes(62), base),
            "1 hour and 2 minutes"
        );
        assert_eq!(
            human_timedelta(base + Duration::seconds(DAY + 2 * HOUR + 3 * MINUTE + 4), base),
            "1 day, 2 hours and 3 minutes"
        );
        assert_eq!(human_timedelta(base - Duration::days(2), base), "2 days ago");
        assert_eq!(human_timedelta(base, base), "now");
    }

    #[test]
    fn test_human_timedelta_rounds_partial_seconds_up() {
        let base = now();
        let dt = base + Duration::hours(5) - Duration::milliseconds(10);
        assert_eq!(human_timedelta(dt, base), "5 hours");
    }

    #[test]
    fn test_human_duration_since() {
        let base = now();
        assert_eq!(human_duration_since(base - Duration::days(3), base), "3 days ago");
        assert_eq!(human_duration_since(base - Duration::seconds(1), base), "1 second ago");
        assert_eq!(human_duration_since(base, base), "just now");
    }
}
