//! Date expressions accepted for the explicit extraction window
//!
//! Supported forms: RFC 3339 timestamps, `YYYY-MM-DD`, `YYYY-MM-DD HH:MM:SS`
//! (both read as UTC), `now`, `today`, `yesterday` and `N <unit>(s) ago`
//! with units second, minute, hour, day and week.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use regex::Regex;

/// Resolve a date expression relative to `now`
///
/// # Errors
///
/// Returns a message describing the expression that could not be parsed.
///
/// # Examples
///
/// ```
/// use toast_extractor::config::dates::parse_date_expression;
/// use chrono::{TimeZone, Utc};
///
/// let now = Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap();
/// let start = parse_date_expression("1 week ago", now).unwrap();
/// assert_eq!(start, Utc.with_ymd_and_hms(2024, 5, 3, 15, 30, 0).unwrap());
/// ```
pub fn parse_date_expression(expr: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
    let trimmed = expr.trim();
    let lowered = trimmed.to_lowercase();

    match lowered.as_str() {
        "" => return Err("date expression cannot be empty".to_string()),
        "now" => return Ok(now),
        "today" => return Ok(start_of_day(now.date_naive())),
        "yesterday" => return Ok(start_of_day(now.date_naive() - Duration::days(1))),
        _ => {}
    }

    if let Ok(ts) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(start_of_day(date));
    }

    let relative = Regex::new(r"^(\d+)\s+(second|minute|hour|day|week)s?\s+ago$")
        .map_err(|e| e.to_string())?;
    if let Some(caps) = relative.captures(&lowered) {
        let amount: i64 = caps[1]
            .parse()
            .map_err(|_| format!("amount in '{trimmed}' is out of range"))?;
        let offset = match &caps[2] {
            "second" => Duration::try_seconds(amount),
            "minute" => Duration::try_minutes(amount),
            "hour" => Duration::try_hours(amount),
            "day" => Duration::try_days(amount),
            _ => Duration::try_weeks(amount),
        }
        .ok_or_else(|| format!("amount in '{trimmed}' is out of range"))?;
        return now
            .checked_sub_signed(offset)
            .ok_or_else(|| format!("'{trimmed}' is out of range"));
    }

    Err(format!(
        "unrecognised date expression '{trimmed}' (expected RFC 3339, YYYY-MM-DD, now, today, yesterday or 'N days ago')"
    ))
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use test_case::test_case;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 15, 30, 0).unwrap()
    }

    #[test_case("now", (2024, 5, 10, 15, 30, 0); "now")]
    #[test_case("today", (2024, 5, 10, 0, 0, 0); "today")]
    #[test_case("Yesterday", (2024, 5, 9, 0, 0, 0); "yesterday any case")]
    #[test_case("2024-04-01", (2024, 4, 1, 0, 0, 0); "plain date")]
    #[test_case("2024-04-01 08:15:00", (2024, 4, 1, 8, 15, 0); "date and time")]
    #[test_case("2024-04-01T10:00:00+02:00", (2024, 4, 1, 8, 0, 0); "rfc3339 with offset")]
    #[test_case("3 days ago", (2024, 5, 7, 15, 30, 0); "days ago")]
    #[test_case("1 hour ago", (2024, 5, 10, 14, 30, 0); "singular unit")]
    #[test_case("2 weeks ago", (2024, 4, 26, 15, 30, 0); "weeks ago")]
    #[test_case("90 minutes ago", (2024, 5, 10, 14, 0, 0); "minutes ago")]
    fn test_parse(expr: &str, expected: (i32, u32, u32, u32, u32, u32)) {
        let (y, mo, d, h, mi, s) = expected;
        assert_eq!(
            parse_date_expression(expr, now()).unwrap(),
            Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
        );
    }

    #[test_case(""; "empty")]
    #[test_case("last tuesday"; "unsupported phrase")]
    #[test_case("3 fortnights ago"; "unknown unit")]
    #[test_case("2024-13-01"; "invalid month")]
    fn test_parse_errors(expr: &str) {
        assert!(parse_date_expression(expr, now()).is_err());
    }
}
