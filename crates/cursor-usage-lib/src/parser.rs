use chrono::{Datelike, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

static EVENT_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\w+)\s+(\d+),?\s+(\d+):(\d+)\s+(AM|PM)").unwrap());
static COST_AMOUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([\d,]*\d(?:\.\d+)?)").unwrap());

/// Parses dashboard dates such as "Sep 20, 07:11 AM" in the given year.
pub fn try_parse_event_date(text: &str, year: i32) -> Option<NaiveDateTime> {
    let caps = EVENT_DATE.captures(text)?;

    let month = month_number(&caps[1])?;
    let day: u32 = caps[2].parse().ok()?;
    let hour: u32 = caps[3].parse().ok()?;
    let minute: u32 = caps[4].parse().ok()?;

    let hour24 = match (&caps[5], hour) {
        ("AM", 12) => 0,
        ("PM", 12) => 12,
        ("PM", h) => h + 12,
        (_, h) => h,
    };

    NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour24, minute, 0)
}

/// Like [`try_parse_event_date`], but unparseable text yields `now`.
///
/// The fallback silently moves undated rows into "today"; the second value tells
/// the caller it happened so the row can be counted.
pub fn parse_event_date(text: &str, now: NaiveDateTime) -> (NaiveDateTime, bool) {
    match try_parse_event_date(text, now.year()) {
        Some(date) => (date, false),
        None => {
            tracing::warn!(date = text, "Unparseable event date, falling back to now");
            (now, true)
        }
    }
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name {
        "Jan" => 1,
        "Feb" => 2,
        "Mar" => 3,
        "Apr" => 4,
        "May" => 5,
        "Jun" => 6,
        "Jul" => 7,
        "Aug" => 8,
        "Sep" => 9,
        "Oct" => 10,
        "Nov" => 11,
        "Dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Token cells come as "12K", "1.5M" or plain "1,234".
pub fn parse_token_count(text: &str) -> Option<u64> {
    let cleaned = text.trim().replace(',', "");
    let (number, multiplier) = if let Some(n) = cleaned.strip_suffix(|c: char| c == 'K' || c == 'k') {
        (n, 1_000.0)
    } else if let Some(n) = cleaned.strip_suffix(|c: char| c == 'M' || c == 'm') {
        (n, 1_000_000.0)
    } else {
        (cleaned.as_str(), 1.0)
    };

    let value: f64 = number.trim().parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Some((value * multiplier).round() as u64)
}

/// First dollar amount inside a cost cell, e.g. "$0.24" or "Included ($1,204.10)".
pub fn parse_cost(text: &str) -> Option<f64> {
    let caps = COST_AMOUNT.captures(text)?;
    caps[1].replace(',', "").parse().ok()
}

/// A bare "$1,234.56" string as matched from page text.
pub fn parse_dollar_amount(text: &str) -> Option<f64> {
    let value: f64 = text.trim().trim_start_matches('$').replace(',', "").parse().ok()?;
    value.is_finite().then_some(value)
}
