use std::sync::LazyLock;

use chrono::{Months, NaiveDate, TimeDelta};
use regex::Regex;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Placeholder for records that carry no date at all.
pub const EPOCH_PLACEHOLDER: &str = "1970-01-01";

// First whitespace-separated token is an integer: "3 days ago", "+1 day".
static LEADING_INT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?\d+)(?:\s|$)").unwrap());

/// Map a raw date expression to `YYYY-MM-DD`.
///
/// Total: anything unrecognized or out of range resolves to `today`.
///   - absent                -> today
///   - "N day(s) ago"        -> today - N days
///   - "30+ days ago"        -> today - 1 calendar month
///   - "YYYY-MM-DD"          -> unchanged
///   - anything else         -> today
pub fn standardize_date(raw: Option<&str>, today: NaiveDate) -> String {
    resolve(raw, today).unwrap_or(today).format(DATE_FORMAT).to_string()
}

fn resolve(raw: Option<&str>, today: NaiveDate) -> Option<NaiveDate> {
    let raw = raw?;

    if raw.contains("day") {
        if let Some(n) = days_ago(raw) {
            return today.checked_sub_signed(TimeDelta::try_days(n)?);
        }
    }

    if raw.contains("30+") {
        return today.checked_sub_months(Months::new(1));
    }

    NaiveDate::parse_from_str(raw, DATE_FORMAT).ok()
}

fn days_ago(raw: &str) -> Option<i64> {
    LEADING_INT_RE.captures(raw)?.get(1)?.as_str().parse().ok()
}
