/// Date parsing and lookback window helpers.
///
/// The dataset stores dates as `YYYY-MM-DD` text and the stores filter with
/// string comparison. That is only chronological for zero-padded dates, so
/// every user-supplied bound goes through `parse_date` and is re-formatted
/// before it reaches a query.

use chrono::{NaiveDate, TimeDelta};

/// Storage format of the `date` column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A path segment that is not a calendar date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date '{0}', expected YYYY-MM-DD")]
pub struct InvalidDate(pub String);

/// Parses a `YYYY-MM-DD` date, rejecting trailing input and impossible dates.
pub fn parse_date(raw: &str) -> Result<NaiveDate, InvalidDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| InvalidDate(raw.to_string()))
}

/// Parses and re-formats a date into the zero-padded storage form.
pub fn canonical_date(raw: &str) -> Result<String, InvalidDate> {
    parse_date(raw).map(format_date)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// First date of the lookback window ending at `today`. A window reaching
/// past the earliest representable date starts at `NaiveDate::MIN`.
pub fn lookback_start(today: NaiveDate, lookback_days: i64) -> String {
    let start = TimeDelta::try_days(lookback_days)
        .and_then(|window| today.checked_sub_signed(window))
        .unwrap_or(NaiveDate::MIN);
    format_date(start)
}
