//! Date parsing shared by the HTTP surface and the CLI.

use chrono::NaiveDate;

/// Calendar-date format accepted for the `start`/`end` bounds.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a strict `YYYY-MM-DD` calendar date.
///
/// Both the shape (four-digit year, two-digit month and day) and the date
/// itself are checked, so `2024-1-05` and `2024-02-30` are rejected.
#[must_use]
pub fn parse_calendar_date(s: &str) -> Option<NaiveDate> {
    let bytes = s.as_bytes();
    let shaped = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(s, DATE_FORMAT).ok()
}

/// Returns `true` if `s` is empty (no bound) or a valid calendar date.
#[must_use]
pub fn is_valid_date_bound(s: &str) -> bool {
    s.is_empty() || parse_calendar_date(s).is_some()
}
