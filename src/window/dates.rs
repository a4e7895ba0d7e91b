// Sat Oct 17 2026 - Alex

use chrono::{NaiveDate, NaiveTime};

use super::WindowError;

/// `15-March-2026` is what the tournament list uses; the other two show up in
/// hand-written race configs.
pub const DATE_FORMATS: &[&str] = &["%d-%B-%Y", "%d-%b-%Y", "%Y-%m-%d"];

pub const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M"];

pub fn parse_date(input: &str) -> Result<NaiveDate, WindowError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(WindowError::InvalidDate(input.to_string()));
    }

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| WindowError::InvalidDate(input.to_string()))
}

pub fn parse_time(input: &str) -> Result<NaiveTime, WindowError> {
    let trimmed = input.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .ok_or_else(|| WindowError::InvalidTime(input.to_string()))
}

/// Renders a date the way the tournament list and race configs spell it.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d-%B-%Y").to_string()
}

/// `registration_start` strings look like `18-January-2026 à 12:00`; only the
/// date part is meaningful.
pub fn registration_start_date(raw: &str) -> Result<NaiveDate, WindowError> {
    let date_part = raw
        .split(" à ")
        .next()
        .and_then(|s| s.split_whitespace().next())
        .unwrap_or("");
    parse_date(date_part)
}
