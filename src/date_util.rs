use chrono::{NaiveDate, NaiveDateTime};

use crate::error::{Error, Result};

/// Display format for timestamps in the detail table and export.
pub const DISPLAY_DATETIME_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Placeholder for a closure date that does not exist yet.
pub const MISSING_DATE: &str = "N/A";

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format(DISPLAY_DATETIME_FORMAT).to_string()
}

/// Format an optional timestamp, using [`MISSING_DATE`] for `None`.
pub fn format_optional_datetime(dt: Option<&NaiveDateTime>) -> String {
    dt.map(format_datetime)
        .unwrap_or_else(|| MISSING_DATE.to_string())
}

/// Parse a `YYYY-MM-DD` date given on the command line.
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::InvalidDate(format!("expected YYYY-MM-DD, got '{s}'")))
}

/// Format a count with `.` as the thousands separator (`12345` → `12.345`).
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('.');
        }
        out.push(ch);
    }
    out
}

/// Format a percentage with two decimals (`87.5` → `87.50%`).
pub fn format_rate(pct: f64) -> String {
    format!("{pct:.2}%")
}
