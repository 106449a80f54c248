use std::fmt;
use std::sync::LazyLock;

use chrono::{Datelike, NaiveDateTime};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::error::{Error, Result};

static RE_MONTH_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{1,2})/([0-9]{4})$").unwrap());
static RE_MONTH_ISO: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})-([0-9]{2})$").unwrap());

/// Calendar month a service order was generated in.
///
/// Orders chronologically by `(year, month)`; the `MM/YYYY` label is only
/// for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthKey {
    pub year: i32,
    pub month: u32,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth(format!("month out of range: {month}")));
        }
        Ok(Self { year, month })
    }

    pub fn of(dt: &NaiveDateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
        }
    }

    /// Parse `MM/YYYY` (the display label) or `YYYY-MM`.
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();

        let invalid = || Error::InvalidMonth(format!("expected MM/YYYY or YYYY-MM, got '{s}'"));

        if let Some(caps) = RE_MONTH_LABEL.captures(s) {
            let month: u32 = caps[1].parse().map_err(|_| invalid())?;
            let year: i32 = caps[2].parse().map_err(|_| invalid())?;
            return Self::new(year, month);
        }

        if let Some(caps) = RE_MONTH_ISO.captures(s) {
            let year: i32 = caps[1].parse().map_err(|_| invalid())?;
            let month: u32 = caps[2].parse().map_err(|_| invalid())?;
            return Self::new(year, month);
        }

        Err(invalid())
    }

    /// Display label, e.g. `06/2025`.
    pub fn label(&self) -> String {
        format!("{:02}/{}", self.month, self.year)
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

impl Serialize for MonthKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label())
    }
}
