//! Date parsing and date range validation

use crate::error::{CucopyError, Result};
use chrono::{Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a strict `YYYY-MM-DD` date
pub fn parse_date(s: &str) -> Result<NaiveDate> {
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[4] == b'-'
        && bytes[7] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 4 || i == 7 || b.is_ascii_digit());
    if !well_formed {
        return Err(CucopyError::InvalidDateFormat(s.to_string()));
    }

    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|_| CucopyError::InvalidDateFormat(s.to_string()))
}

/// One year before `today`. 29 February maps to 28 February.
pub fn one_year_before(today: NaiveDate) -> NaiveDate {
    today
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN)
}

/// Ordered pair of dates, `from <= to`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    from: NaiveDate,
    to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(CucopyError::InvalidDateOrder { from, to });
        }
        Ok(Self { from, to })
    }

    /// Parse `from` and optional `to`. A missing `to` defaults to one year
    /// before today, since the latest published figures lag behind.
    pub fn normalize(from: &str, to: Option<&str>) -> Result<Self> {
        Self::normalize_at(from, to, Local::now().date_naive())
    }

    /// [`DateRange::normalize`] relative to a given `today`
    pub fn normalize_at(from: &str, to: Option<&str>, today: NaiveDate) -> Result<Self> {
        let from = parse_date(from)?;
        let to = match to {
            Some(s) => parse_date(s)?,
            None => one_year_before(today),
        };
        Self::new(from, to)
    }

    pub fn from(&self) -> NaiveDate {
        self.from
    }

    pub fn to(&self) -> NaiveDate {
        self.to
    }

    pub fn as_tuple(&self) -> (NaiveDate, NaiveDate) {
        (self.from, self.to)
    }
}
