//! Period keys identifying one column (or row) of an index table

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `YYYY` or `YYYY-MM` table key. Ordered chronologically, an annual
/// period sorting before the months of its year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: Option<u32>,
}

/// Resolution of the periods in a table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Granularity {
    Annual,
    Monthly,
}

impl Period {
    pub fn annual(year: i32) -> Self {
        Self { year, month: None }
    }

    pub fn monthly(year: i32, month: u32) -> Self {
        Self {
            year,
            month: Some(month),
        }
    }

    pub fn granularity(&self) -> Granularity {
        match self.month {
            Some(_) => Granularity::Monthly,
            None => Granularity::Annual,
        }
    }

    /// Parse a table header or cell. Accepts `YYYY`, `YYYY-M` and `YYYY-MM`.
    pub fn parse(raw: &str) -> Option<Self> {
        let s = raw.trim().trim_matches('"').trim();
        let (year_part, month_part) = match s.split_once('-') {
            Some((y, m)) => (y, Some(m)),
            None => (s, None),
        };

        if year_part.len() != 4 || !year_part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let year: i32 = year_part.parse().ok()?;

        match month_part {
            None => Some(Self::annual(year)),
            Some(m) => {
                if m.is_empty() || m.len() > 2 || !m.bytes().all(|b| b.is_ascii_digit()) {
                    return None;
                }
                let month: u32 = m.parse().ok()?;
                if (1..=12).contains(&month) {
                    Some(Self::monthly(year, month))
                } else {
                    None
                }
            }
        }
    }
}

impl Granularity {
    /// Key a calendar date into a table of this granularity
    pub fn period_of(&self, date: NaiveDate) -> Period {
        match self {
            Granularity::Annual => Period::annual(date.year()),
            Granularity::Monthly => Period::monthly(date.year(), date.month()),
        }
    }
}

impl FromStr for Period {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Period::parse(s).ok_or_else(|| format!("Invalid period: {}", s))
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.month {
            Some(m) => write!(f, "{:04}-{:02}", self.year, m),
            None => write!(f, "{:04}", self.year),
        }
    }
}
