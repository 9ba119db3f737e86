//! Region code migrations
//!
//! Some regions stop being reported under their own code, e.g. euro area
//! members whose exchange rate is published for the euro area from the year
//! they adopted the euro. A succession record points such a region at the
//! code to consult from a given year on.

use super::locale::decode_number;
use super::table::{
    field, find_column, read_source, skip_preamble, COUNTRY_CODE_COLUMN, NEW_COUNTRY_CODE_COLUMN,
    YIELDED_COLUMN,
};
use crate::config::Language;
use crate::error::{CucopyError, Result};
use csv::ReaderBuilder;
use hashbrown::HashMap;
use std::path::Path;

/// Successor region code, valid from `since_year` on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Succession {
    successor: String,
    since_year: i32,
}

impl Succession {
    pub fn new(successor: impl Into<String>, since_year: i32) -> Self {
        Self {
            successor: successor.into(),
            since_year,
        }
    }

    /// Build from raw `New Country Code` / `Yielded` cells. Years may be
    /// written as floats (`1999.0`) by spreadsheet exports.
    pub fn from_fields(successor: Option<&str>, yielded: Option<&str>) -> Option<Self> {
        let successor = successor?;
        let year = decode_number(yielded?, Language::En)?;
        if year.fract() != 0.0 {
            return None;
        }
        Some(Self::new(successor, year as i32))
    }

    pub fn successor(&self) -> &str {
        &self.successor
    }

    pub fn since_year(&self) -> i32 {
        self.since_year
    }

    /// Whether the successor applies to a year
    pub fn applies_to(&self, year: i32) -> bool {
        year >= self.since_year
    }
}

/// Region code -> succession record
#[derive(Debug, Clone, Default)]
pub struct SuccessionTable {
    records: HashMap<String, Succession>,
}

impl SuccessionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, code: impl Into<String>, succession: Succession) {
        self.records.insert(code.into(), succession);
    }

    pub fn successor_of(&self, code: &str) -> Option<&Succession> {
        self.records.get(code)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Succession)> {
        self.records.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Load a World-Bank-format table with `Country Code`,
    /// `New Country Code` and `Yielded` columns
    pub fn load(path: &Path, skip_lines: usize) -> Result<Self> {
        let contents = read_source(path)?;
        let table = Self::load_from_str(&contents, skip_lines).map_err(|e| match e {
            CucopyError::DataSource(msg) => {
                CucopyError::DataSource(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;
        log::info!(
            "Loaded {} succession record(s) from {}",
            table.len(),
            path.display()
        );
        Ok(table)
    }

    pub fn load_from_str(contents: &str, skip_lines: usize) -> Result<Self> {
        let mut rdr = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(skip_preamble(contents, skip_lines).as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| CucopyError::DataSource(format!("Failed to read headers: {}", e)))?
            .clone();

        let code_idx = find_column(&headers, COUNTRY_CODE_COLUMN)?;
        let successor_idx = find_column(&headers, NEW_COUNTRY_CODE_COLUMN)?;
        let yielded_idx = find_column(&headers, YIELDED_COLUMN)?;

        let mut table = Self::new();
        for result in rdr.records() {
            let record = result
                .map_err(|e| CucopyError::DataSource(format!("Failed to read record: {}", e)))?;

            let code = match field(&record, code_idx) {
                Some(code) => code,
                None => continue,
            };
            let successor = field(&record, successor_idx);
            let yielded = field(&record, yielded_idx);
            match Succession::from_fields(successor, yielded) {
                Some(succession) => table.insert(code, succession),
                None if successor.is_some() => {
                    log::warn!("Ignoring succession for {} without a valid year", code)
                }
                None => {}
            }
        }

        Ok(table)
    }
}
