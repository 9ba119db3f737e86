//! Monetary values with a recording date, notation and currency

use crate::dates::parse_date;
use crate::data::resolver::IndexSource;
use crate::error::{CucopyError, Result};
use crate::inflation;
use chrono::NaiveDate;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Currency enumeration (ISO 4217 codes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Currency {
    /// Euro
    EUR,
}

impl Currency {
    /// Get ISO 4217 code
    pub fn code(&self) -> &'static str {
        match self {
            Currency::EUR => "EUR",
        }
    }

    /// Get currency symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::EUR => "€",
        }
    }

    /// Parse from ISO code
    pub fn from_code(code: &str) -> Result<Self> {
        match code.to_uppercase().as_str() {
            "EUR" => Ok(Currency::EUR),
            _ => Err(CucopyError::UnsupportedCurrency(code.to_string())),
        }
    }

    /// Get all supported currencies
    pub fn all() -> Vec<Currency> {
        vec![Currency::EUR]
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::EUR
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Largest power of ten that is a finite `f64`
pub const MAX_NOTATION_POWER: u32 = f64::MAX_10_EXP as u32;

/// Scale of a value: `value * 10^power`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Notation {
    symbol: String,
    power: u32,
}

impl Notation {
    pub fn new(symbol: impl Into<String>, power: u32) -> Self {
        Self {
            symbol: symbol.into(),
            power,
        }
    }

    /// No scaling
    pub fn unit() -> Self {
        Self::new("", 0)
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn power(&self) -> u32 {
        self.power
    }

    pub fn multiplier(&self) -> f64 {
        match i32::try_from(self.power) {
            Ok(power) => 10f64.powi(power),
            Err(_) => f64::INFINITY,
        }
    }
}

impl Default for Notation {
    fn default() -> Self {
        Self::unit()
    }
}

/// Caller-owned set of known notations, symbols unique.
///
/// Starts with `""`, `K`, `M`, `B` and `T`.
#[derive(Debug, Clone)]
pub struct NotationRegistry {
    notations: HashMap<String, Notation>,
}

impl NotationRegistry {
    pub fn new() -> Self {
        let mut notations = HashMap::new();
        for (symbol, power) in [("", 0), ("K", 3), ("M", 6), ("B", 9), ("T", 12)] {
            notations.insert(symbol.to_string(), Notation::new(symbol, power));
        }
        Self { notations }
    }

    /// Register a custom notation worth `10^power`
    pub fn register(&mut self, symbol: impl Into<String>, power: u32) -> Result<Notation> {
        let symbol = symbol.into();
        if self.notations.contains_key(&symbol) {
            return Err(CucopyError::DuplicateNotation(symbol));
        }
        if power > MAX_NOTATION_POWER {
            return Err(CucopyError::ConfigError(format!(
                "Notation '{}' power {} exceeds {}",
                symbol, power, MAX_NOTATION_POWER
            )));
        }
        let notation = Notation::new(symbol.clone(), power);
        self.notations.insert(symbol, notation.clone());
        Ok(notation)
    }

    pub fn get(&self, symbol: &str) -> Result<&Notation> {
        self.notations
            .get(symbol)
            .ok_or_else(|| CucopyError::UnsupportedNotation(symbol.to_string()))
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.notations.contains_key(symbol)
    }

    /// Symbols ordered by scale
    pub fn symbols(&self) -> Vec<&str> {
        let mut all: Vec<&Notation> = self.notations.values().collect();
        all.sort_by_key(|n| (n.power, n.symbol.clone()));
        all.into_iter().map(|n| n.symbol.as_str()).collect()
    }
}

impl Default for NotationRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// A value recorded at a date, to be adjusted to a target date.
///
/// ```
/// use rusty_cucopy::prelude::*;
/// use rusty_cucopy::data::{IndexTable, RegionRow, Period, Granularity};
/// use rusty_cucopy::config::Language;
/// use std::sync::Arc;
///
/// let mut table = IndexTable::new(Granularity::Monthly, Language::De);
/// table.insert_row(
///     RegionRow::new("A00000")
///         .with_value(Period::monthly(2006, 12), Some(88.3))
///         .with_value(Period::monthly(2021, 11), Some(110.5)),
/// );
///
/// let mut value = CurrencyValue::new("2006-12-01", 1_750_000.0).unwrap();
/// value.set_target_date("2021-11-01").unwrap();
/// value.attach_resolver(Arc::new(IndexResolver::new(table)));
///
/// let worth = value.equivalent_worth().unwrap();
/// assert!((worth - 2_189_977.35).abs() < 0.01);
/// ```
#[derive(Clone)]
pub struct CurrencyValue {
    recording_date: NaiveDate,
    value: f64,
    notation: Notation,
    currency: Currency,
    region: Option<String>,
    target_date: Option<NaiveDate>,
    resolver: Option<Arc<dyn IndexSource>>,
}

impl CurrencyValue {
    /// Value recorded at `recording_date` (`YYYY-MM-DD`), in euros, unscaled
    pub fn new(recording_date: &str, value: f64) -> Result<Self> {
        Ok(Self::at(parse_date(recording_date)?, value))
    }

    pub fn at(recording_date: NaiveDate, value: f64) -> Self {
        Self {
            recording_date,
            value,
            notation: Notation::unit(),
            currency: Currency::default(),
            region: None,
            target_date: None,
            resolver: None,
        }
    }

    /// Use a notation known to `registry`
    pub fn with_notation(mut self, symbol: &str, registry: &NotationRegistry) -> Result<Self> {
        self.notation = registry.get(symbol)?.clone();
        Ok(self)
    }

    pub fn with_currency(mut self, code: &str) -> Result<Self> {
        self.currency = Currency::from_code(code)?;
        Ok(self)
    }

    /// Region whose index values apply; defaults to the resolver's
    /// default region
    pub fn in_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn set_target_date(&mut self, date: &str) -> Result<()> {
        self.target_date = Some(parse_date(date)?);
        Ok(())
    }

    pub fn set_target(&mut self, date: NaiveDate) {
        self.target_date = Some(date);
    }

    /// Attach the index source used by the adjustments. Nothing is resolved yet.
    pub fn attach_resolver(&mut self, resolver: Arc<dyn IndexSource>) {
        self.resolver = Some(resolver);
    }

    pub fn recording_date(&self) -> NaiveDate {
        self.recording_date
    }

    pub fn target_date(&self) -> Option<NaiveDate> {
        self.target_date
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn notation(&self) -> &Notation {
        &self.notation
    }

    pub fn currency(&self) -> Currency {
        self.currency
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    /// Value with its notation applied
    pub fn absolute_value(&self) -> f64 {
        self.value * self.notation.multiplier()
    }

    /// (recording index, target index)
    pub fn index_values(&self) -> Result<(f64, f64)> {
        let resolver = self.resolver.as_ref().ok_or(CucopyError::MissingResolver)?;
        let target_date = self.target_date.ok_or(CucopyError::MissingTargetDate)?;
        let region = match self.region.as_deref() {
            Some(region) => region,
            None => resolver.default_region().ok_or(CucopyError::MissingRegion)?,
        };

        let recording_index =
            inflation::positive_index(resolver.as_ref(), region, self.recording_date)?;
        let target_index = inflation::positive_index(resolver.as_ref(), region, target_date)?;
        Ok((recording_index, target_index))
    }

    /// Amount at the target date with the purchasing power this value had
    /// at its recording date, in the value's notation
    pub fn equivalent_worth(&self) -> Result<f64> {
        let (recording_index, target_index) = self.index_values()?;
        Ok(inflation::equivalent_worth(
            self.value,
            recording_index,
            target_index,
        ))
    }

    /// Purchasing power this value retains at the target date
    pub fn purchasing_power(&self) -> Result<f64> {
        let (recording_index, target_index) = self.index_values()?;
        Ok(inflation::purchasing_power(
            self.value,
            recording_index,
            target_index,
        ))
    }
}

impl fmt::Debug for CurrencyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrencyValue")
            .field("recording_date", &self.recording_date)
            .field("value", &self.value)
            .field("notation", &self.notation)
            .field("currency", &self.currency)
            .field("region", &self.region)
            .field("target_date", &self.target_date)
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

impl fmt::Display for CurrencyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{} ({})",
            self.value,
            self.notation.symbol(),
            self.currency.symbol(),
            self.recording_date
        )
    }
}
