//! Exchange between regions' currencies
//!
//! Rates come from a local-currency-units-per-USD table (World Bank
//! `PA.NUS.FCRF`), so the rate from region A to region B at a date is
//! `lcu(B) / lcu(A)`. Region codes follow the same succession fallback as
//! CPI lookups, e.g. euro area members resolve to `EMU` after 1999.

use crate::config::Settings;
use crate::data::resolver::{IndexResolver, IndexSource};
use crate::error::{CucopyError, Result};
use chrono::NaiveDate;
use std::fmt;

/// Ordered (from, to) pair of region codes
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionPair {
    pub from: String,
    pub to: String,
}

impl RegionPair {
    /// Create new region pair
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Get the inverse pair
    pub fn inverse(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }
}

impl fmt::Display for RegionPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.from, self.to)
    }
}

/// Exchange rates between regions
#[derive(Debug, Clone)]
pub struct ExchangeRates {
    resolver: IndexResolver,
}

impl ExchangeRates {
    pub fn new(resolver: IndexResolver) -> Self {
        Self { resolver }
    }

    /// World Bank exchange-rate table at its configured location
    pub fn world(settings: &Settings) -> Result<Self> {
        Ok(Self::new(IndexResolver::world_table(
            settings,
            &settings.world_er_path(),
        )?))
    }

    pub fn resolver(&self) -> &IndexResolver {
        &self.resolver
    }

    /// Units of `pair.to` currency per unit of `pair.from` currency
    pub fn rate(&self, pair: &RegionPair, date: NaiveDate) -> Result<f64> {
        let from_lcu = self.resolver.index_value(&pair.from, date)?;
        let to_lcu = self.resolver.index_value(&pair.to, date)?;
        if from_lcu <= 0.0 {
            return Err(CucopyError::DataSource(format!(
                "Non-positive exchange rate {} for {}",
                from_lcu, pair.from
            )));
        }
        Ok(to_lcu / from_lcu)
    }

    /// Convert `value` from `pair.from`'s currency into `pair.to`'s
    pub fn exchange(&self, pair: &RegionPair, value: f64, date: NaiveDate) -> Result<f64> {
        Ok(value * self.rate(pair, date)?)
    }
}
