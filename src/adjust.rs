//! Adjustment pipeline: inflation over a date range, then optional exchange

use crate::dates::DateRange;
use crate::data::resolver::IndexSource;
use crate::error::{CucopyError, Result};
use crate::exchange::{ExchangeRates, RegionPair};
use crate::inflation;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One adjustment to compute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdjustmentRequest {
    pub from_region: String,
    pub from_date: String,
    #[serde(default = "default_value")]
    pub value: f64,
    /// `true`: amount needed at `to_date` for the same purchasing power.
    /// `false`: purchasing power remaining at `to_date`.
    #[serde(default)]
    pub adjust_for_inflation: bool,
    #[serde(default)]
    pub to_region: Option<String>,
    #[serde(default)]
    pub to_date: Option<String>,
}

fn default_value() -> f64 {
    1.0
}

impl AdjustmentRequest {
    pub fn new(from_region: impl Into<String>, from_date: impl Into<String>, value: f64) -> Self {
        Self {
            from_region: from_region.into(),
            from_date: from_date.into(),
            value,
            adjust_for_inflation: false,
            to_region: None,
            to_date: None,
        }
    }

    pub fn equivalent_worth(mut self) -> Self {
        self.adjust_for_inflation = true;
        self
    }

    pub fn to_region(mut self, region: impl Into<String>) -> Self {
        self.to_region = Some(region.into());
        self
    }

    pub fn to_date(mut self, date: impl Into<String>) -> Self {
        self.to_date = Some(date.into());
        self
    }
}

/// Outcome of an [`AdjustmentRequest`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Adjustment {
    pub from_region: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub value: f64,
    /// Value after inflation adjustment, in the source region's currency
    pub adjusted: f64,
    /// Adjusted value converted into the target region's currency
    pub exchanged: Option<Exchanged>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchanged {
    pub region: String,
    pub value: f64,
}

impl Adjustment {
    /// Final figure: exchanged if requested, otherwise inflation-adjusted
    pub fn result(&self) -> f64 {
        self.exchanged
            .as_ref()
            .map(|e| e.value)
            .unwrap_or(self.adjusted)
    }
}

/// Adjust a value recorded in `from_region` at `from_date` to `to_date`
/// (default: one year ago) and optionally exchange it into `to_region`.
pub fn adjust_currency(
    request: &AdjustmentRequest,
    cpi: &dyn IndexSource,
    exchange: Option<&ExchangeRates>,
) -> Result<Adjustment> {
    let range = DateRange::normalize(&request.from_date, request.to_date.as_deref())?;
    adjust_over(request, range, cpi, exchange)
}

/// [`adjust_currency`] over an already validated range
pub fn adjust_over(
    request: &AdjustmentRequest,
    range: DateRange,
    cpi: &dyn IndexSource,
    exchange: Option<&ExchangeRates>,
) -> Result<Adjustment> {
    let (from, to) = range.as_tuple();

    let adjusted = if request.adjust_for_inflation {
        inflation::equivalent_worth_in(cpi, &request.from_region, request.value, from, to)?
    } else {
        inflation::purchasing_power_in(cpi, &request.from_region, request.value, from, to)?
    };

    let exchanged = match &request.to_region {
        Some(to_region) => {
            let rates = exchange.ok_or_else(|| {
                CucopyError::DataSource("No exchange-rate table loaded".to_string())
            })?;
            let pair = RegionPair::new(request.from_region.clone(), to_region.clone());
            Some(Exchanged {
                region: to_region.clone(),
                value: rates.exchange(&pair, adjusted, to)?,
            })
        }
        None => None,
    };

    Ok(Adjustment {
        from_region: request.from_region.clone(),
        from_date: from,
        to_date: to,
        value: request.value,
        adjusted,
        exchanged,
    })
}

/// Evaluate many requests. A failing entry is logged and kept as an error
/// so the rest of the batch still runs.
pub fn adjust_batch(
    requests: &[AdjustmentRequest],
    cpi: &dyn IndexSource,
    exchange: Option<&ExchangeRates>,
) -> Vec<Result<Adjustment>> {
    requests
        .iter()
        .map(|request| {
            let outcome = adjust_currency(request, cpi, exchange);
            if let Err(e) = &outcome {
                log::warn!(
                    "Skipping adjustment for {} at {}: {}",
                    request.from_region,
                    request.from_date,
                    e
                );
            }
            outcome
        })
        .collect()
}
