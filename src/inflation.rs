//! Inflation adjustment over consumer price indices
//!
//! Change in price level between two dates is `target_cpi / recording_cpi`.
//! A value of 1,750,000 recorded in December 2006 (CPI 88.3) is worth
//! `1,750,000 * 110.5 / 88.3` in November 2021 (CPI 110.5).

use crate::data::resolver::IndexSource;
use crate::error::{CucopyError, Result};
use chrono::NaiveDate;

/// Amount needed at the target date for the purchasing power `value` had
/// at the recording date
pub fn equivalent_worth(value: f64, recording_index: f64, target_index: f64) -> f64 {
    value * target_index / recording_index
}

/// Purchasing power `value` retains at the target date
pub fn purchasing_power(value: f64, recording_index: f64, target_index: f64) -> f64 {
    value * recording_index / target_index
}

/// Index value for `region` at `date`; a zero or negative index cannot be
/// divided by and is rejected as bad table data
pub fn positive_index(source: &dyn IndexSource, region: &str, date: NaiveDate) -> Result<f64> {
    let index = source.index_value(region, date)?;
    if index <= 0.0 {
        return Err(CucopyError::DataSource(format!(
            "Non-positive index {} for {} at {}",
            index, region, date
        )));
    }
    Ok(index)
}

/// [`equivalent_worth`] with both indices resolved for `region`
pub fn equivalent_worth_in(
    source: &dyn IndexSource,
    region: &str,
    value: f64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<f64> {
    let recording_index = positive_index(source, region, from)?;
    let target_index = positive_index(source, region, to)?;
    Ok(equivalent_worth(value, recording_index, target_index))
}

/// [`purchasing_power`] with both indices resolved for `region`
pub fn purchasing_power_in(
    source: &dyn IndexSource,
    region: &str,
    value: f64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<f64> {
    let recording_index = positive_index(source, region, from)?;
    let target_index = positive_index(source, region, to)?;
    Ok(purchasing_power(value, recording_index, target_index))
}
