//! # rusty-cucopy
//!
//! Adjust monetary values for inflation and exchange them between regions
//! using published consumer price index and exchange-rate tables.
//!
//! Tables come from the Deutsche Bundesbank (monthly German CPI series) or
//! the World Bank (annual indicators, one row per country). Lookups tolerate
//! blank cells, follow region code migrations and decode `de`/`en` number
//! formats.
//!
//! ## Example
//!
//! ```rust,no_run
//! use rusty_cucopy::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> rusty_cucopy::error::Result<()> {
//! let settings = Settings::load(None)?;
//! let resolver = IndexResolver::bundesbank(&settings, &ParserConfig::default())?;
//!
//! let mut value = CurrencyValue::new("2006-12-01", 1_750_000.0)?;
//! value.set_target_date("2021-11-01")?;
//! value.attach_resolver(Arc::new(resolver));
//!
//! println!("{:.2}", value.equivalent_worth()?);
//! # Ok(())
//! # }
//! ```

pub mod adjust;
pub mod config;
pub mod currency;
pub mod data;
pub mod dates;
pub mod error;
pub mod exchange;
pub mod inflation;

pub mod prelude {
    //! Commonly used types and traits
    pub use crate::adjust::{adjust_batch, adjust_currency, Adjustment, AdjustmentRequest};
    pub use crate::config::{Classification, Language, ParserConfig, Settings};
    pub use crate::currency::{Currency, CurrencyValue, Notation, NotationRegistry};
    pub use crate::data::{IndexResolver, IndexSource, IndexTable, Period, TableSource};
    pub use crate::dates::DateRange;
    pub use crate::error::{CucopyError, Result};
    pub use crate::exchange::{ExchangeRates, RegionPair};
}
