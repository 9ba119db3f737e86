//! Index resolution: (region, date) -> index value
//!
//! A missing cell is looked up under the region's successor code when the
//! date falls in or after the succession year. The number of successor hops
//! is bounded; revisiting a region or running past the bound fails with
//! [`CucopyError::FallbackCycle`].

use super::succession::SuccessionTable;
use super::table::{IndexTable, TableSource};
use crate::config::{ParserConfig, Settings};
use crate::error::{CucopyError, Result};
use chrono::{Datelike, NaiveDate};
use std::path::Path;
use std::sync::Arc;

/// Default number of successor hops followed per lookup
pub const DEFAULT_MAX_HOPS: usize = 1;

/// Source of index values (CPI, exchange rates) keyed by region and date
pub trait IndexSource: Send + Sync {
    /// Index value for a region at a date
    fn index_value(&self, region: &str, date: NaiveDate) -> Result<f64>;

    /// Region used when a caller does not name one
    fn default_region(&self) -> Option<&str> {
        None
    }

    /// Resolve several dates for one region
    fn index_values(&self, region: &str, dates: &[NaiveDate]) -> Vec<Result<f64>> {
        dates
            .iter()
            .map(|date| self.index_value(region, *date))
            .collect()
    }

    /// Check if a value is available
    fn has_index(&self, region: &str, date: NaiveDate) -> bool {
        self.index_value(region, date).is_ok()
    }
}

/// Resolves index values from a shared, read-only [`IndexTable`]
#[derive(Debug, Clone)]
pub struct IndexResolver {
    table: Arc<IndexTable>,
    max_hops: usize,
}

impl IndexResolver {
    pub fn new(table: IndexTable) -> Self {
        Self::from_shared(Arc::new(table))
    }

    pub fn from_shared(table: Arc<IndexTable>) -> Self {
        Self {
            table,
            max_hops: DEFAULT_MAX_HOPS,
        }
    }

    /// Set how many successor hops a lookup may follow
    pub fn with_max_hops(mut self, max_hops: usize) -> Self {
        self.max_hops = max_hops;
        self
    }

    /// Load a table with `source` and resolve against it
    pub fn load(source: &TableSource, path: &Path) -> Result<Self> {
        Ok(Self::new(source.load(path)?))
    }

    /// Bundesbank CPI series at its configured location
    pub fn bundesbank(settings: &Settings, parser: &ParserConfig) -> Result<Self> {
        Self::load(&TableSource::series(parser), &settings.series_path(parser))
    }

    /// Bundesbank CPI series from an explicit file
    pub fn bundesbank_from_path(path: &Path, parser: &ParserConfig) -> Result<Self> {
        Self::load(&TableSource::series(parser), path)
    }

    /// World Bank CPI table with succession records applied when the
    /// succession table exists
    pub fn world_cpi(settings: &Settings) -> Result<Self> {
        Self::world_table(settings, &settings.world_cpi_path())
    }

    pub(crate) fn world_table(settings: &Settings, path: &Path) -> Result<Self> {
        let mut table = TableSource::world_from_settings(settings).load(path)?;

        let succession_path = settings.world_succession_path();
        if succession_path.exists() {
            let successions = SuccessionTable::load(&succession_path, settings.world_skip_lines)?;
            let applied = table.apply_successions(&successions);
            log::debug!("Applied {} succession record(s)", applied);
        } else {
            log::debug!(
                "No succession table at {}, fallback disabled",
                succession_path.display()
            );
        }

        Ok(Self::new(table))
    }

    pub fn table(&self) -> &IndexTable {
        &self.table
    }

    pub fn shared_table(&self) -> Arc<IndexTable> {
        Arc::clone(&self.table)
    }

    pub fn max_hops(&self) -> usize {
        self.max_hops
    }

    /// Resolve the index value for `region` at `date`
    pub fn resolve(&self, region: &str, date: NaiveDate) -> Result<f64> {
        let mut chain = vec![region.to_string()];
        self.resolve_in_chain(region, date, &mut chain)
    }

    fn resolve_in_chain(&self, region: &str, date: NaiveDate, chain: &mut Vec<String>) -> Result<f64> {
        let row = self
            .table
            .row(region)
            .ok_or_else(|| CucopyError::UnknownRegion(region.to_string()))?;

        let period = self.table.granularity().period_of(date);
        if let Some(value) = row.value(period) {
            return Ok(value);
        }

        let unavailable = || CucopyError::IndexUnavailable {
            region: region.to_string(),
            period,
            earliest: row.earliest(),
            latest: row.latest(),
        };

        let succession = match row.successor() {
            Some(s) if s.applies_to(date.year()) => s,
            _ => return Err(unavailable()),
        };

        let successor = succession.successor();
        let revisits = chain.iter().any(|code| code == successor);
        chain.push(successor.to_string());
        if revisits || chain.len() - 1 > self.max_hops {
            return Err(CucopyError::FallbackCycle {
                region: chain[0].clone(),
                chain: chain.clone(),
            });
        }

        log::debug!(
            "No value for {} at {}, falling back to successor {}",
            region,
            period,
            successor
        );

        match self.resolve_in_chain(successor, date, chain) {
            Ok(value) => Ok(value),
            Err(CucopyError::UnknownRegion(_)) | Err(CucopyError::IndexUnavailable { .. }) => {
                Err(unavailable())
            }
            Err(e) => Err(e),
        }
    }
}

impl IndexSource for IndexResolver {
    fn index_value(&self, region: &str, date: NaiveDate) -> Result<f64> {
        self.resolve(region, date)
    }

    fn default_region(&self) -> Option<&str> {
        self.table.default_region()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Language;
    use crate::data::period::{Granularity, Period};
    use crate::data::table::RegionRow;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn exchange_table() -> IndexTable {
        let mut table = IndexTable::new(Granularity::Annual, Language::En);
        table.insert_row(
            RegionRow::new("DEU")
                .with_value(Period::annual(1997), Some(1.73))
                .with_value(Period::annual(1998), Some(1.76))
                .with_value(Period::annual(1999), None)
                .with_value(Period::annual(2000), None)
                .with_successor("EMU", 1999),
        );
        table.insert_row(
            RegionRow::new("EMU")
                .with_value(Period::annual(1999), Some(0.94))
                .with_value(Period::annual(2000), None),
        );
        table.insert_row(
            RegionRow::new("FRA")
                .with_value(Period::annual(1997), None)
                .with_value(Period::annual(1998), Some(5.9))
                .with_successor("EMU", 1999),
        );
        table.insert_row(RegionRow::new("XKX").with_value(Period::annual(1999), None));
        table
    }

    #[test]
    fn test_resolve_present_cell() {
        let resolver = IndexResolver::new(exchange_table());
        assert_eq!(resolver.resolve("DEU", date(1998, 6, 1)).unwrap(), 1.76);
    }

    #[test]
    fn test_unknown_region() {
        let resolver = IndexResolver::new(exchange_table());
        let err = resolver.resolve("ABC", date(1998, 6, 1)).unwrap_err();
        assert!(matches!(err, CucopyError::UnknownRegion(code) if code == "ABC"));
    }

    #[test]
    fn test_successor_fallback() {
        let resolver = IndexResolver::new(exchange_table());
        assert_eq!(resolver.resolve("DEU", date(1999, 3, 1)).unwrap(), 0.94);
    }

    #[test]
    fn test_no_fallback_before_succession_year() {
        let resolver = IndexResolver::new(exchange_table());
        let err = resolver.resolve("FRA", date(1997, 3, 1)).unwrap_err();
        match err {
            CucopyError::IndexUnavailable {
                region,
                period,
                earliest,
                latest,
            } => {
                assert_eq!(region, "FRA");
                assert_eq!(period, Period::annual(1997));
                assert_eq!(earliest, Some(Period::annual(1998)));
                assert_eq!(latest, Some(Period::annual(1998)));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_successor_also_missing_reports_primary() {
        let resolver = IndexResolver::new(exchange_table());
        let err = resolver.resolve("DEU", date(2000, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            CucopyError::IndexUnavailable { ref region, latest: Some(_), .. } if region == "DEU"
        ));
    }

    #[test]
    fn test_empty_row_has_no_bounds() {
        let resolver = IndexResolver::new(exchange_table());
        let err = resolver.resolve("XKX", date(1999, 1, 1)).unwrap_err();
        assert!(matches!(
            err,
            CucopyError::IndexUnavailable {
                earliest: None,
                latest: None,
                ..
            }
        ));
    }

    #[test]
    fn test_date_outside_columns() {
        let resolver = IndexResolver::new(exchange_table());
        let err = resolver.resolve("EMU", date(2030, 1, 1)).unwrap_err();
        assert!(matches!(err, CucopyError::IndexUnavailable { .. }));
    }

    #[test]
    fn test_cycle_is_detected() {
        let mut table = IndexTable::new(Granularity::Annual, Language::En);
        table.insert_row(
            RegionRow::new("AAA")
                .with_value(Period::annual(2000), None)
                .with_successor("BBB", 1990),
        );
        table.insert_row(
            RegionRow::new("BBB")
                .with_value(Period::annual(2000), None)
                .with_successor("AAA", 1990),
        );
        let resolver = IndexResolver::new(table).with_max_hops(5);

        let err = resolver.resolve("AAA", date(2000, 1, 1)).unwrap_err();
        match err {
            CucopyError::FallbackCycle { region, chain } => {
                assert_eq!(region, "AAA");
                assert_eq!(chain, vec!["AAA", "BBB", "AAA"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_hop_limit() {
        let mut table = IndexTable::new(Granularity::Annual, Language::En);
        table.insert_row(
            RegionRow::new("AAA")
                .with_value(Period::annual(2000), None)
                .with_successor("BBB", 1990),
        );
        table.insert_row(
            RegionRow::new("BBB")
                .with_value(Period::annual(2000), None)
                .with_successor("CCC", 1990),
        );
        table.insert_row(RegionRow::new("CCC").with_value(Period::annual(2000), Some(3.0)));

        let strict = IndexResolver::new(table.clone());
        assert!(matches!(
            strict.resolve("AAA", date(2000, 1, 1)),
            Err(CucopyError::FallbackCycle { .. })
        ));

        let lenient = IndexResolver::new(table).with_max_hops(2);
        assert_eq!(lenient.resolve("AAA", date(2000, 1, 1)).unwrap(), 3.0);
    }

    #[test]
    fn test_index_source_defaults() {
        let resolver = IndexResolver::new(exchange_table());
        assert!(resolver.has_index("DEU", date(1997, 1, 1)));
        assert!(!resolver.has_index("XKX", date(1999, 1, 1)));
        assert_eq!(resolver.default_region(), None);

        let results = resolver.index_values("DEU", &[date(1997, 1, 1), date(2000, 1, 1)]);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
    }
}
