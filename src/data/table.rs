//! Index tables loaded from delimited files
//!
//! Two layouts are understood:
//!
//! - **Wide** (World Bank): a few preamble lines, then a header with a region
//!   column and one column per period. One row per region.
//! - **Series** (Deutsche Bundesbank): one period per line, value in the
//!   second column, with unit/source/footnote lines interleaved. The whole
//!   file becomes a single row keyed by the series id.

use super::locale::decode_number;
use super::period::{Granularity, Period};
use super::succession::{Succession, SuccessionTable};
use crate::config::{Language, ParserConfig, Settings};
use crate::error::{CucopyError, Result};
use csv::{ReaderBuilder, StringRecord};
use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

pub const COUNTRY_CODE_COLUMN: &str = "Country Code";
pub const COUNTRY_NAME_COLUMN: &str = "Country Name";
pub const NEW_COUNTRY_CODE_COLUMN: &str = "New Country Code";
pub const YIELDED_COLUMN: &str = "Yielded";

/// One region's observations
#[derive(Debug, Clone, PartialEq)]
pub struct RegionRow {
    code: String,
    name: Option<String>,
    cells: BTreeMap<Period, Option<f64>>,
    succession: Option<Succession>,
}

impl RegionRow {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: None,
            cells: BTreeMap::new(),
            succession: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_value(mut self, period: Period, value: Option<f64>) -> Self {
        self.cells.insert(period, value);
        self
    }

    pub fn with_successor(mut self, successor: impl Into<String>, since_year: i32) -> Self {
        self.succession = Some(Succession::new(successor, since_year));
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Cell for a period; `None` if the column is absent or the cell is blank
    pub fn value(&self, period: Period) -> Option<f64> {
        self.cells.get(&period).copied().flatten()
    }

    pub fn periods(&self) -> impl Iterator<Item = &Period> {
        self.cells.keys()
    }

    /// First period with a recorded value
    pub fn earliest(&self) -> Option<Period> {
        self.cells
            .iter()
            .find(|(_, v)| v.is_some())
            .map(|(p, _)| *p)
    }

    /// Last period with a recorded value
    pub fn latest(&self) -> Option<Period> {
        self.cells
            .iter()
            .rev()
            .find(|(_, v)| v.is_some())
            .map(|(p, _)| *p)
    }

    pub fn successor(&self) -> Option<&Succession> {
        self.succession.as_ref()
    }

    pub(crate) fn set_succession(&mut self, succession: Succession) {
        self.succession = Some(succession);
    }
}

/// Region code -> row, loaded once and read-only afterwards
#[derive(Debug, Clone)]
pub struct IndexTable {
    rows: HashMap<String, RegionRow>,
    order: Vec<String>,
    granularity: Granularity,
    language: Language,
}

impl IndexTable {
    pub fn new(granularity: Granularity, language: Language) -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
            granularity,
            language,
        }
    }

    /// Add a row. A region already present keeps its first row.
    pub fn insert_row(&mut self, row: RegionRow) -> bool {
        if self.rows.contains_key(row.code()) {
            log::warn!("Duplicate region {} ignored", row.code());
            return false;
        }
        self.order.push(row.code.clone());
        self.rows.insert(row.code.clone(), row);
        true
    }

    pub fn row(&self, code: &str) -> Option<&RegionRow> {
        self.rows.get(code)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rows.contains_key(code)
    }

    /// Region codes in file order
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn language(&self) -> Language {
        self.language
    }

    /// The only region of a single-row table
    pub fn default_region(&self) -> Option<&str> {
        if self.order.len() == 1 {
            self.order.first().map(|s| s.as_str())
        } else {
            None
        }
    }

    /// First and last period with data in any row
    pub fn span(&self) -> Option<(Period, Period)> {
        let first = self.rows.values().filter_map(|r| r.earliest()).min()?;
        let last = self.rows.values().filter_map(|r| r.latest()).max()?;
        Some((first, last))
    }

    /// Attach succession records to matching rows, returning how many applied
    pub fn apply_successions(&mut self, successions: &SuccessionTable) -> usize {
        let mut applied = 0;
        for (code, succession) in successions.iter() {
            if let Some(row) = self.rows.get_mut(code) {
                row.set_succession(succession.clone());
                applied += 1;
            }
        }
        applied
    }
}

/// Physical layout of a table file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableFormat {
    Wide {
        skip_lines: usize,
        region_column: String,
    },
    Series {
        region: String,
    },
}

/// Loads [`IndexTable`]s from delimited files
#[derive(Debug, Clone)]
pub struct TableSource {
    format: TableFormat,
    language: Language,
    delimiter: u8,
}

impl TableSource {
    pub fn new(format: TableFormat, language: Language, delimiter: u8) -> Self {
        Self {
            format,
            language,
            delimiter,
        }
    }

    /// World Bank indicator table
    pub fn world(skip_lines: usize) -> Self {
        Self::new(
            TableFormat::Wide {
                skip_lines,
                region_column: COUNTRY_CODE_COLUMN.to_string(),
            },
            Language::En,
            b',',
        )
    }

    /// Bundesbank series table described by a parser configuration
    pub fn series(parser: &ParserConfig) -> Self {
        Self::new(
            TableFormat::Series {
                region: parser.classification().series_id().to_string(),
            },
            parser.language(),
            parser.delimiter_byte(),
        )
    }

    pub fn world_from_settings(settings: &Settings) -> Self {
        Self::world(settings.world_skip_lines)
    }

    pub fn format(&self) -> &TableFormat {
        &self.format
    }

    pub fn load(&self, path: &Path) -> Result<IndexTable> {
        let contents = read_source(path)?;
        let table = self.load_from_str(&contents).map_err(|e| match e {
            CucopyError::DataSource(msg) => {
                CucopyError::DataSource(format!("{}: {}", path.display(), msg))
            }
            other => other,
        })?;

        match table.span() {
            Some((first, last)) => log::info!(
                "Loaded {} region(s) from {} covering {} to {}",
                table.len(),
                path.display(),
                first,
                last
            ),
            None => log::info!(
                "Loaded {} region(s) from {} without any values",
                table.len(),
                path.display()
            ),
        }
        Ok(table)
    }

    pub fn load_from_str(&self, contents: &str) -> Result<IndexTable> {
        match &self.format {
            TableFormat::Wide {
                skip_lines,
                region_column,
            } => self.load_wide(skip_preamble(contents, *skip_lines), region_column),
            TableFormat::Series { region } => self.load_series(skip_preamble(contents, 0), region),
        }
    }

    fn load_wide(&self, contents: &str, region_column: &str) -> Result<IndexTable> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let headers = rdr
            .headers()
            .map_err(|e| CucopyError::DataSource(format!("Failed to read headers: {}", e)))?
            .clone();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(CucopyError::DataSource("No header row".to_string()));
        }

        let region_idx = find_column(&headers, region_column)?;
        let name_idx = find_column(&headers, COUNTRY_NAME_COLUMN).ok();
        let successor_idx = find_column(&headers, NEW_COUNTRY_CODE_COLUMN).ok();
        let yielded_idx = find_column(&headers, YIELDED_COLUMN).ok();

        let period_columns: Vec<(usize, Period)> = headers
            .iter()
            .enumerate()
            .filter_map(|(idx, h)| Period::parse(h).map(|p| (idx, p)))
            .collect();
        let granularity =
            uniform_granularity(period_columns.iter().map(|(_, p)| *p), "period columns")?;

        let mut table = IndexTable::new(granularity, self.language);

        for result in rdr.records() {
            let record = result
                .map_err(|e| CucopyError::DataSource(format!("Failed to read record: {}", e)))?;

            let code = match field(&record, region_idx) {
                Some(code) => code,
                None => continue,
            };

            let mut row = RegionRow::new(code);
            if let Some(name) = name_idx.and_then(|idx| field(&record, idx)) {
                row = row.with_name(name);
            }
            for (idx, period) in &period_columns {
                let value = record
                    .get(*idx)
                    .and_then(|raw| decode_number(raw, self.language));
                row.cells.insert(*period, value);
            }
            if let (Some(s_idx), Some(y_idx)) = (successor_idx, yielded_idx) {
                if let Some(succession) =
                    Succession::from_fields(field(&record, s_idx), field(&record, y_idx))
                {
                    row.set_succession(succession);
                }
            }

            table.insert_row(row);
        }

        Ok(table)
    }

    fn load_series(&self, contents: &str, region: &str) -> Result<IndexTable> {
        let mut rdr = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(true)
            .from_reader(contents.as_bytes());

        let mut row = RegionRow::new(region);
        let mut seen_header = false;
        let mut widest = 0;

        for result in rdr.records() {
            let record = result
                .map_err(|e| CucopyError::DataSource(format!("Failed to read record: {}", e)))?;
            widest = widest.max(record.len());

            let period = match record.get(0).and_then(Period::parse) {
                Some(period) => period,
                None => {
                    seen_header = true;
                    continue;
                }
            };
            let value = record
                .get(1)
                .and_then(|raw| decode_number(raw, self.language));
            row.cells.insert(period, value);
        }

        if !seen_header {
            return Err(CucopyError::DataSource("No header row".to_string()));
        }
        if widest < 2 {
            return Err(CucopyError::DataSource(
                "Expected a period column and a value column".to_string(),
            ));
        }

        let granularity = uniform_granularity(row.periods().copied(), "period rows")?;
        let mut table = IndexTable::new(granularity, self.language);
        table.insert_row(row);
        Ok(table)
    }
}

/// Read a table file. Non-UTF-8 bytes (Latin-1 exports) are replaced.
pub(crate) fn read_source(path: &Path) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| {
        CucopyError::DataSource(format!("Failed to open {}: {}", path.display(), e))
    })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Drop a byte-order mark and `n` preamble lines
pub(crate) fn skip_preamble(contents: &str, n: usize) -> &str {
    let mut rest = contents.trim_start_matches('\u{feff}');
    for _ in 0..n {
        match rest.find('\n') {
            Some(i) => rest = &rest[i + 1..],
            None => return "",
        }
    }
    rest
}

/// Find column index by name
pub(crate) fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h.trim().trim_matches('"').eq_ignore_ascii_case(name))
        .ok_or_else(|| CucopyError::DataSource(format!("Column '{}' not found", name)))
}

/// Trimmed, non-empty field
pub(crate) fn field(record: &StringRecord, idx: usize) -> Option<&str> {
    record
        .get(idx)
        .map(|s| s.trim().trim_matches('"').trim())
        .filter(|s| !s.is_empty())
}

fn uniform_granularity(
    mut periods: impl Iterator<Item = Period>,
    what: &str,
) -> Result<Granularity> {
    let first = periods
        .next()
        .ok_or_else(|| CucopyError::DataSource(format!("No {} found", what)))?;
    let granularity = first.granularity();
    if periods.any(|p| p.granularity() != granularity) {
        return Err(CucopyError::DataSource(format!(
            "Mixed annual and monthly {}",
            what
        )));
    }
    Ok(granularity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Classification;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const WORLD: &str = "\u{feff}\"Data Source\",\"World Development Indicators\",\n\
        \n\
        \"Last Updated Date\",\"2022-06-30\",\n\
        \n\
        \"Country Name\",\"Country Code\",\"Indicator Name\",\"Indicator Code\",\"2019\",\"2020\",\"2021\",\n\
        \"Germany\",\"DEU\",\"Consumer price index (2010 = 100)\",\"FP.CPI.TOTL\",\"112.9\",\"113.5\",\"117.1\",\n\
        \"Kosovo\",\"XKX\",\"Consumer price index (2010 = 100)\",\"FP.CPI.TOTL\",\"\",\"\",\"\",\n";

    const BUNDESBANK_DE: &str = ";BBDP1.M.DE.N.VPI.C.A00000.I15.A;BBK_STD_FLAGS\n\
        Einheit;2015 = 100;\n\
        Dimension;Eins;\n\
        2006-11;88,1;\n\
        2006-12;88,3;\n\
        2007-01;.;Kein Wert vorhanden\n";

    #[test]
    fn test_load_wide() {
        let table = TableSource::world(4).load_from_str(WORLD).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.granularity(), Granularity::Annual);

        let deu = table.row("DEU").unwrap();
        assert_eq!(deu.name(), Some("Germany"));
        assert_eq!(deu.value(Period::annual(2020)), Some(113.5));
        assert_eq!(deu.earliest(), Some(Period::annual(2019)));
        assert_eq!(deu.latest(), Some(Period::annual(2021)));

        let xkx = table.row("XKX").unwrap();
        assert_eq!(xkx.value(Period::annual(2020)), None);
        assert_eq!(xkx.earliest(), None);
        assert_eq!(xkx.latest(), None);
        assert_eq!(table.regions().collect::<Vec<_>>(), vec!["DEU", "XKX"]);
    }

    #[test]
    fn test_load_wide_missing_region_column() {
        let result = TableSource::world(0).load_from_str("\"Name\",\"2020\"\n\"x\",\"1\"\n");
        assert!(matches!(result, Err(CucopyError::DataSource(msg)) if msg.contains("Country Code")));
    }

    #[test]
    fn test_load_wide_without_header() {
        let result = TableSource::world(4).load_from_str("a\nb\n");
        assert!(matches!(result, Err(CucopyError::DataSource(_))));
    }

    #[test]
    fn test_load_wide_without_periods() {
        let result = TableSource::world(0).load_from_str("Country Code,Note\nDEU,x\n");
        assert!(matches!(result, Err(CucopyError::DataSource(msg)) if msg.contains("period")));
    }

    #[test]
    fn test_load_wide_mixed_periods() {
        let result =
            TableSource::world(0).load_from_str("Country Code,2019,2019-05\nDEU,112.9,113.1\n");
        assert!(matches!(result, Err(CucopyError::DataSource(msg)) if msg.contains("Mixed")));
    }

    #[test]
    fn test_load_series_mixed_periods() {
        let parser = ParserConfig::default();
        let result = TableSource::series(&parser)
            .load_from_str(";BBDP1.M.DE.N.VPI.C.A00000.I15.A;\n2019;112,9;\n2019-05;113,1;\n");
        assert!(matches!(result, Err(CucopyError::DataSource(msg)) if msg.contains("Mixed")));
    }

    #[test]
    fn test_load_series_german() {
        let parser = ParserConfig::default();
        let table = TableSource::series(&parser).load_from_str(BUNDESBANK_DE).unwrap();

        assert_eq!(table.granularity(), Granularity::Monthly);
        assert_eq!(table.default_region(), Some("A00000"));
        let row = table.row("A00000").unwrap();
        assert_eq!(row.value(Period::monthly(2006, 12)), Some(88.3));
        assert_eq!(row.value(Period::monthly(2007, 1)), None);
        assert_eq!(row.latest(), Some(Period::monthly(2006, 12)));
    }

    #[test]
    fn test_load_series_english() {
        let parser = ParserConfig::for_language(Language::En, Classification::Energy);
        let contents = ",BBDP1.M.DE.N.VPI.C.NRGY00.I15.A,BBK_STD_FLAGS\n\
            unit,2015 = 100,\n\
            2021-11,\"1,110.5\",\n";
        let table = TableSource::series(&parser).load_from_str(contents).unwrap();
        let row = table.row("NRGY00").unwrap();
        assert_eq!(row.value(Period::monthly(2021, 11)), Some(1110.5));
    }

    #[test]
    fn test_load_series_without_periods() {
        let parser = ParserConfig::default();
        let result = TableSource::series(&parser).load_from_str(";header\nEinheit;2015 = 100\n");
        assert!(matches!(result, Err(CucopyError::DataSource(_))));
    }

    #[test]
    fn test_load_series_single_column() {
        let parser = ParserConfig::default();
        let result = TableSource::series(&parser).load_from_str("header\n2006-12\n");
        assert!(matches!(result, Err(CucopyError::DataSource(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = TableSource::world(4).load(Path::new("/nonexistent/table.csv"));
        assert!(matches!(result, Err(CucopyError::DataSource(_))));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", WORLD).unwrap();
        file.flush().unwrap();

        let table = TableSource::world(4).load(file.path()).unwrap();
        assert_eq!(table.span(), Some((Period::annual(2019), Period::annual(2021))));
    }

    #[test]
    fn test_inline_succession_columns() {
        let contents = "Country Code,New Country Code,Yielded,1998,1999\n\
            DEU,EMU,1999,1.97,\n\
            EMU,,,,0.94\n";
        let table = TableSource::world(0).load_from_str(contents).unwrap();
        let succession = table.row("DEU").unwrap().successor().unwrap();
        assert_eq!(succession.successor(), "EMU");
        assert_eq!(succession.since_year(), 1999);
        assert!(table.row("EMU").unwrap().successor().is_none());
    }
}
