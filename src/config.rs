//! Configuration: table language, CPI series selection and data locations
//!
//! Settings are read from a TOML file. Without an explicit path the default
//! location `~/.rusty-cucopy/config.toml` is tried, then built-in defaults.
//!
//! ```toml
//! data_dir = "/var/lib/cucopy"
//! world_cpi_file = "API_FP.CPI.TOTL_DS2_en_csv_v2.csv"
//!
//! [parser]
//! language = "en"
//! delimiter = ","
//! classification = "energy"
//! ```

use crate::error::{CucopyError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Language/locale in which a table was exported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    De,
    En,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::De => "de",
            Language::En => "en",
        }
    }

    /// Field delimiter used by exports in this language
    pub fn default_delimiter(&self) -> char {
        match self {
            Language::De => ';',
            Language::En => ',',
        }
    }

    pub fn decimal_separator(&self) -> char {
        match self {
            Language::De => ',',
            Language::En => '.',
        }
    }

    pub fn thousands_separator(&self) -> char {
        match self {
            Language::De => '.',
            Language::En => ',',
        }
    }

    /// Language implied by a delimiter, if any
    pub fn from_delimiter(delimiter: char) -> Option<Self> {
        match delimiter {
            ';' => Some(Language::De),
            ',' => Some(Language::En),
            _ => None,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::De
    }
}

impl FromStr for Language {
    type Err = CucopyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "de" => Ok(Language::De),
            "en" => Ok(Language::En),
            _ => Err(CucopyError::ConfigError(format!(
                "Language '{}' not supported, expected 'de' or 'en'",
                s
            ))),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Consumer price index series published by the Deutsche Bundesbank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    All,
    Food,
    ConsumerGoodsNoEnergy,
    Energy,
    ServiceNoRent,
    Rent,
}

impl Classification {
    /// Series id within the Bundesbank time series database
    pub fn series_id(&self) -> &'static str {
        match self {
            Classification::All => "A00000",
            Classification::Food => "C2C011",
            Classification::ConsumerGoodsNoEnergy => "GOODS0MFXE",
            Classification::Energy => "NRGY00",
            Classification::ServiceNoRent => "VXR",
            Classification::Rent => "C2C041",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Classification::All => "all",
            Classification::Food => "food",
            Classification::ConsumerGoodsNoEnergy => "consumer_goods_no_energy",
            Classification::Energy => "energy",
            Classification::ServiceNoRent => "service_no_rent",
            Classification::Rent => "rent",
        }
    }

    pub fn all() -> Vec<Classification> {
        vec![
            Classification::All,
            Classification::Food,
            Classification::ConsumerGoodsNoEnergy,
            Classification::Energy,
            Classification::ServiceNoRent,
            Classification::Rent,
        ]
    }

    /// Bundesbank time series key, e.g. `BBDP1.M.DE.N.VPI.C.A00000.I15.A`
    pub fn series_key(&self) -> String {
        format!("BBDP1.M.DE.N.VPI.C.{}.I15.A", self.series_id())
    }

    pub fn file_name(&self) -> String {
        format!("{}.csv", self.series_key())
    }
}

impl Default for Classification {
    fn default() -> Self {
        Classification::All
    }
}

impl FromStr for Classification {
    type Err = CucopyError;

    /// Accepts either the series name (`energy`) or its id (`NRGY00`)
    fn from_str(s: &str) -> Result<Self> {
        Classification::all()
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(s) || c.series_id().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                CucopyError::ConfigError(format!("Unknown CPI classification: {}", s))
            })
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How to read a CPI series table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawParserConfig")]
pub struct ParserConfig {
    language: Language,
    delimiter: char,
    classification: Classification,
}

#[derive(Deserialize)]
struct RawParserConfig {
    #[serde(default)]
    language: Option<Language>,
    delimiter: Option<char>,
    #[serde(default)]
    classification: Option<Classification>,
}

impl TryFrom<RawParserConfig> for ParserConfig {
    type Error = CucopyError;

    fn try_from(raw: RawParserConfig) -> Result<Self> {
        ParserConfig::resolve(
            &ParserConfig::default(),
            raw.language,
            raw.delimiter,
            raw.classification,
        )
    }
}

impl ParserConfig {
    /// Create a validated parser configuration
    pub fn new(language: Language, delimiter: char, classification: Classification) -> Result<Self> {
        if delimiter.is_alphanumeric()
            || (delimiter.is_whitespace() && delimiter != '\t')
            || delimiter == '"'
            || delimiter == '\''
        {
            return Err(CucopyError::ConfigError(format!(
                "Invalid delimiter {:?}",
                delimiter
            )));
        }
        if delimiter == language.decimal_separator() {
            return Err(CucopyError::ConfigError(format!(
                "Delimiter {:?} collides with the decimal separator of language '{}'",
                delimiter, language
            )));
        }
        if !delimiter.is_ascii() {
            return Err(CucopyError::ConfigError(format!(
                "Delimiter {:?} must be a single-byte character",
                delimiter
            )));
        }

        Ok(Self {
            language,
            delimiter,
            classification,
        })
    }

    /// Fill in unspecified options.
    ///
    /// A delimiter given without a language implies one (`,` -> `en`,
    /// `;` -> `de`) before `defaults` is consulted. Without a delimiter the
    /// defaults' delimiter is kept unless the language changed, in which
    /// case that language's usual delimiter applies.
    pub fn resolve(
        defaults: &ParserConfig,
        language: Option<Language>,
        delimiter: Option<char>,
        classification: Option<Classification>,
    ) -> Result<Self> {
        let language = language
            .or_else(|| delimiter.and_then(Language::from_delimiter))
            .unwrap_or(defaults.language);
        let delimiter = match delimiter {
            Some(delimiter) => delimiter,
            None if language == defaults.language => defaults.delimiter,
            None => language.default_delimiter(),
        };
        let classification = classification.unwrap_or(defaults.classification);
        ParserConfig::new(language, delimiter, classification)
    }

    /// Configuration using the language's default delimiter
    pub fn for_language(language: Language, classification: Classification) -> Self {
        Self {
            language,
            delimiter: language.default_delimiter(),
            classification,
        }
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn delimiter(&self) -> char {
        self.delimiter
    }

    pub fn delimiter_byte(&self) -> u8 {
        self.delimiter as u8
    }

    pub fn classification(&self) -> Classification {
        self.classification
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self::for_language(Language::De, Classification::All)
    }
}

/// Locations of the index tables and how to read them
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_world_cpi_file")]
    pub world_cpi_file: String,
    #[serde(default = "default_world_er_file")]
    pub world_er_file: String,
    #[serde(default = "default_world_succession_file")]
    pub world_succession_file: String,
    /// Preamble lines before the header of World Bank tables
    #[serde(default = "default_world_skip_lines")]
    pub world_skip_lines: usize,
    #[serde(default)]
    pub parser: ParserConfig,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty-cucopy")
        .join("data")
}

fn default_world_cpi_file() -> String {
    "API_FP.CPI.TOTL_DS2_en_csv_v2.csv".to_string()
}

fn default_world_er_file() -> String {
    "API_PA.NUS.FCRF_DS2_en_csv_v2.csv".to_string()
}

fn default_world_succession_file() -> String {
    "country_succession.csv".to_string()
}

fn default_world_skip_lines() -> usize {
    4
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            world_cpi_file: default_world_cpi_file(),
            world_er_file: default_world_er_file(),
            world_succession_file: default_world_succession_file(),
            world_skip_lines: default_world_skip_lines(),
            parser: ParserConfig::default(),
        }
    }
}

impl Settings {
    /// Settings rooted at a specific data directory
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Load settings. An explicit path must exist and parse; otherwise the
    /// default location is tried and built-in defaults are used if absent.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(config_path) => Self::from_file(config_path),
            None => match Self::default_path() {
                Some(default_config) if default_config.exists() => {
                    Self::from_file(&default_config)
                }
                _ => Ok(Self::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            CucopyError::ConfigError(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let settings = Self::from_toml(&contents)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| CucopyError::ConfigError(format!("Failed to parse config: {}", e)))
    }

    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".rusty-cucopy").join("config.toml"))
    }

    /// Path of a Bundesbank CPI series file, keyed by language
    pub fn series_path(&self, parser: &ParserConfig) -> PathBuf {
        self.data_dir
            .join(parser.language().code())
            .join(parser.classification().file_name())
    }

    pub fn world_cpi_path(&self) -> PathBuf {
        self.data_dir.join(&self.world_cpi_file)
    }

    pub fn world_er_path(&self) -> PathBuf {
        self.data_dir.join(&self.world_er_file)
    }

    pub fn world_succession_path(&self) -> PathBuf {
        self.data_dir.join(&self.world_succession_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_separators() {
        assert_eq!(Language::De.default_delimiter(), ';');
        assert_eq!(Language::De.decimal_separator(), ',');
        assert_eq!(Language::En.default_delimiter(), ',');
        assert_eq!(Language::from_delimiter(','), Some(Language::En));
        assert_eq!(Language::from_delimiter('|'), None);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn test_classification_lookup() {
        assert_eq!("energy".parse::<Classification>().unwrap(), Classification::Energy);
        assert_eq!("C2C041".parse::<Classification>().unwrap(), Classification::Rent);
        assert!("tobacco".parse::<Classification>().is_err());
        assert_eq!(
            Classification::All.file_name(),
            "BBDP1.M.DE.N.VPI.C.A00000.I15.A.csv"
        );
    }

    #[test]
    fn test_parser_config_validation() {
        assert!(ParserConfig::new(Language::De, ';', Classification::All).is_ok());
        assert!(ParserConfig::new(Language::En, '\t', Classification::All).is_ok());
        assert!(ParserConfig::new(Language::De, ',', Classification::All).is_err());
        assert!(ParserConfig::new(Language::En, 'x', Classification::All).is_err());
        assert!(ParserConfig::new(Language::En, '"', Classification::All).is_err());
    }

    #[test]
    fn test_resolve_infers_language_from_delimiter() {
        let defaults = ParserConfig::default();

        let parser = ParserConfig::resolve(&defaults, None, Some(','), None).unwrap();
        assert_eq!(parser.language(), Language::En);
        assert_eq!(parser.delimiter(), ',');

        let parser = ParserConfig::resolve(&defaults, None, Some('|'), None).unwrap();
        assert_eq!(parser.language(), Language::De);

        // An explicit language wins over the delimiter
        assert!(ParserConfig::resolve(&defaults, Some(Language::De), Some(','), None).is_err());
    }

    #[test]
    fn test_resolve_falls_back_to_defaults() {
        let defaults = ParserConfig::new(Language::De, '\t', Classification::Energy).unwrap();

        let parser = ParserConfig::resolve(&defaults, None, None, None).unwrap();
        assert_eq!(parser, defaults);

        let parser = ParserConfig::resolve(&defaults, Some(Language::En), None, None).unwrap();
        assert_eq!(parser.delimiter(), ',');
        assert_eq!(parser.classification(), Classification::Energy);

        let parser =
            ParserConfig::resolve(&defaults, None, None, Some(Classification::Rent)).unwrap();
        assert_eq!(parser.classification(), Classification::Rent);
    }

    #[test]
    fn test_parser_section_delimiter_only() {
        let settings = Settings::from_toml("[parser]\ndelimiter = \",\"\n").unwrap();
        assert_eq!(settings.parser.language(), Language::En);
        assert_eq!(settings.parser.delimiter(), ',');
    }

    #[test]
    fn test_settings_from_toml() {
        let settings = Settings::from_toml(
            r#"
            data_dir = "/tmp/cucopy"
            world_skip_lines = 0

            [parser]
            language = "en"
            classification = "rent"
            "#,
        )
        .unwrap();

        assert_eq!(settings.data_dir, PathBuf::from("/tmp/cucopy"));
        assert_eq!(settings.world_skip_lines, 0);
        assert_eq!(settings.parser.language(), Language::En);
        assert_eq!(settings.parser.delimiter(), ',');
        assert_eq!(settings.parser.classification(), Classification::Rent);
        assert_eq!(
            settings.series_path(&settings.parser),
            PathBuf::from("/tmp/cucopy/en/BBDP1.M.DE.N.VPI.C.C2C041.I15.A.csv")
        );
    }

    #[test]
    fn test_settings_rejects_bad_parser_section() {
        let result = Settings::from_toml(
            r#"
            [parser]
            language = "de"
            delimiter = ","
            "#,
        );
        assert!(matches!(result, Err(CucopyError::ConfigError(_))));
    }

    #[test]
    fn test_settings_load_missing_explicit_path() {
        let result = Settings::load(Some(Path::new("/nonexistent/cucopy.toml")));
        assert!(matches!(result, Err(CucopyError::ConfigError(_))));
    }
}
