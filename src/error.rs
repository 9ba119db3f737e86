//! Error types for rusty-cucopy

use crate::data::period::Period;
use chrono::NaiveDate;
use thiserror::Error;

/// Main error type for rusty-cucopy
#[derive(Error, Debug)]
pub enum CucopyError {
    #[error("Incorrect date format '{0}', should be YYYY-MM-DD")]
    InvalidDateFormat(String),

    #[error("Invalid order of dates: from_date {from} has to be earlier than to_date {to}")]
    InvalidDateOrder { from: NaiveDate, to: NaiveDate },

    #[error("Unknown region: {0}")]
    UnknownRegion(String),

    #[error(
        "No index value for {region} at {period}{}",
        fmt_range(.earliest, .latest)
    )]
    IndexUnavailable {
        region: String,
        period: Period,
        earliest: Option<Period>,
        latest: Option<Period>,
    },

    #[error("No target date specified. Did you forget to call set_target_date?")]
    MissingTargetDate,

    #[error("No resolver attached. Did you forget to call attach_resolver?")]
    MissingResolver,

    #[error("No region bound and the index table has no default region")]
    MissingRegion,

    #[error("Successor fallback for {region} did not terminate: {}", .chain.join(" -> "))]
    FallbackCycle { region: String, chain: Vec<String> },

    #[error("Notation '{0}' not supported")]
    UnsupportedNotation(String),

    #[error("Notation '{0}' already defined")]
    DuplicateNotation(String),

    #[error("Currency '{0}' not supported")]
    UnsupportedCurrency(String),

    #[error("Data source error: {0}")]
    DataSource(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

fn fmt_range(earliest: &Option<Period>, latest: &Option<Period>) -> String {
    let bound = |b: &Option<Period>| b.map_or_else(|| "unknown".to_string(), |p| p.to_string());
    match (earliest, latest) {
        (None, None) => String::new(),
        _ => format!(
            "; supported periods range from {} to {}",
            bound(earliest),
            bound(latest)
        ),
    }
}

impl CucopyError {
    /// Lookup-time failures a caller iterating many requests can skip past.
    pub fn is_soft(&self) -> bool {
        matches!(
            self,
            CucopyError::UnknownRegion(_)
                | CucopyError::IndexUnavailable { .. }
                | CucopyError::MissingTargetDate
                | CucopyError::MissingResolver
                | CucopyError::MissingRegion
                | CucopyError::FallbackCycle { .. }
        )
    }
}

/// Result type alias for rusty-cucopy operations
pub type Result<T> = std::result::Result<T, CucopyError>;
