//! Error creation, message formatting and soft/hard classification

use chrono::NaiveDate;
use rusty_cucopy::data::Period;
use rusty_cucopy::error::CucopyError;

#[cfg(test)]
mod error_tests {
    use super::*;

    // ========== Hard failures ==========

    #[test]
    fn test_invalid_date_format() {
        let err = CucopyError::InvalidDateFormat("2010-13-32".to_string());
        let msg = err.to_string();
        assert!(msg.contains("2010-13-32"));
        assert!(msg.contains("YYYY-MM-DD"));
        assert!(!err.is_soft());
    }

    #[test]
    fn test_invalid_date_order() {
        let err = CucopyError::InvalidDateOrder {
            from: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            to: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("2020-01-01"));
        assert!(msg.contains("2010-01-01"));
        assert!(!err.is_soft());
    }

    #[test]
    fn test_data_source() {
        let err = CucopyError::DataSource("Column 'Country Code' not found".to_string());
        assert!(err.to_string().contains("Country Code"));
        assert!(!err.is_soft());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: CucopyError = io.into();
        assert!(matches!(err, CucopyError::IoError(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_notation_errors() {
        assert!(CucopyError::UnsupportedNotation("Q".into())
            .to_string()
            .contains("'Q' not supported"));
        assert!(CucopyError::DuplicateNotation("K".into())
            .to_string()
            .contains("'K' already defined"));
    }

    // ========== Soft failures ==========

    #[test]
    fn test_index_unavailable() {
        let err = CucopyError::IndexUnavailable {
            region: "DEU".to_string(),
            period: Period::monthly(2032, 9),
            earliest: Some(Period::monthly(1991, 1)),
            latest: Some(Period::monthly(2021, 12)),
        };
        let msg = err.to_string();
        assert!(msg.contains("DEU"));
        assert!(msg.contains("2032-09"));
        assert!(msg.contains("1991-01"));
        assert!(msg.contains("2021-12"));
        assert!(err.is_soft());
    }

    #[test]
    fn test_missing_collaborators() {
        assert!(CucopyError::MissingTargetDate
            .to_string()
            .contains("set_target_date"));
        assert!(CucopyError::MissingResolver
            .to_string()
            .contains("attach_resolver"));
        assert!(CucopyError::MissingResolver.is_soft());
        assert!(CucopyError::MissingRegion.is_soft());
    }

    #[test]
    fn test_unknown_region_and_cycle() {
        assert!(CucopyError::UnknownRegion("ABC".into()).is_soft());
        let cycle = CucopyError::FallbackCycle {
            region: "AAA".into(),
            chain: vec!["AAA".into(), "BBB".into()],
        };
        assert!(cycle.is_soft());
        assert!(cycle.to_string().contains("AAA -> BBB"));
    }
}
