//! Locale-aware decoding of table cells

use crate::config::Language;

/// Decode a cell written in `language`'s number format.
///
/// Returns `None` for blank cells and for the markers statistics offices
/// put in place of missing observations (`.`, `-`, free text).
pub fn decode_number(raw: &str, language: Language) -> Option<f64> {
    let cell = raw.trim().trim_matches('"').trim();
    if cell.is_empty() {
        return None;
    }

    let thousands = language.thousands_separator();
    let decimal = language.decimal_separator();

    let normalized: String = cell
        .chars()
        .filter(|c| *c != thousands)
        .map(|c| if c == decimal { '.' } else { c })
        .collect();

    if !normalized.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}
