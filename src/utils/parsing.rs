//! Amount and capture-group helpers shared by the extractors

use bigdecimal::BigDecimal;
use regex::Captures;
use std::str::FromStr;

use crate::types::*;

/// Parse an amount after dropping every character except digits and `.`
///
/// An empty remainder is zero. Signs, currency labels, thousands
/// separators and suffix markers are all discarded.
pub fn clean_decimal(text: &str) -> ExtractionResult<BigDecimal> {
    let digits: String = text
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();

    if digits.is_empty() {
        return Ok(BigDecimal::from(0));
    }

    BigDecimal::from_str(&digits)
        .map_err(|_| ExtractionError::InvalidAmount(text.trim().to_string()))
}

/// Parse a signed amount such as `-12.50` or `+3.00`
pub fn signed_decimal(text: &str) -> ExtractionResult<BigDecimal> {
    let trimmed = text.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);
    BigDecimal::from_str(unsigned).map_err(|_| ExtractionError::InvalidAmount(trimmed.to_string()))
}

/// Value of a balance row: the whole row cleaned, negated when it ends
/// with the credit marker
pub fn stated_balance(row: &str, credit_suffix: &str) -> ExtractionResult<BigDecimal> {
    let amount = clean_decimal(row)?;
    if has_marker(row, credit_suffix) {
        Ok(-amount)
    } else {
        Ok(amount)
    }
}

/// True when the trimmed text ends with a non-empty marker
pub fn has_marker(text: &str, marker: &str) -> bool {
    !marker.is_empty() && text.trim().ends_with(marker)
}

/// Text of a numbered group, empty when it did not participate
pub fn group<'t>(captures: &Captures<'t>, index: usize) -> &'t str {
    captures.get(index).map_or("", |m| m.as_str())
}

/// Text of a named group, empty when it did not participate
pub fn named<'t>(captures: &Captures<'t>, name: &str) -> &'t str {
    captures.name(name).map_or("", |m| m.as_str())
}

/// The first non-empty capture group, trimmed
pub fn first_group(captures: &Captures<'_>) -> Option<String> {
    captures
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str().trim())
        .find(|text| !text.is_empty())
        .map(str::to_string)
}

/// Collapse runs of double spaces the way wallet descriptions need
pub fn collapse_double_spaces(text: &str) -> String {
    text.replace("  ", " ")
}
