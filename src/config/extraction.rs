//! Compiled per-format extraction configuration

use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::types::*;
use crate::utils::dates::Zone;

/// Capture groups a configured pattern has to expose
#[derive(Debug, Clone, Copy)]
pub(crate) enum Groups {
    Any,
    AtLeast(usize),
    Named(&'static [&'static str]),
}

/// A pattern the extractor for a format knows how to use
#[derive(Debug, Clone, Copy)]
pub(crate) struct PatternSpec {
    pub name: &'static str,
    pub required: bool,
    pub groups: Groups,
}

const fn required(name: &'static str, groups: Groups) -> PatternSpec {
    PatternSpec {
        name,
        required: true,
        groups,
    }
}

const fn optional(name: &'static str, groups: Groups) -> PatternSpec {
    PatternSpec {
        name,
        required: false,
        groups,
    }
}

const LINE_GROUPS: Groups = Groups::Named(&["date", "description", "amount"]);

const CASA_PATTERNS: &[PatternSpec] = &[
    required("starting_balance", Groups::Any),
    required("ending_balance", Groups::Any),
    required("statement_date", Groups::Any),
    required("main_transaction_line", LINE_GROUPS),
    optional("description_transaction_line", Groups::Any),
    optional("account_number", Groups::Named(&["number"])),
    optional("account_label", Groups::AtLeast(1)),
];

const CARD_PATTERNS: &[PatternSpec] = &[
    required("starting_balance", Groups::Any),
    required("ending_balance", Groups::Any),
    required("statement_date", Groups::Any),
    required("transaction", LINE_GROUPS),
    optional("account_number", Groups::Named(&["number"])),
    optional("account_label", Groups::AtLeast(1)),
    optional("section_header", Groups::Named(&["kind", "number"])),
    optional("section_end", Groups::Any),
];

const WALLET_PATTERNS: &[PatternSpec] = &[
    required("transaction", Groups::AtLeast(7)),
    required("amount_numbers_pattern", Groups::AtLeast(2)),
    optional("account_number", Groups::AtLeast(1)),
    optional("statement_date", Groups::AtLeast(1)),
];

const WALLET_EMAIL_PATTERNS: &[PatternSpec] = &[
    required("transaction", Groups::AtLeast(7)),
    optional("next_entry", Groups::Any),
    optional("terminator", Groups::Any),
    optional("datetime_pattern", Groups::Any),
    optional("account_number", Groups::AtLeast(1)),
];

/// Patterns understood for a format
pub(crate) fn pattern_specs(format: FormatId) -> &'static [PatternSpec] {
    match format {
        FormatId::MaybankCasaAndMae => CASA_PATTERNS,
        FormatId::Maybank2Cc => CARD_PATTERNS,
        FormatId::Tng => WALLET_PATTERNS,
        FormatId::TngEmail => WALLET_EMAIL_PATTERNS,
        FormatId::TngCsvExport => &[],
    }
}

fn check_groups(format: FormatId, spec: &PatternSpec, regex: &Regex) -> ExtractionResult<()> {
    match spec.groups {
        Groups::Any => Ok(()),
        Groups::AtLeast(count) => {
            if regex.captures_len() > count {
                Ok(())
            } else {
                Err(ExtractionError::MissingCaptureGroup {
                    format,
                    name: spec.name.to_string(),
                    expected: format!("at least {count} group(s)"),
                })
            }
        }
        Groups::Named(names) => {
            let missing: Vec<&str> = names
                .iter()
                .copied()
                .filter(|wanted| !regex.capture_names().flatten().any(|name| name == *wanted))
                .collect();
            if missing.is_empty() {
                Ok(())
            } else {
                Err(ExtractionError::MissingCaptureGroup {
                    format,
                    name: spec.name.to_string(),
                    expected: format!("named group(s) {}", missing.join(", ")),
                })
            }
        }
    }
}

/// Immutable, shareable configuration for one format.
///
/// Every entry whose name is a known pattern for the format is compiled and
/// checked for the capture groups its extractor reads; everything else is
/// kept as a string constant (suffix markers, date layouts, labels).
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    format: FormatId,
    patterns: Arc<HashMap<String, Regex>>,
    constants: Arc<HashMap<String, String>>,
}

impl ExtractionConfig {
    /// Compile the raw entries of a format
    pub fn compile(format: FormatId, entries: &BTreeMap<String, String>) -> ExtractionResult<Self> {
        let specs = pattern_specs(format);
        let mut patterns = HashMap::new();
        let mut constants = HashMap::new();

        for (name, value) in entries {
            match specs.iter().find(|spec| spec.name == name.as_str()) {
                Some(spec) => {
                    let regex = Regex::new(value).map_err(|source| ExtractionError::InvalidPattern {
                        scope: format.to_string(),
                        name: name.clone(),
                        source,
                    })?;
                    check_groups(format, spec, &regex)?;
                    patterns.insert(name.clone(), regex);
                }
                None => {
                    constants.insert(name.clone(), value.clone());
                }
            }
        }

        if let Some(spec) = specs
            .iter()
            .find(|spec| spec.required && !patterns.contains_key(spec.name))
        {
            return Err(ExtractionError::MissingPattern {
                format,
                name: spec.name.to_string(),
            });
        }

        Ok(Self {
            format,
            patterns: Arc::new(patterns),
            constants: Arc::new(constants),
        })
    }

    pub fn format(&self) -> FormatId {
        self.format
    }

    /// A compiled pattern, if configured
    pub fn pattern(&self, name: &str) -> Option<&Regex> {
        self.patterns.get(name)
    }

    /// A pattern the format cannot work without
    pub fn required_pattern(&self, name: &str) -> ExtractionResult<&Regex> {
        self.pattern(name).ok_or_else(|| ExtractionError::MissingPattern {
            format: self.format,
            name: name.to_string(),
        })
    }

    /// A string constant, if configured
    pub fn constant(&self, name: &str) -> Option<&str> {
        self.constants.get(name).map(String::as_str)
    }

    pub fn constant_or<'a>(&'a self, name: &str, default: &'a str) -> &'a str {
        self.constant(name).unwrap_or(default)
    }

    /// A comma separated constant, split and trimmed
    pub fn list(&self, name: &str) -> Vec<&str> {
        self.constant(name)
            .map(|value| {
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Zone for document timestamps; local time when unset or unreadable
    pub fn zone(&self) -> Zone {
        match self.constant("timezone") {
            Some(value) => Zone::parse(value).unwrap_or_else(|| {
                tracing::warn!(format = %self.format, timezone = value, "Unknown timezone, using local time");
                Zone::Local
            }),
            None => Zone::Local,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::builtin_entries;

    fn entries(format: FormatId) -> BTreeMap<String, String> {
        builtin_entries(format)
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn test_builtin_entries_compile() {
        for format in FormatId::TRIAL_ORDER {
            let config = ExtractionConfig::compile(format, &entries(format)).unwrap();
            assert_eq!(config.format(), format);
        }
    }

    #[test]
    fn test_patterns_and_constants_are_separated() {
        let config =
            ExtractionConfig::compile(FormatId::MaybankCasaAndMae, &entries(FormatId::MaybankCasaAndMae))
                .unwrap();
        assert!(config.pattern("main_transaction_line").is_some());
        assert!(config.pattern("credit_suffix").is_none());
        assert_eq!(config.constant("credit_suffix"), Some("CR"));
        assert_eq!(config.constant_or("missing", "fallback"), "fallback");
    }

    #[test]
    fn test_invalid_pattern_fails_at_load() {
        let mut raw = entries(FormatId::Tng);
        raw.insert("transaction".to_string(), "([unclosed".to_string());
        assert!(matches!(
            ExtractionConfig::compile(FormatId::Tng, &raw),
            Err(ExtractionError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_missing_required_pattern() {
        let mut raw = entries(FormatId::Maybank2Cc);
        raw.remove("transaction");
        assert!(matches!(
            ExtractionConfig::compile(FormatId::Maybank2Cc, &raw),
            Err(ExtractionError::MissingPattern { .. })
        ));
    }

    #[test]
    fn test_missing_named_group() {
        let mut raw = entries(FormatId::MaybankCasaAndMae);
        raw.insert(
            "main_transaction_line".to_string(),
            r"(\d{2}/\d{2})(.+?)([\d,]*\.\d+[+-])".to_string(),
        );
        let error = ExtractionConfig::compile(FormatId::MaybankCasaAndMae, &raw).unwrap_err();
        assert!(matches!(error, ExtractionError::MissingCaptureGroup { .. }));
        assert!(error.to_string().contains("date"));
    }

    #[test]
    fn test_too_few_groups() {
        let mut raw = entries(FormatId::Tng);
        raw.insert("amount_numbers_pattern".to_string(), r"RM(\d+\.\d+)".to_string());
        assert!(matches!(
            ExtractionConfig::compile(FormatId::Tng, &raw),
            Err(ExtractionError::MissingCaptureGroup { .. })
        ));
    }

    #[test]
    fn test_list_constant() {
        let config =
            ExtractionConfig::compile(FormatId::TngEmail, &entries(FormatId::TngEmail)).unwrap();
        let credit_types = config.list("credit_transaction_types");
        assert_eq!(credit_types.len(), 4);
        assert!(credit_types.contains(&"Balance Top Up"));
    }

    #[test]
    fn test_zone_falls_back_to_local() {
        let mut raw = entries(FormatId::Tng);
        raw.insert("timezone".to_string(), "Asia/Nowhere".to_string());
        let config = ExtractionConfig::compile(FormatId::Tng, &raw).unwrap();
        assert_eq!(config.zone(), Zone::Local);
    }
}
