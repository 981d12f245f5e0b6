//! Engine configuration: account definitions and per-format settings
//!
//! Settings mirror the layout of a statement configuration file:
//!
//! ```json
//! {
//!   "accounts": [
//!     {
//!       "regex_identifier": "SAVINGS ACCOUNT-I",
//!       "statement_config": "MAYBANK_CASA_AND_MAE",
//!       "number": "123456789012",
//!       "name": "Household savings",
//!       "type": "asset",
//!       "drcr": "debit",
//!       "reconciliable": true
//!     }
//!   ],
//!   "statement": {
//!     "MAYBANK_CASA_AND_MAE": { "patterns": { "credit_suffix": "CR" } }
//!   }
//! }
//! ```
//!
//! Everything is validated once by [`EngineConfig::from_settings`]; the
//! resulting value is immutable and can be shared across threads.

pub mod defaults;
pub mod extraction;

pub use defaults::builtin_settings;
pub use extraction::ExtractionConfig;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::types::*;
use crate::utils::validation::validate_account_definition;

/// Raw settings for one format: named patterns and constants
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSettings {
    #[serde(default)]
    pub patterns: BTreeMap<String, String>,
}

/// Raw account definition as written in a settings file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDefinitionSettings {
    /// Pattern searched in the full document text
    pub regex_identifier: String,
    /// Format identifier the account's documents are written in
    pub statement_config: String,
    #[serde(default)]
    pub number: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub account_type: String,
    /// `credit`, `debit` or empty
    #[serde(default)]
    pub drcr: String,
    #[serde(default)]
    pub reconciliable: bool,
}

/// Raw engine settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    #[serde(default)]
    pub accounts: Vec<AccountDefinitionSettings>,
    /// Per-format settings keyed by format identifier
    #[serde(default)]
    pub statement: BTreeMap<String, FormatSettings>,
}

impl EngineSettings {
    pub fn from_json_str(json: &str) -> ExtractionResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| ExtractionError::Config(format!("Invalid settings JSON: {}", e)))
    }

    pub fn from_path(path: impl AsRef<Path>) -> ExtractionResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| {
            ExtractionError::Config(format!("Cannot read settings {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }
}

/// A validated account definition
#[derive(Debug, Clone)]
pub struct AccountDefinition {
    /// Pattern identifying the account's documents
    pub identifier: Regex,
    /// Format the account's documents are written in
    pub format: FormatId,
    /// Metadata attached to statements of this account
    pub account: Account,
}

impl AccountDefinition {
    pub fn from_settings(settings: &AccountDefinitionSettings) -> ExtractionResult<Self> {
        validate_account_definition(settings)?;

        let identifier = Regex::new(&settings.regex_identifier).map_err(|source| {
            ExtractionError::InvalidPattern {
                scope: format!("account '{}'", settings.name),
                name: "regex_identifier".to_string(),
                source,
            }
        })?;
        let format: FormatId = settings.statement_config.parse()?;
        let polarity = Polarity::parse(&settings.drcr).ok_or_else(|| {
            ExtractionError::InvalidAccountDefinition(format!(
                "Account '{}' has polarity '{}', expected credit, debit or empty",
                settings.name, settings.drcr
            ))
        })?;

        Ok(Self {
            identifier,
            format,
            account: Account {
                number: settings.number.clone(),
                name: settings.name.clone(),
                account_type: settings.account_type.clone(),
                polarity,
                reconciliable: settings.reconciliable,
            },
        })
    }

    /// Whether the identifying pattern occurs in the document text
    pub fn matches(&self, text: &str) -> bool {
        self.identifier.is_match(text)
    }
}

/// Validated configuration for the whole engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    accounts: Vec<AccountDefinition>,
    formats: BTreeMap<FormatId, ExtractionConfig>,
}

impl EngineConfig {
    /// Validate settings, layering each format's entries over the built-in ones
    pub fn from_settings(settings: &EngineSettings) -> ExtractionResult<Self> {
        let mut merged = builtin_settings().statement;
        for (identifier, format_settings) in &settings.statement {
            let format: FormatId = identifier.parse()?;
            merged
                .entry(format.as_str().to_string())
                .or_default()
                .patterns
                .extend(format_settings.patterns.clone());
        }

        let mut formats = BTreeMap::new();
        for (identifier, format_settings) in &merged {
            let format: FormatId = identifier.parse()?;
            formats.insert(
                format,
                ExtractionConfig::compile(format, &format_settings.patterns)?,
            );
        }

        let accounts = settings
            .accounts
            .iter()
            .map(AccountDefinition::from_settings)
            .collect::<ExtractionResult<Vec<_>>>()?;

        tracing::debug!(
            accounts = accounts.len(),
            formats = formats.len(),
            "Loaded engine configuration"
        );

        Ok(Self { accounts, formats })
    }

    /// Built-in format configuration with no account definitions
    pub fn builtin() -> ExtractionResult<Self> {
        Self::from_settings(&EngineSettings::default())
    }

    pub fn from_json_str(json: &str) -> ExtractionResult<Self> {
        Self::from_settings(&EngineSettings::from_json_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> ExtractionResult<Self> {
        Self::from_settings(&EngineSettings::from_path(path)?)
    }

    /// Account definitions in declaration order
    pub fn accounts(&self) -> &[AccountDefinition] {
        &self.accounts
    }

    /// Configuration of one format
    pub fn extraction(&self, format: FormatId) -> ExtractionResult<&ExtractionConfig> {
        self.formats
            .get(&format)
            .ok_or_else(|| ExtractionError::Config(format!("No configuration for {}", format)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SETTINGS: &str = r#"{
        "accounts": [
            {
                "regex_identifier": "SAVINGS ACCOUNT-I",
                "statement_config": "MAYBANK_CASA_AND_MAE",
                "number": "123456789012",
                "name": "Household savings",
                "type": "asset",
                "drcr": "debit",
                "reconciliable": true
            }
        ],
        "statement": {
            "MAYBANK_CASA_AND_MAE": { "patterns": { "credit_suffix": "KR" } }
        }
    }"#;

    #[test]
    fn test_builtin_config_covers_every_format() {
        let config = EngineConfig::builtin().unwrap();
        assert!(config.accounts().is_empty());
        for format in FormatId::TRIAL_ORDER {
            assert_eq!(config.extraction(format).unwrap().format(), format);
        }
    }

    #[test]
    fn test_settings_layer_over_builtin() {
        let config = EngineConfig::from_json_str(SETTINGS).unwrap();
        let casa = config.extraction(FormatId::MaybankCasaAndMae).unwrap();
        assert_eq!(casa.constant("credit_suffix"), Some("KR"));
        assert!(casa.pattern("main_transaction_line").is_some());

        let definition = &config.accounts()[0];
        assert_eq!(definition.format, FormatId::MaybankCasaAndMae);
        assert_eq!(definition.account.polarity, Polarity::Debit);
        assert_eq!(definition.account.account_type, "asset");
        assert!(definition.matches("PERSONAL SAVINGS ACCOUNT-I"));
    }

    #[test]
    fn test_unknown_format_in_account_definition() {
        let json = SETTINGS.replace("\"statement_config\": \"MAYBANK_CASA_AND_MAE\"", "\"statement_config\": \"OTHER_BANK\"");
        assert!(matches!(
            EngineConfig::from_json_str(&json),
            Err(ExtractionError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_bad_identifier_pattern() {
        let json = SETTINGS.replace("SAVINGS ACCOUNT-I", "SAVINGS (ACCOUNT");
        assert!(matches!(
            EngineConfig::from_json_str(&json),
            Err(ExtractionError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn test_bad_polarity() {
        let json = SETTINGS.replace("\"drcr\": \"debit\"", "\"drcr\": \"sideways\"");
        assert!(matches!(
            EngineConfig::from_json_str(&json),
            Err(ExtractionError::InvalidAccountDefinition(_))
        ));
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(
            EngineConfig::from_json_str("{ not json"),
            Err(ExtractionError::Config(_))
        ));
    }
}
