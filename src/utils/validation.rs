//! Validation utilities

use crate::config::AccountDefinitionSettings;
use crate::types::*;

/// Validate that an identifying pattern is present
pub fn validate_identifier(identifier: &str) -> ExtractionResult<()> {
    if identifier.trim().is_empty() {
        return Err(ExtractionError::InvalidAccountDefinition(
            "Identifying pattern cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validate that an account number is usable
pub fn validate_account_number(number: &str) -> ExtractionResult<()> {
    if number.len() > 50 {
        return Err(ExtractionError::InvalidAccountDefinition(
            "Account number cannot exceed 50 characters".to_string(),
        ));
    }

    // Account numbers are printed with digits, dashes and spaces
    if !number
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == ' ')
    {
        return Err(ExtractionError::InvalidAccountDefinition(format!(
            "Account number '{}' can only contain alphanumeric characters, dashes, underscores and spaces",
            number
        )));
    }

    Ok(())
}

/// Validate that an account name is usable
pub fn validate_account_name(name: &str) -> ExtractionResult<()> {
    if name.len() > 100 {
        return Err(ExtractionError::InvalidAccountDefinition(
            "Account name cannot exceed 100 characters".to_string(),
        ));
    }

    Ok(())
}

/// Structural checks on a raw account definition.
///
/// Pattern compilation, format lookup and polarity parsing happen when the
/// definition is built.
pub fn validate_account_definition(settings: &AccountDefinitionSettings) -> ExtractionResult<()> {
    validate_identifier(&settings.regex_identifier)?;

    if settings.statement_config.trim().is_empty() {
        return Err(ExtractionError::InvalidAccountDefinition(format!(
            "Account '{}' does not name a statement format",
            settings.name
        )));
    }

    validate_account_number(&settings.number)?;
    validate_account_name(&settings.name)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn definition() -> AccountDefinitionSettings {
        AccountDefinitionSettings {
            regex_identifier: "Wallet ID".to_string(),
            statement_config: "TNG".to_string(),
            number: "5000 1234".to_string(),
            name: "Wallet".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_definition() {
        assert!(validate_account_definition(&definition()).is_ok());
    }

    #[test]
    fn test_empty_identifier() {
        let settings = AccountDefinitionSettings {
            regex_identifier: "  ".to_string(),
            ..definition()
        };
        assert!(validate_account_definition(&settings).is_err());
    }

    #[test]
    fn test_missing_format() {
        let settings = AccountDefinitionSettings {
            statement_config: String::new(),
            ..definition()
        };
        assert!(validate_account_definition(&settings).is_err());
    }

    #[test]
    fn test_account_number_characters() {
        assert!(validate_account_number("1234-5678 90").is_ok());
        assert!(validate_account_number("").is_ok());
        assert!(validate_account_number("1234;DROP").is_err());
        assert!(validate_account_number(&"9".repeat(51)).is_err());
    }
}
