//! Merging extractor output with configured account metadata

use crate::types::*;

/// Applies a resolved account definition to extracted statements.
///
/// Configured values win over what the extractor read from the document,
/// but only where the definition actually says something: empty strings
/// and an unspecified polarity leave the extracted value alone. A
/// configured account number is ignored when the document produced more
/// than one statement, since each of those carries its own number. A
/// definition cannot make a format reconciliable when it has no printed
/// statement to reconcile against.
pub struct StatementAssembler;

impl StatementAssembler {
    pub fn assemble(
        mut statements: Vec<Statement>,
        format: FormatId,
        configured: Option<&Account>,
    ) -> Vec<Statement> {
        let Some(configured) = configured else {
            return statements;
        };

        let single = statements.len() == 1;
        for statement in &mut statements {
            let account = &mut statement.account;

            if single && !configured.number.is_empty() {
                account.number = configured.number.clone();
            }
            if !configured.name.is_empty() {
                account.name = configured.name.clone();
            }
            if !configured.account_type.is_empty() {
                account.account_type = configured.account_type.clone();
            }
            if !configured.polarity.is_unspecified() {
                account.polarity = configured.polarity;
            }
            account.reconciliable = configured.reconciliable && format.is_reconciliable();
        }

        statements
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extracted(number: &str) -> Statement {
        let mut statement = Statement::new("doc");
        statement.account = Account {
            number: number.to_string(),
            name: "MAYBANK 2 GOLD AMEX".to_string(),
            polarity: Polarity::Credit,
            reconciliable: true,
            ..Account::default()
        };
        statement
    }

    #[test]
    fn test_without_definition_nothing_changes() {
        let statements = StatementAssembler::assemble(vec![extracted("1")], FormatId::Maybank2Cc, None);
        assert_eq!(statements[0].account.number, "1");
        assert!(statements[0].account.reconciliable);
    }

    #[test]
    fn test_non_empty_fields_override() {
        let configured = Account {
            number: "999".to_string(),
            name: String::new(),
            account_type: "liability".to_string(),
            polarity: Polarity::Unspecified,
            reconciliable: false,
        };

        let statements = StatementAssembler::assemble(vec![extracted("1")], FormatId::Maybank2Cc, Some(&configured));
        let account = &statements[0].account;

        assert_eq!(account.number, "999");
        assert_eq!(account.name, "MAYBANK 2 GOLD AMEX");
        assert_eq!(account.account_type, "liability");
        assert_eq!(account.polarity, Polarity::Credit);
        assert!(!account.reconciliable);
    }

    #[test]
    fn test_number_kept_for_multiple_statements() {
        let configured = Account {
            number: "999".to_string(),
            name: "Cards".to_string(),
            polarity: Polarity::Debit,
            ..Account::default()
        };

        let statements = StatementAssembler::assemble(
            vec![extracted("1"), extracted("2")],
            FormatId::Maybank2Cc,
            Some(&configured),
        );

        assert_eq!(statements[0].account.number, "1");
        assert_eq!(statements[1].account.number, "2");
        assert_eq!(statements[1].account.name, "Cards");
        assert_eq!(statements[1].account.polarity, Polarity::Debit);
    }

    #[test]
    fn test_card_export_stays_unreconciliable() {
        let configured = Account {
            name: "Toll card".to_string(),
            reconciliable: true,
            ..Account::default()
        };
        let mut export = extracted("0123456789");
        export.account.reconciliable = false;

        let statements = StatementAssembler::assemble(vec![export], FormatId::TngCsvExport, Some(&configured));

        assert_eq!(statements[0].account.name, "Toll card");
        assert!(!statements[0].account.reconciliable);
    }
}
