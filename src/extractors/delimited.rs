//! E-wallet statements with several records per rendered row

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use regex::Captures;

use crate::config::ExtractionConfig;
use crate::traits::StatementExtractor;
use crate::types::*;
use crate::utils::dates::{parse_date, parse_datetime, Zone};
use crate::utils::parsing::{collapse_double_spaces, group, signed_decimal};

const EXIT_TOLL_PREFIX: &str = "Exit Toll: ";

/// Wallet statement parser.
///
/// Every match of the record pattern in a row is one transaction; the
/// statement has no printed balances, so only totals and the date range
/// are derived.
pub struct DelimitedMultiMatchExtractor;

struct RecordReader<'c> {
    config: &'c ExtractionConfig,
    amount_pattern: &'c regex::Regex,
    datetime_format: &'c str,
    debit_marker: &'c str,
    zone: Zone,
}

impl RecordReader<'_> {
    fn descriptions(captures: &Captures<'_>) -> Vec<String> {
        let description = collapse_double_spaces(group(captures, 1).trim());
        let location = group(captures, 4).to_string();

        match description.strip_prefix(EXIT_TOLL_PREFIX) {
            Some(rest) => vec!["Exit Toll".to_string(), rest.to_string(), location],
            None => vec![description, location],
        }
    }

    fn read(&self, captures: &Captures<'_>, statement: &mut Statement) -> Option<Transaction> {
        let stamp = format!("{} {}", group(captures, 2), group(captures, 3));
        let date: DateTime<FixedOffset> = match parse_datetime(&stamp, self.datetime_format) {
            Ok(naive) => self.zone.localize(naive),
            Err(e) => {
                statement.record_warning(format!("Skipping wallet record: {}", e));
                return None;
            }
        };

        let amount_field = group(captures, 7);
        let Some(amount_captures) = self.amount_pattern.captures(amount_field) else {
            statement.record_warning(format!("Skipping wallet record without amount: '{}'", amount_field));
            return None;
        };
        let sign = group(&amount_captures, 1);
        let amount = match signed_decimal(&format!("{}{}", sign, group(&amount_captures, 2))) {
            Ok(amount) => amount,
            Err(e) => {
                statement.record_warning(format!("Skipping wallet record: {}", e));
                return None;
            }
        };

        let transaction_type = if !self.debit_marker.is_empty() && sign == self.debit_marker {
            TransactionType::Debit
        } else {
            TransactionType::Credit
        };

        let mut transaction = Transaction::new(0, date, transaction_type, amount);
        transaction.descriptions = Self::descriptions(captures);
        transaction.reference = format!("{}{}", group(captures, 5), group(captures, 6));
        Some(transaction)
    }

    fn statement_date(&self, text: &str) -> Option<chrono::NaiveDate> {
        let captures = self.config.pattern("statement_date")?.captures(text)?;
        let format = self.config.constant_or("statement_date_format", "%d %B %Y");
        parse_date(group(&captures, 1), format).ok()
    }
}

impl StatementExtractor for DelimitedMultiMatchExtractor {
    fn format(&self) -> FormatId {
        FormatId::Tng
    }

    fn extract(&self, document: &Document, config: &ExtractionConfig) -> ExtractionResult<Vec<Statement>> {
        let Some(rows) = document.rows() else {
            return Ok(Vec::new());
        };

        let record = config.required_pattern("transaction")?;
        let reader = RecordReader {
            config,
            amount_pattern: config.required_pattern("amount_numbers_pattern")?,
            datetime_format: config.constant_or("transaction_date", "%d/%m/%Y %H:%M"),
            debit_marker: config.constant_or("debit_suffix", "-"),
            zone: config.zone(),
        };

        let text = document.full_text();
        let mut statement = Statement::new(document.source_name());
        statement.account = Account {
            number: config
                .pattern("account_number")
                .and_then(|pattern| pattern.captures(&text))
                .map(|captures| group(&captures, 1).trim().to_string())
                .unwrap_or_default(),
            name: config.constant_or("account_name", "TNG_EWALLET").to_string(),
            ..Account::default()
        };
        statement.statement_date = reader.statement_date(&text);

        let mut total_credit = BigDecimal::from(0);
        let mut total_debit = BigDecimal::from(0);
        for row in rows {
            for captures in record.captures_iter(row) {
                let Some(mut transaction) = reader.read(&captures, &mut statement) else {
                    continue;
                };

                transaction.sequence = statement.transactions.len() + 1;
                match transaction.transaction_type {
                    TransactionType::Credit => total_credit += &transaction.amount,
                    TransactionType::Debit => total_debit += &transaction.amount,
                }
                statement.transaction_start_date = Some(match statement.transaction_start_date {
                    Some(start) => start.min(transaction.date),
                    None => transaction.date,
                });
                statement.transaction_end_date = Some(match statement.transaction_end_date {
                    Some(end) => end.max(transaction.date),
                    None => transaction.date,
                });
                statement.transactions.push(transaction);
            }
        }

        statement.nett = &total_credit + &total_debit;
        statement.total_credit = total_credit;
        statement.total_debit = total_debit;

        tracing::debug!(
            source = %statement.source,
            account = %statement.account.number,
            transactions = statement.transactions.len(),
            "Extracted wallet statement"
        );
        Ok(vec![statement])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use std::str::FromStr;

    fn config() -> ExtractionConfig {
        EngineConfig::builtin()
            .unwrap()
            .extraction(FormatId::Tng)
            .unwrap()
            .clone()
    }

    fn amount(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn extract(rows: Vec<&str>) -> Statement {
        let document = Document::from_rows("wallet.pdf", rows);
        DelimitedMultiMatchExtractor
            .extract(&document, &config())
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_records_sharing_a_row() {
        let statement = extract(vec![
            "Wallet ID 5012345678",
            "Transaction Period 01 March 2024 - 31 March 2024",
            "Reload 02/03/2024 10:15 Maybank2u REF1 A1 +RM50.00 Exit Toll: Jalan  Duta 05/03/2024 18:40 PLUS REF2 B2 -RM3.50 ",
        ]);

        assert_eq!(statement.account.number, "5012345678");
        assert_eq!(statement.account.name, "TNG_EWALLET");
        assert!(!statement.account.reconciliable);
        assert_eq!(
            statement.statement_date,
            chrono::NaiveDate::from_ymd_opt(2024, 3, 31)
        );

        assert_eq!(statement.transactions.len(), 2);
        let reload = &statement.transactions[0];
        assert_eq!(reload.transaction_type, TransactionType::Credit);
        assert_eq!(reload.amount, amount("50.00"));
        assert_eq!(reload.reference, "REF1A1");
        assert_eq!(reload.descriptions, vec!["Reload".to_string(), "Maybank2u".to_string()]);

        let toll = &statement.transactions[1];
        assert_eq!(toll.transaction_type, TransactionType::Debit);
        assert_eq!(toll.amount, amount("-3.50"));
        assert_eq!(
            toll.descriptions,
            vec!["Exit Toll".to_string(), "Jalan Duta".to_string(), "PLUS".to_string()]
        );
        assert_eq!(toll.sequence, 2);

        assert_eq!(statement.total_credit, amount("50.00"));
        assert_eq!(statement.total_debit, amount("-3.50"));
        assert_eq!(statement.nett, amount("46.50"));
        assert_eq!(statement.transaction_start_date, Some(reload.date));
        assert_eq!(statement.transaction_end_date, Some(toll.date));
        assert_eq!(reload.date.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_record_without_amount_is_skipped() {
        let statement = extract(vec![
            "Payment 02/03/2024 10:15 Shop REF1 A1 FREE RM60.00 ",
        ]);

        assert!(statement.transactions.is_empty());
        assert_eq!(statement.warnings.len(), 1);
        assert!(!statement.has_useful_output());
    }
}
