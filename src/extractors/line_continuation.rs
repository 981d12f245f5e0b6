//! Line-continuation parsing for bank ledgers
//!
//! A ledger prints one main line per transaction (date, description,
//! amount, balance) followed by indented lines that continue the
//! description. The parser walks the rows with two states: idle, or with
//! one transaction open that continuation lines attach to.

use bigdecimal::BigDecimal;
use regex::{Captures, Regex};

use crate::config::ExtractionConfig;
use crate::reconciliation::ReconciliationEngine;
use crate::traits::StatementExtractor;
use crate::types::*;
use crate::utils::dates::{normalize_year, parse_date, parse_partial_date, Zone, PLACEHOLDER_YEAR};
use crate::utils::parsing::{clean_decimal, first_group, has_marker, named, stated_balance};
use chrono::Datelike;

/// Which suffix on the amount text flips its sign
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignRule {
    /// A debit marker (e.g. `-`) makes the amount a negative debit;
    /// everything else is a credit
    DebitSuffix,
    /// A credit marker (e.g. `CR`) makes the amount a negative credit;
    /// everything else is a debit
    CreditSuffix,
}

/// How stated balance rows are collected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceLookup {
    /// Sum every matching row of the document
    Accumulate,
    /// Take the first matching row
    FirstMatch,
}

enum ParseState {
    Idle,
    Open(Transaction),
}

/// Row parser configured for one ledger layout
pub struct LineContinuationParser<'c> {
    transaction_line: &'c Regex,
    continuation: Option<&'c Regex>,
    starting_balance: &'c Regex,
    ending_balance: &'c Regex,
    statement_date: &'c Regex,
    sign_rule: SignRule,
    sign_marker: &'c str,
    credit_suffix: &'c str,
    date_format: &'c str,
    statement_format: &'c str,
    zone: Zone,
    reconciler: ReconciliationEngine,
}

impl<'c> LineContinuationParser<'c> {
    pub fn new(
        config: &'c ExtractionConfig,
        transaction_key: &str,
        continuation_key: Option<&str>,
        sign_rule: SignRule,
    ) -> ExtractionResult<Self> {
        let credit_suffix = config.constant_or("credit_suffix", "CR");
        let sign_marker = match sign_rule {
            SignRule::DebitSuffix => config.constant_or("amount_debit_suffix", "-"),
            SignRule::CreditSuffix => credit_suffix,
        };

        Ok(Self {
            transaction_line: config.required_pattern(transaction_key)?,
            continuation: continuation_key.and_then(|key| config.pattern(key)),
            starting_balance: config.required_pattern("starting_balance")?,
            ending_balance: config.required_pattern("ending_balance")?,
            statement_date: config.required_pattern("statement_date")?,
            sign_rule,
            sign_marker,
            credit_suffix,
            date_format: config.constant_or("date_format", "%d/%m/%y"),
            statement_format: config.constant_or("statement_format", "%d/%m/%y"),
            zone: config.zone(),
            reconciler: ReconciliationEngine::default(),
        })
    }

    pub fn with_reconciler(mut self, reconciler: ReconciliationEngine) -> Self {
        self.reconciler = reconciler;
        self
    }

    /// Read balances, statement date and transactions, then reconcile
    pub fn parse<R: AsRef<str>>(&self, rows: &[R], statement: &mut Statement, lookup: BalanceLookup) {
        self.read_balances(rows, statement, lookup);
        if statement.statement_date.is_none() {
            statement.statement_date = self.find_statement_date(rows.iter().map(|row| row.as_ref()));
        }
        self.read_transactions(rows, statement);

        statement.nett = &statement.total_credit + &statement.total_debit;
        self.reconciler.reconcile(statement);
    }

    /// The first statement date found in the given texts
    pub fn find_statement_date<'t>(
        &self,
        texts: impl IntoIterator<Item = &'t str>,
    ) -> Option<chrono::NaiveDate> {
        texts.into_iter().find_map(|text| {
            let captures = self.statement_date.captures(text)?;
            let matched = captures.get(1).or_else(|| captures.get(0))?;
            parse_date(matched.as_str(), self.statement_format).ok()
        })
    }

    fn read_balances<R: AsRef<str>>(&self, rows: &[R], statement: &mut Statement, lookup: BalanceLookup) {
        let starting = self.stated(rows, self.starting_balance, lookup, statement);
        let ending = self.stated(rows, self.ending_balance, lookup, statement);
        statement.starting_balance = starting;
        statement.ending_balance = ending;
    }

    fn stated<R: AsRef<str>>(
        &self,
        rows: &[R],
        pattern: &Regex,
        lookup: BalanceLookup,
        statement: &mut Statement,
    ) -> BigDecimal {
        let mut total = BigDecimal::from(0);
        for row in rows.iter().map(|row| row.as_ref()).filter(|row| pattern.is_match(row)) {
            match stated_balance(row, self.credit_suffix) {
                Ok(amount) => total += amount,
                Err(e) => statement.record_warning(format!("Ignoring balance row '{}': {}", row.trim(), e)),
            }
            if lookup == BalanceLookup::FirstMatch {
                break;
            }
        }
        total
    }

    fn read_transactions<R: AsRef<str>>(&self, rows: &[R], statement: &mut Statement) {
        let mut state = ParseState::Idle;
        let mut balance = statement.starting_balance.clone();
        let mut sequence = 0;

        for line in rows.iter().map(|row| row.as_ref()) {
            if let Some(captures) = self.transaction_line.captures(line) {
                if let ParseState::Open(done) = std::mem::replace(&mut state, ParseState::Idle) {
                    statement.transactions.push(done);
                }

                if let Some(mut transaction) = self.open_transaction(&captures, statement) {
                    sequence += 1;
                    transaction.sequence = sequence;
                    balance += &transaction.amount;
                    transaction.running_balance = balance.clone();
                    state = ParseState::Open(transaction);
                }
                continue;
            }

            if let (ParseState::Open(current), Some(continuation)) = (&mut state, self.continuation) {
                if continuation.is_match(line) {
                    current.descriptions.push(line.trim().to_string());
                }
            }
        }

        if let ParseState::Open(done) = state {
            statement.transactions.push(done);
        }
    }

    fn open_transaction(&self, captures: &Captures<'_>, statement: &mut Statement) -> Option<Transaction> {
        let date_text = named(captures, "date");
        let mut date = match parse_partial_date(date_text, self.date_format) {
            Ok(date) => date,
            Err(e) => {
                statement.record_warning(format!("Skipping transaction line: {}", e));
                return None;
            }
        };
        match statement.statement_date {
            Some(reference) => date = normalize_year(date, reference),
            None if date.year() == PLACEHOLDER_YEAR => {
                statement.record_warning(format!("No statement date to resolve the year of '{}'", date_text));
            }
            None => {}
        }

        let amount_text = named(captures, "amount");
        let magnitude = match clean_decimal(amount_text) {
            Ok(amount) => amount,
            Err(e) => {
                statement.record_warning(format!("Skipping transaction line: {}", e));
                return None;
            }
        };

        let marked = has_marker(amount_text, self.sign_marker);
        let (transaction_type, amount) = match (self.sign_rule, marked) {
            (SignRule::DebitSuffix, true) => (TransactionType::Debit, -magnitude.abs()),
            (SignRule::DebitSuffix, false) => (TransactionType::Credit, magnitude),
            (SignRule::CreditSuffix, true) => (TransactionType::Credit, -magnitude),
            (SignRule::CreditSuffix, false) => (TransactionType::Debit, magnitude),
        };
        match transaction_type {
            TransactionType::Credit => statement.total_credit += &amount,
            TransactionType::Debit => statement.total_debit += &amount,
        }

        let mut transaction = Transaction::new(0, self.zone.localize_date(date), transaction_type, amount);
        transaction
            .descriptions
            .push(named(captures, "description").trim().to_string());
        Some(transaction)
    }
}

/// Savings and current account ledgers
pub struct LineContinuationExtractor;

impl StatementExtractor for LineContinuationExtractor {
    fn format(&self) -> FormatId {
        FormatId::MaybankCasaAndMae
    }

    fn extract(&self, document: &Document, config: &ExtractionConfig) -> ExtractionResult<Vec<Statement>> {
        let Some(rows) = document.rows() else {
            return Ok(Vec::new());
        };

        let parser = LineContinuationParser::new(
            config,
            "main_transaction_line",
            Some("description_transaction_line"),
            SignRule::DebitSuffix,
        )?;

        let text = document.full_text();
        let mut statement = Statement::new(document.source_name());
        statement.account = Account {
            number: config
                .pattern("account_number")
                .and_then(|pattern| pattern.captures(&text))
                .map(|captures| named(&captures, "number").trim().to_string())
                .unwrap_or_default(),
            name: config
                .pattern("account_label")
                .and_then(|pattern| pattern.captures(&text))
                .and_then(|captures| first_group(&captures))
                .unwrap_or_default(),
            reconciliable: true,
            ..Account::default()
        };

        parser.parse(rows, &mut statement, BalanceLookup::Accumulate);

        tracing::debug!(
            source = %statement.source,
            account = %statement.account.number,
            transactions = statement.transactions.len(),
            "Extracted ledger statement"
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
            .extraction(FormatId::MaybankCasaAndMae)
            .unwrap()
            .clone()
    }

    fn amount(value: &str) -> BigDecimal {
        BigDecimal::from_str(value).unwrap()
    }

    fn extract(rows: Vec<&str>) -> Statement {
        let document = Document::from_rows("statements/casa_nov.pdf", rows);
        LineContinuationExtractor
            .extract(&document, &config())
            .unwrap()
            .remove(0)
    }

    #[test]
    fn test_transfer_in_and_payment_out() {
        let statement = extract(vec![
            "BEGINNING BALANCE 100.00",
            "01/11/24 TRANSFER IN 50.00+ 150.00",
            "  FROM TEST",
            "02/11/24 PAYMENT OUT 25.50- 124.50",
            "ENDING BALANCE : 124.50",
        ]);

        assert_eq!(statement.source, "casa_nov");
        assert_eq!(statement.transactions.len(), 2);
        assert_eq!(statement.transactions[0].transaction_type, TransactionType::Credit);
        assert_eq!(statement.transactions[1].transaction_type, TransactionType::Debit);
        assert_eq!(
            statement.transactions[0].descriptions,
            vec!["TRANSFER IN".to_string(), "FROM TEST".to_string()]
        );
        assert_eq!(statement.transactions[1].amount, amount("-25.50"));
        assert_eq!(statement.starting_balance, amount("100.00"));
        assert_eq!(statement.calculated_ending_balance, amount("124.50"));
        assert_eq!(statement.ending_balance, amount("124.50"));
        assert_eq!(statement.total_credit, amount("50.00"));
        assert_eq!(statement.total_debit, amount("-25.50"));
        assert_eq!(statement.nett, amount("24.50"));
        assert!(statement.warnings.is_empty());
    }

    #[test]
    fn test_continuation_without_open_transaction_is_dropped() {
        let statement = extract(vec![
            "BEGINNING BALANCE 10.00",
            "   ORPHAN CONTINUATION",
            "03/11/24 SALARY 5.00+ 15.00",
            "ENDING BALANCE : 15.00",
        ]);

        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.transactions[0].descriptions, vec!["SALARY".to_string()]);
    }

    #[test]
    fn test_short_dates_take_the_statement_year() {
        let statement = extract(vec![
            "STATEMENT DATE 31/01/24",
            "BEGINNING BALANCE 10.00",
            "28/12 CARD PURCHASE 4.00- 6.00",
            "05/01 REFUND 1.00+ 7.00",
            "ENDING BALANCE : 7.00",
        ]);

        let dates: Vec<String> = statement
            .transactions
            .iter()
            .map(|t| t.date.date_naive().to_string())
            .collect();
        assert_eq!(dates, vec!["2023-12-28", "2024-01-05"]);
    }

    #[test]
    fn test_mismatch_is_kept_as_warning() {
        let statement = extract(vec![
            "BEGINNING BALANCE 100.00",
            "01/11/24 TRANSFER IN 50.00+ 150.00",
            "ENDING BALANCE : 99.00",
        ]);

        assert_eq!(statement.transactions.len(), 1);
        assert_eq!(statement.warnings.len(), 1);
    }

    #[test]
    fn test_account_metadata() {
        let statement = extract(vec![
            "123456789012",
            "ACCOUNT NUMBER",
            "SAVINGS ACCOUNT-I",
            "BEGINNING BALANCE 0.00",
            "ENDING BALANCE : 0.00",
        ]);

        assert_eq!(statement.account.number, "123456789012");
        assert_eq!(statement.account.name, "SAVINGS ACCOUNT-I");
        assert!(statement.account.reconciliable);
        assert!(statement.has_useful_output());
    }

    #[test]
    fn test_records_document_yields_nothing() {
        let document = Document::from_records("export.csv", Vec::new());
        assert!(LineContinuationExtractor.extract(&document, &config()).unwrap().is_empty());
    }
}
