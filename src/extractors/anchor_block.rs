//! Email-derived wallet statements
//!
//! Each transaction starts at an anchor match. The text that follows it,
//! up to the next anchor or an earlier boundary marker, is the
//! continuation region carrying reference tokens, extra description text
//! and usually the full timestamp.

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use regex::{Captures, Regex};

use crate::config::ExtractionConfig;
use crate::traits::StatementExtractor;
use crate::types::*;
use crate::utils::dates::{parse_date, parse_datetime, Zone};
use crate::utils::parsing::{group, signed_decimal};

pub struct AnchorBlockExtractor;

/// Offset of the earliest boundary marker in `remaining`.
///
/// On an exact tie the next-entry marker wins.
fn block_boundary(remaining: &str, next_entry: Option<&Regex>, terminator: Option<&Regex>) -> Option<usize> {
    let next = next_entry.and_then(|pattern| pattern.find(remaining)).map(|m| m.start());
    let stop = terminator.and_then(|pattern| pattern.find(remaining)).map(|m| m.start());

    match (next, stop) {
        (Some(next), Some(stop)) if stop < next => Some(stop),
        (Some(next), _) => Some(next),
        (None, stop) => stop,
    }
}

/// Reference tokens and description text of a continuation region
fn split_continuation(continuation: &str) -> (Vec<&str>, Vec<&str>) {
    let mut references = Vec::new();
    let mut descriptions = Vec::new();

    for line in continuation.lines().map(str::trim).filter(|line| !line.is_empty()) {
        match line.split_once(char::is_whitespace) {
            Some((token, rest)) => {
                references.push(token.trim());
                let rest = rest.trim();
                if !rest.is_empty() {
                    descriptions.push(rest);
                }
            }
            None => references.push(line),
        }
    }

    (references, descriptions)
}

fn amount(text: &str) -> ExtractionResult<BigDecimal> {
    signed_decimal(&text.replace("RM", ""))
}

struct BlockReader<'c> {
    datetime_pattern: Option<&'c Regex>,
    datetime_format: &'c str,
    date_format: &'c str,
    credit_types: Vec<&'c str>,
    zone: Zone,
}

impl BlockReader<'_> {
    fn timestamp(&self, anchor: &Captures<'_>, continuation: &str) -> ExtractionResult<DateTime<FixedOffset>> {
        if let Some(found) = self.datetime_pattern.and_then(|pattern| pattern.find(continuation)) {
            if let Ok(naive) = parse_datetime(found.as_str(), self.datetime_format) {
                return Ok(self.zone.localize(naive));
            }
        }

        let date = parse_date(group(anchor, 1), self.date_format)?;
        Ok(self.zone.localize_date(date))
    }

    fn read(&self, anchor: &Captures<'_>, continuation: &str) -> ExtractionResult<Transaction> {
        let date = self.timestamp(anchor, continuation)?;
        let value = amount(group(anchor, 6))?;
        let balance = amount(group(anchor, 7))?;

        let label = group(anchor, 3);
        let transaction_type = if self.credit_types.iter().any(|credit| *credit == label) {
            TransactionType::Credit
        } else {
            TransactionType::Debit
        };

        let (references, descriptions) = split_continuation(continuation);
        let mut transaction = Transaction::new(0, date, transaction_type, value);
        transaction.running_balance = balance;
        transaction.reference = format!("{}{}", group(anchor, 4), references.concat())
            .trim()
            .to_string();
        transaction.descriptions = vec![
            label.to_string(),
            group(anchor, 5).to_string(),
            descriptions.join(" ").trim().to_string(),
        ];
        Ok(transaction)
    }
}

impl StatementExtractor for AnchorBlockExtractor {
    fn format(&self) -> FormatId {
        FormatId::TngEmail
    }

    fn extract(&self, document: &Document, config: &ExtractionConfig) -> ExtractionResult<Vec<Statement>> {
        if document.rows().is_none() {
            return Ok(Vec::new());
        }

        let anchor = config.required_pattern("transaction")?;
        let next_entry = config.pattern("next_entry");
        let terminator = config.pattern("terminator");
        let reader = BlockReader {
            datetime_pattern: config.pattern("datetime_pattern"),
            datetime_format: config.constant_or("datetime_format", "%d/%m/%Y %I:%M %p"),
            date_format: config.constant_or("date_format", "%d/%m/%Y"),
            credit_types: config.list("credit_transaction_types"),
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

        let anchors: Vec<Captures<'_>> = anchor.captures_iter(&text).collect();
        let mut total_credit = BigDecimal::from(0);
        let mut total_debit = BigDecimal::from(0);

        for (index, captures) in anchors.iter().enumerate() {
            let Some(whole) = captures.get(0) else {
                continue;
            };
            let span_end = anchors
                .get(index + 1)
                .and_then(|next| next.get(0))
                .map_or(text.len(), |next| next.start());

            let remaining = &text[whole.end()..span_end];
            let block_end = block_boundary(remaining, next_entry, terminator).unwrap_or(remaining.len());
            let continuation = remaining[..block_end].trim();

            let mut transaction = match reader.read(captures, continuation) {
                Ok(transaction) => transaction,
                Err(e) => {
                    statement.record_warning(format!("Skipping email entry '{}': {}", whole.as_str().trim(), e));
                    continue;
                }
            };

            transaction.sequence = statement.transactions.len() + 1;
            match transaction.transaction_type {
                TransactionType::Credit => total_credit += &transaction.amount,
                TransactionType::Debit => total_debit += &transaction.amount,
            }
            statement.transactions.push(transaction);
        }

        statement.nett = &total_credit - &total_debit;
        statement.total_credit = total_credit;
        statement.total_debit = total_debit;
        statement.transaction_start_date = statement.transactions.first().map(|t| t.date);
        statement.transaction_end_date = statement.transactions.last().map(|t| t.date);
        statement.statement_date = statement.transaction_end_date.map(|date| date.date_naive());

        tracing::debug!(
            source = %statement.source,
            account = %statement.account.number,
            transactions = statement.transactions.len(),
            "Extracted email statement"
        );
        Ok(vec![statement])
    }
}
