//! Wallet card exports decoded from CSV, one statement per card

use bigdecimal::BigDecimal;
use std::collections::{BTreeMap, BTreeSet};

use crate::config::ExtractionConfig;
use crate::reconciliation::{ReconciliationEngine, SignConvention};
use crate::tabular::TabularRecord;
use crate::traits::StatementExtractor;
use crate::types::*;

pub struct GroupedTabularExtractor;

fn descriptions(record: &TabularRecord) -> Vec<String> {
    let mut descriptions = vec![record.trans_type.clone()];
    if !record.sector.is_empty() {
        descriptions.push(record.sector.clone());
    }
    if !record.entry_location.is_empty() {
        descriptions.push(record.entry_location.clone());
    }
    if !record.exit_location.is_empty() && record.exit_location != record.entry_location {
        descriptions.push(format!("to {}", record.exit_location));
    }
    descriptions
}

fn data(record: &TabularRecord) -> BTreeMap<String, String> {
    let posted = record
        .posted_at
        .map(|posted| posted.to_rfc3339())
        .unwrap_or_default();

    [
        ("mfg_number", record.account_id.clone()),
        ("trans_no", record.trans_no.clone()),
        ("posted_date", posted),
        ("sector", record.sector.clone()),
        ("entry_location", record.entry_location.clone()),
        ("entry_sp", record.entry_sp.clone()),
        ("exit_location", record.exit_location.clone()),
        ("exit_sp", record.exit_sp.clone()),
        ("reload_location", record.reload_location.clone()),
        ("vehicle_class", record.vehicle_class.clone()),
        ("device_no", record.device_no.clone()),
        ("vehicle_number", record.vehicle_number.clone()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), value))
    .collect()
}

impl GroupedTabularExtractor {
    fn statement(
        &self,
        source: &str,
        account_id: &str,
        mut records: Vec<&TabularRecord>,
        config: &ExtractionConfig,
    ) -> Statement {
        records.sort_by_key(|record| record.transacted_at);
        let credit_type = config.constant_or("credit_type", "reload").to_lowercase();

        let mut statement = Statement::new(source);
        statement.account = Account {
            number: account_id.to_string(),
            name: config.constant_or("account_name", "TNG_CSV_EXPORT").to_string(),
            ..Account::default()
        };

        let mut total_credit = BigDecimal::from(0);
        let mut total_debit = BigDecimal::from(0);

        for (index, record) in records.iter().enumerate() {
            let transaction_type = if record.trans_type.to_lowercase() == credit_type {
                total_credit += &record.amount;
                TransactionType::Credit
            } else {
                total_debit += &record.amount;
                TransactionType::Debit
            };

            let mut transaction =
                Transaction::new(index + 1, record.transacted_at, transaction_type, record.amount.clone());
            transaction.descriptions = descriptions(record);
            transaction.running_balance = record.balance.clone();
            transaction.reference = record.transaction_id.clone();
            transaction.tags = [record.sector.as_str(), record.trans_type.as_str()]
                .into_iter()
                .filter(|tag| !tag.is_empty())
                .map(str::to_string)
                .collect();
            transaction.data = data(record);
            statement.transactions.push(transaction);
        }

        if let Some(oldest) = statement.transactions.first() {
            statement.starting_balance = if oldest.is_credit() {
                &oldest.running_balance - &oldest.amount
            } else {
                &oldest.running_balance + &oldest.amount
            };
        }
        if let Some(newest) = statement.transactions.last() {
            statement.ending_balance = newest.running_balance.clone();
            statement.statement_date = Some(newest.date.date_naive());
        }

        statement.nett = &total_credit - &total_debit;
        statement.total_credit = total_credit;
        statement.total_debit = total_debit;

        ReconciliationEngine::new(SignConvention::ByType).settle(&mut statement);
        statement
    }
}

impl StatementExtractor for GroupedTabularExtractor {
    fn format(&self) -> FormatId {
        FormatId::TngCsvExport
    }

    fn extract(&self, document: &Document, config: &ExtractionConfig) -> ExtractionResult<Vec<Statement>> {
        let Some(records) = document.records() else {
            return Ok(Vec::new());
        };

        let mut groups: BTreeMap<&str, Vec<&TabularRecord>> = BTreeMap::new();
        for record in records {
            groups.entry(record.account_id.as_str()).or_default().push(record);
        }

        let source = document.source_name();
        let statements: Vec<Statement> = groups
            .into_iter()
            .map(|(account_id, group)| self.statement(&source, account_id, group, config))
            .collect();

        let sectors: BTreeSet<&str> = records
            .iter()
            .map(|record| record.sector.as_str())
            .filter(|sector| !sector.is_empty())
            .collect();
        tracing::debug!(source = %source, cards = statements.len(), ?sectors, "Extracted card export");
        Ok(statements)
    }
}
