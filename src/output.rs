//! Caller-facing JSON view of extracted statements

use bigdecimal::BigDecimal;
use serde_json::{Map, Value};

use crate::types::*;

/// What to include when rendering statements
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    /// Render only the transactions
    pub transactions_only: bool,
    /// Leave the transactions out
    pub statement_only: bool,
}

fn insert_balance(map: &mut Map<String, Value>, key: &str, value: &BigDecimal) -> ExtractionResult<()> {
    if *value != BigDecimal::from(0) {
        map.insert(key.to_string(), serde_json::to_value(value)?);
    }
    Ok(())
}

/// Render one statement.
///
/// Statement date and balances are only shown for reconciliable accounts,
/// and only when they carry a value.
pub fn render_statement(statement: &Statement, options: OutputOptions) -> ExtractionResult<Value> {
    if options.transactions_only {
        return Ok(serde_json::to_value(&statement.transactions)?);
    }

    let mut map = Map::new();
    map.insert("source".to_string(), Value::String(statement.source.clone()));
    map.insert("account".to_string(), serde_json::to_value(&statement.account)?);
    map.insert("total_credit".to_string(), serde_json::to_value(&statement.total_credit)?);
    map.insert("total_debit".to_string(), serde_json::to_value(&statement.total_debit)?);
    map.insert("nett".to_string(), serde_json::to_value(&statement.nett)?);
    map.insert(
        "transaction_start_date".to_string(),
        serde_json::to_value(statement.transaction_start_date)?,
    );
    map.insert(
        "transaction_end_date".to_string(),
        serde_json::to_value(statement.transaction_end_date)?,
    );

    if statement.account.reconciliable {
        if let Some(date) = statement.statement_date {
            map.insert("statement_date".to_string(), serde_json::to_value(date)?);
        }
        insert_balance(&mut map, "starting_balance", &statement.starting_balance)?;
        insert_balance(&mut map, "ending_balance", &statement.ending_balance)?;
        insert_balance(
            &mut map,
            "calculated_ending_balance",
            &statement.calculated_ending_balance,
        )?;
    }

    if !options.statement_only && !statement.transactions.is_empty() {
        map.insert("transactions".to_string(), serde_json::to_value(&statement.transactions)?);
    }
    if !statement.warnings.is_empty() {
        map.insert("warnings".to_string(), serde_json::to_value(&statement.warnings)?);
    }

    Ok(Value::Object(map))
}

/// Render a batch; with `transactions_only` every transaction lands in one
/// flat array
pub fn render_statements(statements: &[Statement], options: OutputOptions) -> ExtractionResult<Value> {
    if options.transactions_only {
        let transactions: Vec<&Transaction> = statements
            .iter()
            .flat_map(|statement| statement.transactions.iter())
            .collect();
        return Ok(serde_json::to_value(transactions)?);
    }

    statements
        .iter()
        .map(|statement| render_statement(statement, options))
        .collect::<ExtractionResult<Vec<_>>>()
        .map(Value::Array)
}
