//! Balance reconciliation for extracted statements
//!
//! Transactions are put in date order, renumbered, and walked to rebuild the
//! running balance from the starting balance. The result is compared with
//! the ending balance printed on the document; a difference is reported as
//! a warning on the statement and never fails extraction.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::types::*;

/// How a transaction's amount moves the balance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignConvention {
    /// Amounts already carry their sign
    #[default]
    Signed,
    /// Amounts are unsigned; credits add and debits subtract
    ByType,
}

impl SignConvention {
    pub fn signed_amount(&self, transaction: &Transaction) -> BigDecimal {
        match self {
            SignConvention::Signed => transaction.amount.clone(),
            SignConvention::ByType if transaction.is_debit() => -transaction.amount.clone(),
            SignConvention::ByType => transaction.amount.clone(),
        }
    }
}

/// Outcome of comparing the calculated and stated ending balances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceCheck {
    pub matched: bool,
    pub stated: BigDecimal,
    pub calculated: BigDecimal,
    /// Calculated minus stated
    pub difference: BigDecimal,
}

impl BalanceCheck {
    pub fn new(stated: BigDecimal, calculated: BigDecimal) -> Self {
        let difference = &calculated - &stated;
        Self {
            matched: difference == BigDecimal::from(0),
            stated,
            calculated,
            difference,
        }
    }

    pub fn message(&self) -> String {
        if self.matched {
            format!("Ending balance reconciled at {}", self.calculated)
        } else {
            format!(
                "Ending balance mismatch: calculated={} stated={} difference={}",
                self.calculated, self.stated, self.difference
            )
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReconciliationEngine {
    convention: SignConvention,
    quiet_when_empty: bool,
}

impl Default for ReconciliationEngine {
    fn default() -> Self {
        Self::new(SignConvention::default())
    }
}

impl ReconciliationEngine {
    pub fn new(convention: SignConvention) -> Self {
        Self {
            convention,
            quiet_when_empty: false,
        }
    }

    /// Do not warn about a mismatch on a statement without transactions
    pub fn quiet_when_empty(mut self) -> Self {
        self.quiet_when_empty = true;
        self
    }

    /// Sort, renumber and rebuild running balances, then compare.
    ///
    /// Sorting is stable, so transactions sharing a date keep document
    /// order. Running the reconciliation again on its own output changes
    /// nothing.
    pub fn reconcile(&self, statement: &mut Statement) -> BalanceCheck {
        statement.transactions.sort_by(|a, b| a.date.cmp(&b.date));

        let mut balance = statement.starting_balance.clone();
        for (index, transaction) in statement.transactions.iter_mut().enumerate() {
            transaction.sequence = index + 1;
            balance += self.convention.signed_amount(transaction);
            transaction.running_balance = balance.clone();
        }

        statement.calculated_ending_balance = balance;
        self.record_date_range(statement);
        self.compare(statement)
    }

    /// Compare using totals only, keeping the per-row balances the document
    /// states.
    ///
    /// Used for sources that print a balance on every row.
    pub fn settle(&self, statement: &mut Statement) -> BalanceCheck {
        let mut balance = statement.starting_balance.clone();
        for transaction in &statement.transactions {
            balance += self.convention.signed_amount(transaction);
        }

        statement.calculated_ending_balance = balance;
        self.record_date_range(statement);
        self.compare(statement)
    }

    fn record_date_range(&self, statement: &mut Statement) {
        statement.transaction_start_date = statement.transactions.iter().map(|t| t.date).min();
        statement.transaction_end_date = statement.transactions.iter().map(|t| t.date).max();
    }

    fn compare(&self, statement: &mut Statement) -> BalanceCheck {
        let check = BalanceCheck::new(
            statement.ending_balance.clone(),
            statement.calculated_ending_balance.clone(),
        );

        if check.matched || (self.quiet_when_empty && statement.transactions.is_empty()) {
            tracing::debug!(source = %statement.source, account = %statement.account.number, "{}", check.message());
        } else {
            statement.record_warning(check.message());
        }

        check
    }
}
