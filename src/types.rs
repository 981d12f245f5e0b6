//! Core types and data structures for statement extraction

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::tabular::TabularRecord;

/// Statement formats understood by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FormatId {
    /// Savings/current account ledger with continuation description lines
    #[serde(rename = "MAYBANK_CASA_AND_MAE")]
    MaybankCasaAndMae,
    /// Credit card statement, possibly covering several cards
    #[serde(rename = "MAYBANK_2_CC")]
    Maybank2Cc,
    /// E-wallet statement with several records per rendered row
    #[serde(rename = "TNG")]
    Tng,
    /// E-wallet statement derived from an email body
    #[serde(rename = "TNG_EMAIL")]
    TngEmail,
    /// Tabular e-wallet card export
    #[serde(rename = "TNG_CSV_EXPORT")]
    TngCsvExport,
}

impl FormatId {
    /// Order in which formats are attempted when nothing identifies the document
    pub const TRIAL_ORDER: [FormatId; 5] = [
        FormatId::MaybankCasaAndMae,
        FormatId::Maybank2Cc,
        FormatId::Tng,
        FormatId::TngEmail,
        FormatId::TngCsvExport,
    ];

    /// The configuration identifier of this format
    pub fn as_str(&self) -> &'static str {
        match self {
            FormatId::MaybankCasaAndMae => "MAYBANK_CASA_AND_MAE",
            FormatId::Maybank2Cc => "MAYBANK_2_CC",
            FormatId::Tng => "TNG",
            FormatId::TngEmail => "TNG_EMAIL",
            FormatId::TngCsvExport => "TNG_CSV_EXPORT",
        }
    }

    /// Whether the format prints a statement its balances can be checked against.
    /// Card exports only carry per-row balances.
    pub fn is_reconciliable(&self) -> bool {
        !matches!(self, FormatId::TngCsvExport)
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = ExtractionError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        FormatId::TRIAL_ORDER
            .into_iter()
            .find(|format| format.as_str() == value.trim())
            .ok_or_else(|| ExtractionError::UnknownFormat(value.to_string()))
    }
}

/// Direction of a transaction as printed on the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    /// Money into the account (or a payment against a card balance)
    Credit,
    /// Money out of the account (or a charge on a card)
    Debit,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Credit => "credit",
            TransactionType::Debit => "debit",
        }
    }
}

/// Normal balance side of an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Polarity {
    #[serde(rename = "credit")]
    Credit,
    #[serde(rename = "debit")]
    Debit,
    #[default]
    #[serde(rename = "")]
    Unspecified,
}

impl Polarity {
    /// Parse the configuration spelling (`credit`, `debit` or empty)
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "credit" => Some(Polarity::Credit),
            "debit" => Some(Polarity::Debit),
            "" => Some(Polarity::Unspecified),
            _ => None,
        }
    }

    pub fn is_unspecified(&self) -> bool {
        *self == Polarity::Unspecified
    }
}

/// Account a statement belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Account, card or wallet number
    #[serde(rename = "account_number")]
    pub number: String,
    /// Display name or product label
    #[serde(rename = "account_name")]
    pub name: String,
    /// User-assigned account category
    #[serde(rename = "account_type")]
    pub account_type: String,
    /// Normal balance side
    #[serde(rename = "debit_credit")]
    pub polarity: Polarity,
    /// Whether stated balances and statement dates are meaningful
    pub reconciliable: bool,
}

impl Account {
    /// Create an account with a number and a name
    pub fn new(number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            name: name.into(),
            ..Self::default()
        }
    }
}

/// A single dated movement on a statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Position in chronological order, starting at 1
    pub sequence: usize,
    /// When the transaction happened
    pub date: DateTime<FixedOffset>,
    /// Description lines in document order
    pub descriptions: Vec<String>,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
    /// Amount with the format's own sign convention
    pub amount: BigDecimal,
    /// Balance after this transaction
    #[serde(rename = "balance")]
    pub running_balance: BigDecimal,
    #[serde(rename = "ref")]
    pub reference: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Extra columns kept from tabular sources
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
}

impl Transaction {
    /// Create a transaction with no descriptions and a zero running balance
    pub fn new(
        sequence: usize,
        date: DateTime<FixedOffset>,
        transaction_type: TransactionType,
        amount: BigDecimal,
    ) -> Self {
        Self {
            sequence,
            date,
            descriptions: Vec::new(),
            transaction_type,
            amount,
            running_balance: BigDecimal::from(0),
            reference: String::new(),
            tags: Vec::new(),
            data: BTreeMap::new(),
        }
    }

    pub fn is_credit(&self) -> bool {
        self.transaction_type == TransactionType::Credit
    }

    pub fn is_debit(&self) -> bool {
        self.transaction_type == TransactionType::Debit
    }
}

/// A normalized statement: account, balances and transactions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statement {
    /// Document name without directory or extension
    pub source: String,
    pub account: Account,
    pub starting_balance: BigDecimal,
    /// Ending balance as printed on the document
    pub ending_balance: BigDecimal,
    /// Starting balance plus every transaction, in date order
    pub calculated_ending_balance: BigDecimal,
    pub total_credit: BigDecimal,
    pub total_debit: BigDecimal,
    pub nett: BigDecimal,
    pub statement_date: Option<NaiveDate>,
    pub transaction_start_date: Option<DateTime<FixedOffset>>,
    pub transaction_end_date: Option<DateTime<FixedOffset>>,
    pub transactions: Vec<Transaction>,
    /// Non-fatal problems met while extracting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl Statement {
    /// Create an empty statement for a source document
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            account: Account::default(),
            starting_balance: BigDecimal::from(0),
            ending_balance: BigDecimal::from(0),
            calculated_ending_balance: BigDecimal::from(0),
            total_credit: BigDecimal::from(0),
            total_debit: BigDecimal::from(0),
            nett: BigDecimal::from(0),
            statement_date: None,
            transaction_start_date: None,
            transaction_end_date: None,
            transactions: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Whether the statement carries anything worth keeping
    pub fn has_useful_output(&self) -> bool {
        !self.transactions.is_empty() || !self.account.number.is_empty()
    }

    /// Whether the stated ending balance agrees with the calculated one
    pub fn is_reconciled(&self) -> bool {
        self.calculated_ending_balance == self.ending_balance
    }

    /// Record a non-fatal problem on the statement and the log stream
    pub fn record_warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!(source = %self.source, account = %self.account.number, "{}", message);
        self.warnings.push(message);
    }
}

/// Content of a document handed to the engine
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentContent {
    /// Text rows in top-to-bottom order
    Rows(Vec<String>),
    /// Pre-decoded tabular records
    Records(Vec<TabularRecord>),
}

/// A document to extract statements from
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Path or file name the content came from
    pub source: String,
    pub content: DocumentContent,
}

impl Document {
    /// Create a document from ordered text rows
    pub fn from_rows<S: Into<String>>(source: impl Into<String>, rows: Vec<S>) -> Self {
        Self {
            source: source.into(),
            content: DocumentContent::Rows(rows.into_iter().map(Into::into).collect()),
        }
    }

    /// Create a document from decoded tabular records
    pub fn from_records(source: impl Into<String>, records: Vec<TabularRecord>) -> Self {
        Self {
            source: source.into(),
            content: DocumentContent::Records(records),
        }
    }

    /// The file stem of the source, used as the statement source
    pub fn source_name(&self) -> String {
        Path::new(&self.source)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn rows(&self) -> Option<&[String]> {
        match &self.content {
            DocumentContent::Rows(rows) => Some(rows),
            DocumentContent::Records(_) => None,
        }
    }

    pub fn records(&self) -> Option<&[TabularRecord]> {
        match &self.content {
            DocumentContent::Records(records) => Some(records),
            DocumentContent::Rows(_) => None,
        }
    }

    /// Whole-document text used for account identification.
    ///
    /// Text rows are joined with newlines; tabular records contribute
    /// their account identifier, one per line.
    pub fn full_text(&self) -> String {
        match &self.content {
            DocumentContent::Rows(rows) => rows.join("\n"),
            DocumentContent::Records(records) => records
                .iter()
                .map(|record| record.account_id.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.content {
            DocumentContent::Rows(rows) => rows.is_empty(),
            DocumentContent::Records(records) => records.is_empty(),
        }
    }
}

/// Errors that can occur while configuring or running extraction
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Unknown statement format: {0}")]
    UnknownFormat(String),
    #[error("Invalid pattern '{name}' for {scope}: {source}")]
    InvalidPattern {
        scope: String,
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("Missing pattern '{name}' for {format}")]
    MissingPattern { format: FormatId, name: String },
    #[error("Pattern '{name}' for {format} must capture {expected}")]
    MissingCaptureGroup {
        format: FormatId,
        name: String,
        expected: String,
    },
    #[error("Invalid account definition: {0}")]
    InvalidAccountDefinition(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Invalid date '{value}' for layout '{layout}'")]
    InvalidDate { value: String, layout: String },
    #[error("Tabular data error: {0}")]
    Tabular(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type for extraction operations
pub type ExtractionResult<T> = Result<T, ExtractionError>;
