//! # Statement Core
//!
//! Turns bank, card and e-wallet statements into a normalized ledger: an
//! account, a balance history and a list of dated, typed and signed
//! transactions, reconciled against the balance the document states.
//!
//! ## Features
//!
//! - **Format detection**: account definitions, explicit overrides or a trial over every format
//! - **Line-continuation ledgers**: bank statements with wrapped description lines
//! - **Multi-card statements**: one statement per card section
//! - **Wallet statements**: several records per row, email bodies and CSV exports
//! - **Reconciliation**: running balances rebuilt in date order and compared with the stated ending balance
//! - **Exact arithmetic**: every amount is a `BigDecimal`
//!
//! ## Quick Start
//!
//! ```rust
//! use statement_core::{Document, StatementEngine};
//!
//! let engine = StatementEngine::builtin().unwrap();
//! let document = Document::from_rows(
//!     "savings.pdf",
//!     vec![
//!         "BEGINNING BALANCE 100.00",
//!         "01/11/24 TRANSFER IN 50.00+ 150.00",
//!         "ENDING BALANCE : 150.00",
//!     ],
//! );
//!
//! let statements = engine.process(&document, None).unwrap();
//! assert_eq!(statements[0].transactions.len(), 1);
//! assert!(statements[0].is_reconciled());
//! ```

pub mod config;
pub mod engine;
pub mod extractors;
pub mod output;
pub mod reconciliation;
pub mod tabular;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use config::{AccountDefinition, EngineConfig, EngineSettings, ExtractionConfig};
pub use engine::{builtin_extractor, ExtractorRegistry, StatementAssembler, StatementEngine};
pub use output::{render_statement, render_statements, OutputOptions};
pub use reconciliation::{BalanceCheck, ReconciliationEngine, SignConvention};
pub use tabular::{decode_csv_export, TabularRecord};
pub use traits::*;
pub use types::*;
