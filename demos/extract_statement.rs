//! Statement extraction example
//!
//! Usage: `cargo run --example extract_statement -- [ROWS_FILE] [FORMAT] [SETTINGS_JSON]`
//!
//! Without arguments a built-in savings statement is processed.

use statement_core::{render_statements, Document, EngineConfig, OutputOptions, StatementEngine};
use std::env;
use std::fs;

const SAMPLE_ROWS: [&str; 8] = [
    "123456789012",
    "ACCOUNT NUMBER",
    "SAVINGS ACCOUNT-I",
    "BEGINNING BALANCE 100.00",
    "01/11/24 TRANSFER IN 50.00+ 150.00",
    "  FROM TEST",
    "02/11/24 PAYMENT OUT 25.50- 124.50",
    "ENDING BALANCE : 124.50",
];

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statement_core=info".into()),
        )
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    let document = match args.first() {
        Some(path) => {
            let text = fs::read_to_string(path)?;
            Document::from_rows(path.clone(), text.lines().collect::<Vec<_>>())
        }
        None => Document::from_rows("sample_savings.pdf", SAMPLE_ROWS.to_vec()),
    };
    let format_override = args.get(1).map(String::as_str);
    let config = match args.get(2) {
        Some(path) => EngineConfig::from_path(path)?,
        None => EngineConfig::builtin()?,
    };

    println!("🧾 Statement Core - Extraction Example\n");

    let engine = StatementEngine::new(config);
    let statements = engine.process(&document, format_override)?;

    if statements.is_empty() {
        println!("No statement found in {}", document.source);
        return Ok(());
    }

    for statement in &statements {
        println!("📄 {} ({})", statement.account.number, statement.account.name);
        println!("  Transactions:       {}", statement.transactions.len());
        println!("  Starting balance:   {}", statement.starting_balance);
        println!("  Ending balance:     {}", statement.ending_balance);
        println!("  Calculated balance: {}", statement.calculated_ending_balance);
        if statement.is_reconciled() {
            println!("  ✓ Reconciled");
        } else {
            for warning in &statement.warnings {
                println!("  ⚠ {}", warning);
            }
        }
        println!();
    }

    let view = render_statements(&statements, OutputOptions::default())?;
    println!("{}", serde_json::to_string_pretty(&view)?);

    Ok(())
}
