//! Wallet card CSV export example
//!
//! Usage: `cargo run --example wallet_export -- [EXPORT_CSV]`

use statement_core::utils::dates::Zone;
use statement_core::{decode_csv_export, Document, StatementEngine};
use std::env;
use std::fs::File;

const SAMPLE_EXPORT: &str = "\
MFG Number,Trans No,Transaction Date/Time,Posted Date,Transaction Type,Sector,Entry Location,Entry SP,Exit Location,Exit SP,Reload Location,Trans Amount,Balance,Vehicle Class,Device No,Transaction ID,Vehicle Number
0123456789,1,2024-03-01 08:00:00,2024-03-02 00:00:00,Usage,TOLL,Jalan Duta,PLUS,Sg Buloh,PLUS,,10.00,90.00,1,D1,TX-1,ABC123
0123456789,2,2024-03-01 09:00:00,2024-03-02 00:00:00,Usage,PARKING,KLCC,,,,,5.00,85.00,1,D1,TX-2,ABC123
0123456789,3,2024-03-01 12:00:00,,Reload,,,,,,Petronas,50.00,135.00,1,D1,TX-3,ABC123
0123456789,4,2024-03-01 15:00:00,2024-03-02 00:00:00,Usage,TOLL,Sg Buloh,PLUS,Jalan Duta,PLUS,,15.00,120.00,1,D1,TX-4,ABC123
";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "statement_core=debug".into()),
        )
        .init();

    let zone = Zone::parse("+08:00").unwrap_or_default();
    let (source, records) = match env::args().nth(1) {
        Some(path) => {
            let records = decode_csv_export(File::open(&path)?, zone)?;
            (path, records)
        }
        None => (
            "sample_export.csv".to_string(),
            decode_csv_export(SAMPLE_EXPORT.as_bytes(), zone)?,
        ),
    };

    println!("💳 Statement Core - Wallet Export Example\n");

    let engine = StatementEngine::builtin()?;
    let statements = engine.process(&Document::from_records(source, records), Some("TNG_CSV_EXPORT"))?;

    for statement in &statements {
        println!("Card {}", statement.account.number);
        println!("  Starting balance: {}", statement.starting_balance);
        println!("  Reloads:          {}", statement.total_credit);
        println!("  Usage:            {}", statement.total_debit);
        println!("  Ending balance:   {}", statement.ending_balance);
        println!(
            "  Reconciled:       {}",
            if statement.is_reconciled() { "yes" } else { "no" }
        );

        for transaction in &statement.transactions {
            println!(
                "  {:>2}. {} {:<6} {:>8} -> {:>8}  {}",
                transaction.sequence,
                transaction.date.format("%Y-%m-%d %H:%M"),
                transaction.transaction_type.as_str(),
                transaction.amount,
                transaction.running_balance,
                transaction.descriptions.join(" / ")
            );
        }
        println!();
    }

    Ok(())
}
