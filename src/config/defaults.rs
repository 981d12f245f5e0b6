//! Built-in per-format configuration

use std::collections::BTreeMap;

use super::{EngineSettings, FormatSettings};
use crate::types::FormatId;

const CASA: &[(&str, &str)] = &[
    ("starting_balance", r"BEGINNING BALANCE\s*([\d,]+\.\d+)"),
    ("ending_balance", r"ENDING BALANCE\s*:\s*([\d,]+\.\d+)"),
    ("statement_date", r"(\d{2}/\d{2}/\d{2})"),
    (
        "main_transaction_line",
        r"(?P<date>\d{2}/\d{2}(?:/\d{2})?)(?P<description>.+?)(?P<amount>[\d,]*\.\d+[+-])\s(?P<balance>[\d,]*\.\d+(?:DR)?)",
    ),
    ("description_transaction_line", r"(^\s+\S.*)"),
    (
        "account_number",
        r"(?P<number>\d{6}-\d{6}|\d{12})\n(?:.*\n)*?(?:ACCOUNT|NUMBER)",
    ),
    (
        "account_label",
        r"(?:DEPOSITOR\s+([A-Za-z][A-Za-z\s-]+)|NUMBER\n([A-Za-z][A-Za-z\s-]+?)\n)",
    ),
    ("credit_suffix", "CR"),
    ("amount_debit_suffix", "-"),
    ("date_format", "%d/%m/%y"),
    ("statement_format", "%d/%m/%y"),
    ("timezone", "+08:00"),
];

const CARD: &[(&str, &str)] = &[
    (
        "starting_balance",
        r"YOUR PREVIOUS STATEMENT BALANCE\s*([\d,]+\.\d+(?:CR)?)",
    ),
    ("ending_balance", r"SUB TOTAL/JUMLAH\s*([\d,]+\.\d+(?:CR)?)"),
    (
        "statement_date",
        r"\d{2}\s(?:JAN|FEB|MAR|APR|MAY|JUN|JUL|AUG|SEP|OCT|NOV|DEC)\s\d{2}",
    ),
    (
        "transaction",
        r"(?P<date>\d{2}/\d{2})\s+(?P<posted>\d{2}/\d{2})\s+(?P<description>.+?)\s+(?P<amount>[\d,.]+(?:CR)?)\s*$",
    ),
    (
        "account_number",
        r"(?P<kind>MASTERCARD|AMEX)\s+:\s+(?P<number>\d{4}\s\d{4}\s\d{4}\s\d{4}|\d{4}\s\d{6}\s\d{5})",
    ),
    (
        "account_label",
        r"(MAYBANK 2 (?:PLAT(?:INUM)?|GOLD|CLASSIC)\s+(?:MASTERCARD|AMEX))",
    ),
    (
        "section_header",
        r"(?P<kind>MAYBANK 2 (?:PLAT(?:INUM)?|GOLD|CLASSIC)\s+(?:MASTERCARD|AMEX))\s+:\s+(?P<number>\d{4}\s\d{4}\s\d{4}\s\d{4}|\d{4}\s\d{6}\s\d{5})",
    ),
    ("section_end", r"SUB TOTAL/JUMLAH"),
    ("section_end_offset", "50"),
    ("credit_suffix", "CR"),
    ("date_format", "%d/%m"),
    ("statement_format", "%d %b %y"),
    ("timezone", "+08:00"),
];

const WALLET: &[(&str, &str)] = &[
    (
        "transaction",
        r"([A-Za-z'0-9: &-]+?)\s+(\d{2}/\d{2}/\d{4})\s+(\d{2}:\d{2})\s+(.+?)\s+(.+?)\s+(.+?)\s+(.+?)\s+",
    ),
    ("amount_numbers_pattern", r"([+-]?)RM(\d+\.\d+)"),
    ("account_number", r"Wallet ID\s+(\d+)"),
    (
        "statement_date",
        r"Transaction Period\s+\d{2}\s\w+\s\d{4}\s+-\s+(\d{2}\s\w+\s\d{4})",
    ),
    ("transaction_date", "%d/%m/%Y %H:%M"),
    ("statement_date_format", "%d %B %Y"),
    ("debit_suffix", "-"),
    ("account_name", "TNG_EWALLET"),
    ("timezone", "+08:00"),
];

const WALLET_EMAIL: &[(&str, &str)] = &[
    (
        "transaction",
        r"(?s)(\d+/\d+/\d{4})\s+(\w+)\s+([A-Za-z0-9_ ]+?)\s+(\d{11})\s+(.*?)\s+(RM\d+\.\d{2})\s+(RM\d+\.\d{2})",
    ),
    ("next_entry", r"\n\d+/\d+/\d{4}"),
    ("terminator", r"\n\*"),
    ("datetime_pattern", r"\d+/\d+/\d{4} \d{2}:\d{2} (?:AM|PM)"),
    ("account_number", r"Wallet ID[:\s]+(\d+)"),
    ("date_format", "%d/%m/%Y"),
    ("datetime_format", "%d/%m/%Y %I:%M %p"),
    (
        "credit_transaction_types",
        "Reload,Transfer to Wallet,Balance Top Up,DUITNOW_RECEI",
    ),
    ("account_name", "TNG_EWALLET"),
    ("timezone", "+08:00"),
];

const WALLET_EXPORT: &[(&str, &str)] = &[
    ("account_name", "TNG_CSV_EXPORT"),
    ("credit_type", "reload"),
    ("timezone", "+08:00"),
];

/// Built-in entries for one format
pub fn builtin_entries(format: FormatId) -> &'static [(&'static str, &'static str)] {
    match format {
        FormatId::MaybankCasaAndMae => CASA,
        FormatId::Maybank2Cc => CARD,
        FormatId::Tng => WALLET,
        FormatId::TngEmail => WALLET_EMAIL,
        FormatId::TngCsvExport => WALLET_EXPORT,
    }
}

/// Built-in settings for every format, with no account definitions
pub fn builtin_settings() -> EngineSettings {
    let statement = FormatId::TRIAL_ORDER
        .into_iter()
        .map(|format| {
            let patterns: BTreeMap<String, String> = builtin_entries(format)
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect();
            (format.as_str().to_string(), FormatSettings { patterns })
        })
        .collect();

    EngineSettings {
        accounts: Vec::new(),
        statement,
    }
}
