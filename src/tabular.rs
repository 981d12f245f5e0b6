//! Decoding of the wallet card CSV export
//!
//! The export carries one row per card movement with a fixed 17-column
//! layout. Decoding turns those rows into [`TabularRecord`]s that the
//! grouped tabular extractor consumes through [`Document::from_records`].
//!
//! [`Document::from_records`]: crate::types::Document::from_records

use bigdecimal::BigDecimal;
use chrono::{DateTime, FixedOffset};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::io::Read;

use crate::types::*;
use crate::utils::dates::{parse_datetime, Zone};
use crate::utils::parsing::signed_decimal;

/// Number of columns in the export
pub const EXPORT_COLUMNS: usize = 17;

/// Timestamp layout used by the export
pub const EXPORT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const COL_ACCOUNT_ID: usize = 0;
const COL_TRANS_NO: usize = 1;
const COL_TRANSACTED_AT: usize = 2;
const COL_POSTED_AT: usize = 3;
const COL_TRANS_TYPE: usize = 4;
const COL_SECTOR: usize = 5;
const COL_ENTRY_LOCATION: usize = 6;
const COL_ENTRY_SP: usize = 7;
const COL_EXIT_LOCATION: usize = 8;
const COL_EXIT_SP: usize = 9;
const COL_RELOAD_LOCATION: usize = 10;
const COL_AMOUNT: usize = 11;
const COL_BALANCE: usize = 12;
const COL_VEHICLE_CLASS: usize = 13;
const COL_DEVICE_NO: usize = 14;
const COL_TRANSACTION_ID: usize = 15;
const COL_VEHICLE_NUMBER: usize = 16;

/// One decoded export row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularRecord {
    /// Card (manufacturer) number the row belongs to
    pub account_id: String,
    pub trans_no: String,
    pub transacted_at: DateTime<FixedOffset>,
    pub posted_at: Option<DateTime<FixedOffset>>,
    /// Transaction type label, e.g. `Usage` or `Reload`
    pub trans_type: String,
    pub sector: String,
    pub entry_location: String,
    pub entry_sp: String,
    pub exit_location: String,
    pub exit_sp: String,
    pub reload_location: String,
    /// Unsigned transaction amount
    pub amount: BigDecimal,
    /// Stated card balance after the row
    pub balance: BigDecimal,
    pub vehicle_class: String,
    pub device_no: String,
    pub transaction_id: String,
    pub vehicle_number: String,
}

fn field(record: &StringRecord, index: usize) -> String {
    record.get(index).unwrap_or("").trim().to_string()
}

impl TabularRecord {
    /// Decode one data row of the export
    pub fn from_csv_record(record: &StringRecord, zone: Zone) -> ExtractionResult<Self> {
        if record.len() < EXPORT_COLUMNS {
            return Err(ExtractionError::Tabular(format!(
                "Row has {} columns, expected {}",
                record.len(),
                EXPORT_COLUMNS
            )));
        }

        let transacted_at =
            zone.localize(parse_datetime(&field(record, COL_TRANSACTED_AT), EXPORT_DATETIME_FORMAT)?);
        let posted_at = parse_datetime(&field(record, COL_POSTED_AT), EXPORT_DATETIME_FORMAT)
            .ok()
            .map(|naive| zone.localize(naive));

        Ok(Self {
            account_id: field(record, COL_ACCOUNT_ID),
            trans_no: field(record, COL_TRANS_NO),
            transacted_at,
            posted_at,
            trans_type: field(record, COL_TRANS_TYPE),
            sector: field(record, COL_SECTOR),
            entry_location: field(record, COL_ENTRY_LOCATION),
            entry_sp: field(record, COL_ENTRY_SP),
            exit_location: field(record, COL_EXIT_LOCATION),
            exit_sp: field(record, COL_EXIT_SP),
            reload_location: field(record, COL_RELOAD_LOCATION),
            amount: signed_decimal(&field(record, COL_AMOUNT))?,
            balance: signed_decimal(&field(record, COL_BALANCE))?,
            vehicle_class: field(record, COL_VEHICLE_CLASS),
            device_no: field(record, COL_DEVICE_NO),
            transaction_id: field(record, COL_TRANSACTION_ID),
            vehicle_number: field(record, COL_VEHICLE_NUMBER),
        })
    }
}

/// Decode an export, skipping unreadable rows.
///
/// Fails when the header is missing or too short, or when no row could be
/// decoded at all.
pub fn decode_csv_export<R: Read>(reader: R, zone: Zone) -> ExtractionResult<Vec<TabularRecord>> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let header_len = csv_reader
        .headers()
        .map_err(|e| ExtractionError::Tabular(format!("Failed to read CSV header: {}", e)))?
        .len();
    if header_len < EXPORT_COLUMNS {
        return Err(ExtractionError::Tabular(format!(
            "Invalid CSV format: expected at least {} columns, got {}",
            EXPORT_COLUMNS, header_len
        )));
    }

    let mut records = Vec::new();
    for (index, row) in csv_reader.records().enumerate() {
        let line = index + 2;
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(line, error = %e, "Skipping unreadable CSV row");
                continue;
            }
        };

        match TabularRecord::from_csv_record(&row, zone) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(line, error = %e, "Skipping CSV row"),
        }
    }

    if records.is_empty() {
        return Err(ExtractionError::Tabular(
            "No valid transactions found in CSV".to_string(),
        ));
    }

    tracing::debug!(rows = records.len(), "Decoded CSV export");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    const HEADER: &str = "MFG Number,Trans No,Transaction Date/Time,Posted Date,Transaction Type,Sector,Entry Location,Entry SP,Exit Location,Exit SP,Reload Location,Trans Amount,Balance,Vehicle Class,Device No,Transaction ID,Vehicle Number";

    fn zone() -> Zone {
        Zone::parse("+08:00").unwrap()
    }

    #[test]
    fn test_decode_rows() {
        let data = format!(
            "{HEADER}\n\
             0123456789,1,2024-03-01 08:15:00,2024-03-02 00:00:00,Usage,TOLL,Jalan Duta,PLUS,Sg Buloh,PLUS,,10.00,90.00,1,D1,TX-1,ABC123\n\
             0123456789,2,2024-03-03 18:00:00,,Reload,,,,,,Petronas,50.00,140.00,1,D1,TX-2,ABC123\n"
        );

        let records = decode_csv_export(data.as_bytes(), zone()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].account_id, "0123456789");
        assert_eq!(records[0].amount, BigDecimal::from_str("10.00").unwrap());
        assert_eq!(records[0].exit_location, "Sg Buloh");
        assert!(records[0].posted_at.is_some());
        assert!(records[1].posted_at.is_none());
        assert_eq!(records[1].reload_location, "Petronas");
        assert_eq!(records[1].transacted_at.offset().local_minus_utc(), 8 * 3600);
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let data = format!(
            "{HEADER}\n\
             short,row\n\
             0123456789,1,not a date,,Usage,TOLL,A,B,C,D,,10.00,90.00,1,D1,TX-1,ABC123\n\
             0123456789,2,2024-03-01 08:15:00,,Usage,TOLL,A,B,C,D,,abc,90.00,1,D1,TX-2,ABC123\n\
             0123456789,3,2024-03-01 09:15:00,,Usage,TOLL,A,B,C,D,,5.00,85.00,1,D1,TX-3,ABC123\n"
        );

        let records = decode_csv_export(data.as_bytes(), zone()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].transaction_id, "TX-3");
    }

    #[test]
    fn test_short_header_is_rejected() {
        let result = decode_csv_export("a,b,c\n1,2,3\n".as_bytes(), zone());
        assert!(matches!(result, Err(ExtractionError::Tabular(_))));
    }

    #[test]
    fn test_no_valid_rows_is_an_error() {
        let data = format!("{HEADER}\nshort,row\n");
        assert!(decode_csv_export(data.as_bytes(), zone()).is_err());
    }
}
