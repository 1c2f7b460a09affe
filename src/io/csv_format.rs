//! CSV format handling for point requests and ledger output
//!
//! This module centralizes all CSV format concerns, providing:
//! - CsvRecord structure for deserialization
//! - Conversion from CSV records to `PointRequest`s
//! - Balance and history output serialization
//!
//! All functions are pure (no file I/O) for easy testing.
//!
//! # Input format
//!
//! ```text
//! user,kind,amount,timestamp
//! 1,CHARGE,1000,1700000000000
//! 1,USE,250,
//! ```
//!
//! `timestamp` is optional; when absent the time the row was read is used.
//! `kind` is passed through raw so the strategy registry decides what is
//! supported.

use crate::types::{Balance, LogEntry, PointError, PointRequest, Points, Timestamp, UserId};
use serde::Deserialize;
use std::io::Write;

/// CSV record structure for deserialization
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct CsvRecord {
    pub user: UserId,
    pub kind: Option<String>,
    pub amount: Points,
    pub timestamp: Option<Timestamp>,
}

/// Convert a CsvRecord to a PointRequest
///
/// Blank kinds become `None` (reported downstream as `null`), and a missing
/// timestamp falls back to `received_at`.
pub fn convert_csv_record(csv_record: CsvRecord, received_at: Timestamp) -> PointRequest {
    let kind = csv_record
        .kind
        .map(|kind| kind.trim().to_string())
        .filter(|kind| !kind.is_empty());

    PointRequest {
        user_id: csv_record.user,
        kind,
        amount: csv_record.amount,
        timestamp: csv_record.timestamp.unwrap_or(received_at),
    }
}

fn write_error(context: &str, error: impl std::fmt::Display) -> PointError {
    PointError::IoError {
        message: format!("{}: {}", context, error),
    }
}

/// Write balances in CSV format with columns: user, points, updated_at
///
/// Balances are sorted by user id for deterministic output.
pub fn write_balances_csv(balances: &[Balance], output: &mut dyn Write) -> Result<(), PointError> {
    let mut writer = csv::Writer::from_writer(output);

    writer
        .write_record(["user", "points", "updated_at"])
        .map_err(|e| write_error("Failed to write CSV header", e))?;

    let mut sorted = balances.to_vec();
    sorted.sort_by_key(|balance| balance.user_id);

    for balance in sorted {
        writer
            .write_record(&[
                balance.user_id.to_string(),
                balance.points.to_string(),
                balance.updated_at.to_string(),
            ])
            .map_err(|e| write_error("Failed to write balance record", e))?;
    }

    writer
        .flush()
        .map_err(|e| write_error("Failed to flush output", e))
}

/// Write history entries in CSV format, ordered by sequence id
///
/// Columns: sequence_id, user_id, amount, kind, timestamp
pub fn write_history_csv(entries: &[LogEntry], output: &mut dyn Write) -> Result<(), PointError> {
    let mut writer = csv::Writer::from_writer(output);

    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|entry| entry.sequence_id);

    if sorted.is_empty() {
        writer
            .write_record(["sequence_id", "user_id", "amount", "kind", "timestamp"])
            .map_err(|e| write_error("Failed to write CSV header", e))?;
    }

    for entry in &sorted {
        writer
            .serialize(entry)
            .map_err(|e| write_error("Failed to write history record", e))?;
    }

    writer
        .flush()
        .map_err(|e| write_error("Failed to flush output", e))
}
