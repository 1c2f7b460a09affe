//! Transaction-related types for the points engine
//!
//! This module defines the closed set of transaction kinds, the history log
//! entry written for every successful transaction, and the raw request record
//! read from input.

use super::{PointError, Points, SequenceId, Timestamp, UserId};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Transaction kinds supported by the points engine
///
/// This is a closed set: anything else is rejected as
/// `PointError::UnsupportedTransactionKind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    /// Increase a balance, bounded above by `Balance::LIMIT`
    Charge,

    /// Decrease a balance, bounded below by zero
    Use,
}

impl TransactionKind {
    /// Upper-case wire name (`CHARGE` / `USE`)
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Charge => "CHARGE",
            TransactionKind::Use => "USE",
        }
    }

    /// Parse an optional raw kind, treating a missing kind as unsupported
    pub fn parse_optional(raw: Option<&str>) -> Result<Self, PointError> {
        match raw {
            Some(raw) => raw.parse(),
            None => Err(PointError::unsupported_kind(None)),
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = PointError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "CHARGE" => Ok(TransactionKind::Charge),
            "USE" => Ok(TransactionKind::Use),
            _ => Err(PointError::unsupported_kind(Some(raw))),
        }
    }
}

/// A history entry that has not been appended yet
///
/// Built by a transaction strategy; the history store turns it into a
/// `LogEntry` by assigning the next sequence id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingEntry {
    pub user_id: UserId,
    pub amount: Points,
    pub kind: TransactionKind,
    pub timestamp: Timestamp,
}

impl PendingEntry {
    pub fn new(
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        timestamp: Timestamp,
    ) -> Self {
        PendingEntry {
            user_id,
            amount,
            kind,
            timestamp,
        }
    }
}

/// One completed charge or use
///
/// Immutable once appended. `amount` is positive for both kinds; `kind`
/// carries the direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    /// Store-wide sequence number, strictly increasing across all users
    pub sequence_id: SequenceId,

    /// The user whose balance changed
    pub user_id: UserId,

    /// Points charged or used
    pub amount: Points,

    /// Direction of the change
    pub kind: TransactionKind,

    /// Event time supplied by the caller
    pub timestamp: Timestamp,
}

impl LogEntry {
    /// Materialize a pending entry under the given sequence id
    pub fn from_pending(sequence_id: SequenceId, pending: PendingEntry) -> Self {
        LogEntry {
            sequence_id,
            user_id: pending.user_id,
            amount: pending.amount,
            kind: pending.kind,
            timestamp: pending.timestamp,
        }
    }
}

/// Input request record
///
/// The kind is kept raw so that unknown or missing kinds reach the strategy
/// registry and are rejected there, like any other unsupported transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointRequest {
    /// The user this request applies to
    pub user_id: UserId,

    /// Raw transaction kind (`None` when the input left it empty)
    pub kind: Option<String>,

    /// Requested amount
    pub amount: Points,

    /// Event time for the history entry
    pub timestamp: Timestamp,
}
