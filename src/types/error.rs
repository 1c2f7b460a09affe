//! Error types for the points engine
//!
//! This module defines all error types that can occur while processing point
//! transactions and running the CSV pipeline.
//!
//! # Error Categories
//!
//! - **Rejections**: invalid amount, limit exceeded, insufficient balance,
//!   unsupported kind. The transaction is refused and nothing is committed.
//! - **Faults**: lock timeout and opaque store failures.
//! - **File I/O and CSV errors**: raised by the pipeline, not by the coordinator.

use super::{Points, UserId};
use std::time::Duration;
use thiserror::Error;

/// Main error type for the points engine
///
/// Callers branch on the variant; the messages carry enough context
/// (attempted amount, current points, limit) to be useful in logs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PointError {
    /// Charge amount was zero or negative, or a use amount was negative
    #[error("Invalid amount {amount} for user {user_id}")]
    InvalidAmount {
        /// User the request was for
        user_id: UserId,
        /// The rejected amount
        amount: Points,
    },

    /// Charge would push the balance above the limit
    #[error("Charge of {amount} for user {user_id} exceeds the limit: current {points}, limit {limit}")]
    LimitExceeded {
        /// User the request was for
        user_id: UserId,
        /// Attempted charge amount
        amount: Points,
        /// Points before the charge
        points: Points,
        /// The balance ceiling
        limit: Points,
    },

    /// Use amount exceeds the current balance
    #[error("Insufficient balance for user {user_id}: current {points}, requested {amount}")]
    InsufficientBalance {
        /// User the request was for
        user_id: UserId,
        /// Attempted use amount
        amount: Points,
        /// Points before the use
        points: Points,
    },

    /// No strategy is registered for the requested kind
    #[error("Unsupported transaction kind: {kind}")]
    UnsupportedTransactionKind {
        /// The offending kind (`null` when it was missing)
        kind: String,
    },

    /// The user's lock could not be acquired within the configured timeout
    #[error("Timed out after {waited_ms}ms waiting for the lock of user {user_id}")]
    LockTimeout {
        /// User whose lock was contended
        user_id: UserId,
        /// Configured timeout in milliseconds
        waited_ms: u64,
    },

    /// Opaque failure reported by a backing store
    #[error("Store error: {message}")]
    Store {
        /// Description of the store failure
        message: String,
    },

    /// File not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound {
        /// The path that was not found
        path: String,
    },

    /// I/O error occurred while reading or writing files
    #[error("I/O error: {message}")]
    IoError {
        /// Description of the I/O error
        message: String,
    },

    /// An input row could not be parsed
    ///
    /// Recoverable: the reader skips the row and keeps going.
    #[error("CSV parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError {
        /// Line number where the error occurred (if available)
        line: Option<u64>,
        /// Description of the parsing error
        message: String,
    },
}

impl From<std::io::Error> for PointError {
    fn from(error: std::io::Error) -> Self {
        PointError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<csv_async::Error> for PointError {
    fn from(error: csv_async::Error) -> Self {
        let line = error.position().map(|pos| pos.line());

        PointError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

// Helper functions for creating common errors

impl PointError {
    /// Create an InvalidAmount error
    pub fn invalid_amount(user_id: UserId, amount: Points) -> Self {
        PointError::InvalidAmount { user_id, amount }
    }

    /// Create a LimitExceeded error against `Balance::LIMIT`
    pub fn limit_exceeded(user_id: UserId, amount: Points, points: Points) -> Self {
        PointError::LimitExceeded {
            user_id,
            amount,
            points,
            limit: super::Balance::LIMIT,
        }
    }

    /// Create an InsufficientBalance error
    pub fn insufficient_balance(user_id: UserId, amount: Points, points: Points) -> Self {
        PointError::InsufficientBalance {
            user_id,
            amount,
            points,
        }
    }

    /// Create an UnsupportedTransactionKind error; a missing kind renders as `null`
    pub fn unsupported_kind(kind: Option<&str>) -> Self {
        PointError::UnsupportedTransactionKind {
            kind: kind.unwrap_or("null").to_string(),
        }
    }

    /// Create a LockTimeout error
    pub fn lock_timeout(user_id: UserId, waited: Duration) -> Self {
        PointError::LockTimeout {
            user_id,
            waited_ms: waited.as_millis() as u64,
        }
    }

    /// Create a Store error
    pub fn store(message: impl Into<String>) -> Self {
        PointError::Store {
            message: message.into(),
        }
    }

    /// Whether this error is a rejected transaction rather than a system fault
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            PointError::InvalidAmount { .. }
                | PointError::LimitExceeded { .. }
                | PointError::InsufficientBalance { .. }
                | PointError::UnsupportedTransactionKind { .. }
        )
    }
}
