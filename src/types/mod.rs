//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `balance`: Per-user point balance and its charge/use rules
//! - `history`: Transaction kinds and history log entries
//! - `error`: Error types for the points engine

pub mod balance;
pub mod error;
pub mod history;

pub use balance::Balance;
pub use error::PointError;
pub use history::{LogEntry, PendingEntry, PointRequest, TransactionKind};

/// User identifier
pub type UserId = u64;

/// Point amounts and balances
///
/// Signed so that malformed requests (negative charges) stay representable
/// long enough to be rejected with a meaningful error.
pub type Points = i64;

/// Milliseconds since the Unix epoch
pub type Timestamp = i64;

/// Global history sequence number (starts at 1)
pub type SequenceId = u64;

/// Current wall-clock time in milliseconds since the Unix epoch
///
/// Used by the backing stores and the request readers only; the balance rules
/// never read the clock themselves.
pub fn current_millis() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as Timestamp)
        .unwrap_or_default()
}
