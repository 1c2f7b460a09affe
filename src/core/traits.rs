//! Backing store ports
//!
//! The coordinator and the query surface only talk to storage through these
//! traits. Each call is atomic on its own and may take a bounded,
//! non-deterministic amount of time; nothing is guaranteed across calls.

use std::future::Future;

use crate::types::{Balance, LogEntry, PendingEntry, PointError, Points, UserId};

/// Current-balance storage
pub trait BalanceStore: Send + Sync + 'static {
    /// Read a user's balance, synthesizing an empty one for unknown users
    fn read(&self, user_id: UserId) -> impl Future<Output = Result<Balance, PointError>> + Send;

    /// Store `points` as the user's new balance and return it with a fresh timestamp
    fn write(
        &self,
        user_id: UserId,
        points: Points,
    ) -> impl Future<Output = Result<Balance, PointError>> + Send;
}

/// Append-only transaction history
pub trait HistoryStore: Send + Sync + 'static {
    /// Append an entry, assigning it the next store-wide sequence id
    fn append(
        &self,
        entry: PendingEntry,
    ) -> impl Future<Output = Result<LogEntry, PointError>> + Send;

    /// List a user's entries in insertion order (possibly empty)
    fn list_by_user(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<LogEntry>, PointError>> + Send;
}
