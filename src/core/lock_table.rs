//! Per-user lock table
//!
//! Maps each user id to one `tokio::sync::Mutex`, created on first use.
//! Entries are never removed: the table grows with the number of distinct
//! users, not with request volume.
//!
//! # Fairness
//!
//! Tokio's mutex queues waiters in FIFO order, so callers waiting on the same
//! user are admitted first-come-first-served.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::types::UserId;

/// Shared handle to one user's lock
pub type UserLock = Arc<Mutex<()>>;

/// Concurrent get-or-create table of per-user locks
#[derive(Debug, Default)]
pub struct UserLockTable {
    locks: DashMap<UserId, UserLock>,
}

impl UserLockTable {
    pub fn new() -> Self {
        Self {
            locks: DashMap::new(),
        }
    }

    /// Get the lock for `user_id`, installing a new one if none exists
    ///
    /// Racing first-touch callers all observe the single instance that won the
    /// insert. The shard guard is released before returning, so the returned
    /// handle can be awaited freely.
    pub fn lock_for(&self, user_id: UserId) -> UserLock {
        self.locks
            .entry(user_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    /// Whether a lock has been created for `user_id`
    pub fn contains(&self, user_id: UserId) -> bool {
        self.locks.contains_key(&user_id)
    }

    /// Number of users that have a lock
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
