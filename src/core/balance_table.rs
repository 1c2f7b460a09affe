//! In-memory balance store with simulated latency
//!
//! This module provides the `BalanceTable` struct, the default `BalanceStore`
//! implementation. Balances live in a `DashMap`, so each individual read or
//! write is atomic, but the table makes no promise about sequences of calls:
//! a read followed by a write can interleave with other callers. Guarding
//! read-modify-write cycles is the coordinator's job.
//!
//! # Latency
//!
//! Every `read` and `write` first sleeps for a random duration bounded by the
//! configured `StoreLatency`, simulating a real database round trip.

use dashmap::DashMap;

use super::latency::{throttle, StoreLatency};
use super::traits::BalanceStore;
use crate::types::{current_millis, Balance, PointError, Points, UserId};

/// Thread-safe, latency-simulating balance table
///
/// Unknown users read as `Balance::empty`; nothing is stored for them until
/// their first write.
#[derive(Debug)]
pub struct BalanceTable {
    /// Concurrent HashMap storing the latest balance per user
    balances: DashMap<UserId, Balance>,

    /// Upper bounds on the simulated per-call delay
    latency: StoreLatency,
}

impl BalanceTable {
    /// Create an empty table with the given latency profile
    pub fn new(latency: StoreLatency) -> Self {
        Self {
            balances: DashMap::new(),
            latency,
        }
    }

    /// Create an empty table without simulated latency
    pub fn instant() -> Self {
        Self::new(StoreLatency::none())
    }

    /// Snapshot of every stored balance, in arbitrary order
    ///
    /// Unlike `read`, this does not sleep; it is meant for final reporting.
    pub fn snapshot(&self) -> Vec<Balance> {
        self.balances
            .iter()
            .map(|entry| *entry.value())
            .collect()
    }

    /// Number of users with a stored balance
    pub fn len(&self) -> usize {
        self.balances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

impl Default for BalanceTable {
    fn default() -> Self {
        Self::new(StoreLatency::default())
    }
}

impl BalanceStore for BalanceTable {
    async fn read(&self, user_id: UserId) -> Result<Balance, PointError> {
        throttle(self.latency.read).await;

        let balance = self
            .balances
            .get(&user_id)
            .map(|entry| *entry.value())
            .unwrap_or_else(|| Balance::empty(user_id, current_millis()));

        Ok(balance)
    }

    async fn write(&self, user_id: UserId, points: Points) -> Result<Balance, PointError> {
        throttle(self.latency.write).await;

        let balance = Balance::new(user_id, points, current_millis());
        self.balances.insert(user_id, balance);

        Ok(balance)
    }
}
