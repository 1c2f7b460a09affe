//! Read-only query surface
//!
//! Balance lookups and history listings go straight to the stores without
//! taking any user lock. A query may therefore observe a balance that an
//! in-flight transaction is about to replace; the coordinator only orders
//! writes against writes.

use std::sync::Arc;

use super::traits::{BalanceStore, HistoryStore};
use crate::types::{Balance, LogEntry, PointError, UserId};

/// Unsynchronized reads over the backing stores
#[derive(Debug)]
pub struct PointQuery<B, H> {
    balances: Arc<B>,
    history: Arc<H>,
}

impl<B, H> Clone for PointQuery<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            history: Arc::clone(&self.history),
        }
    }
}

impl<B: BalanceStore, H: HistoryStore> PointQuery<B, H> {
    pub fn new(balances: Arc<B>, history: Arc<H>) -> Self {
        Self { balances, history }
    }

    /// Current balance; zero points for a user that was never written
    pub async fn get_balance(&self, user_id: UserId) -> Result<Balance, PointError> {
        self.balances.read(user_id).await
    }

    /// The user's history in insertion order; empty for an unknown user
    pub async fn list_history(&self, user_id: UserId) -> Result<Vec<LogEntry>, PointError> {
        self.history.list_by_user(user_id).await
    }
}
