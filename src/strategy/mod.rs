//! Transaction strategies and their registry
//!
//! Each transaction kind is handled by a `TransactionStrategy`: a pure
//! component that validates a request against the current balance, computes
//! the new point total and describes the history entry to append. Strategies
//! never touch the stores; the coordinator performs all I/O under the user's
//! lock.
//!
//! The `StrategyRegistry` maps a kind to its strategy. Its contents are fixed
//! when it is built; there is no registration afterwards.

use std::fmt;

use crate::types::{Balance, PendingEntry, PointError, Points, Timestamp, TransactionKind, UserId};

pub mod charge;
pub mod r#use;

pub use charge::ChargeStrategy;
pub use r#use::UseStrategy;

/// Behavior of one transaction kind
pub trait TransactionStrategy: Send + Sync + fmt::Debug {
    /// The kind this strategy handles
    fn kind(&self) -> TransactionKind;

    /// Validate `amount` against `current` and compute the new point total
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `LimitExceeded` or `InsufficientBalance`, depending on
    /// the kind's rules.
    fn compute_new_balance(&self, current: &Balance, amount: Points) -> Result<Points, PointError>;

    /// Describe the history entry recorded for a successful transaction
    fn build_history_entry(
        &self,
        user_id: UserId,
        amount: Points,
        timestamp: Timestamp,
    ) -> PendingEntry {
        PendingEntry::new(user_id, amount, self.kind(), timestamp)
    }

    /// Whether `amount` leaves the balance untouched and must not be recorded
    ///
    /// When true, the coordinator skips both the balance write and the history
    /// append and returns the current balance.
    fn is_no_op(&self, _amount: Points) -> bool {
        false
    }
}

/// Fixed mapping from transaction kind to strategy
#[derive(Debug)]
pub struct StrategyRegistry {
    strategies: Vec<Box<dyn TransactionStrategy>>,
}

impl StrategyRegistry {
    /// Build a registry from an explicit strategy list
    ///
    /// If two strategies report the same kind, the first one wins.
    pub fn new(strategies: Vec<Box<dyn TransactionStrategy>>) -> Self {
        Self { strategies }
    }

    /// Registry with the charge and use strategies
    pub fn standard() -> Self {
        Self::new(vec![Box::new(ChargeStrategy), Box::new(UseStrategy)])
    }

    /// Find the strategy for `kind`
    ///
    /// # Errors
    ///
    /// `PointError::UnsupportedTransactionKind` if no strategy handles `kind`.
    pub fn find_strategy(
        &self,
        kind: TransactionKind,
    ) -> Result<&dyn TransactionStrategy, PointError> {
        self.strategies
            .iter()
            .find(|strategy| strategy.kind() == kind)
            .map(|strategy| &**strategy)
            .ok_or_else(|| PointError::unsupported_kind(Some(kind.as_str())))
    }

    /// Parse a raw, possibly missing kind and find its strategy
    pub fn resolve(&self, raw: Option<&str>) -> Result<&dyn TransactionStrategy, PointError> {
        let kind = TransactionKind::parse_optional(raw)?;
        self.find_strategy(kind)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
