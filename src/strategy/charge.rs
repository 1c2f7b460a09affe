//! Charge strategy

use super::TransactionStrategy;
use crate::types::{Balance, PointError, Points, TransactionKind};

/// Adds points, up to `Balance::LIMIT`
#[derive(Debug, Clone, Copy, Default)]
pub struct ChargeStrategy;

impl TransactionStrategy for ChargeStrategy {
    fn kind(&self) -> TransactionKind {
        TransactionKind::Charge
    }

    fn compute_new_balance(&self, current: &Balance, amount: Points) -> Result<Points, PointError> {
        current.charge(amount)
    }
}
