//! Use strategy

use super::TransactionStrategy;
use crate::types::{Balance, PointError, Points, TransactionKind};

/// Spends points, down to zero
///
/// Using zero points is accepted and changes nothing; see `is_no_op`.
#[derive(Debug, Clone, Copy, Default)]
pub struct UseStrategy;

impl TransactionStrategy for UseStrategy {
    fn kind(&self) -> TransactionKind {
        TransactionKind::Use
    }

    fn compute_new_balance(&self, current: &Balance, amount: Points) -> Result<Points, PointError> {
        current.use_points(amount)
    }

    fn is_no_op(&self, amount: Points) -> bool {
        amount == 0
    }
}
