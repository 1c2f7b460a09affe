//! Balance-related types for the points engine
//!
//! This module defines the `Balance` value and the charge/use rules that
//! guard its `[0, LIMIT]` range.

use super::{PointError, Points, Timestamp, UserId};

/// A user's point balance at a point in time
///
/// Balances are immutable values: every successful charge or use replaces the
/// stored balance wholesale with a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    /// The user this balance belongs to
    pub user_id: UserId,

    /// Current point total, always within `[0, Balance::LIMIT]`
    pub points: Points,

    /// When this balance was written (or synthesized, for an unknown user)
    pub updated_at: Timestamp,
}

impl Balance {
    /// Upper bound on any user's balance
    pub const LIMIT: Points = 10_000;

    /// Create a balance value
    pub fn new(user_id: UserId, points: Points, updated_at: Timestamp) -> Self {
        Balance {
            user_id,
            points,
            updated_at,
        }
    }

    /// The default balance for a user with no recorded state
    ///
    /// Synthesized on read; it is not stored until the first write.
    pub fn empty(user_id: UserId, at: Timestamp) -> Self {
        Balance::new(user_id, 0, at)
    }

    /// Compute the points after charging `amount`
    ///
    /// This is a pure computation; persisting the result is the caller's job.
    ///
    /// # Errors
    ///
    /// * `PointError::InvalidAmount` - if `amount <= 0`
    /// * `PointError::LimitExceeded` - if the result would exceed `Balance::LIMIT`
    pub fn charge(&self, amount: Points) -> Result<Points, PointError> {
        if amount <= 0 {
            return Err(PointError::invalid_amount(self.user_id, amount));
        }

        match self.points.checked_add(amount) {
            Some(total) if total <= Self::LIMIT => Ok(total),
            _ => Err(PointError::limit_exceeded(self.user_id, amount, self.points)),
        }
    }

    /// Compute the points after using `amount`
    ///
    /// A zero amount is valid and leaves the points unchanged.
    ///
    /// # Errors
    ///
    /// * `PointError::InvalidAmount` - if `amount < 0`
    /// * `PointError::InsufficientBalance` - if `amount` exceeds the current points
    pub fn use_points(&self, amount: Points) -> Result<Points, PointError> {
        if amount < 0 {
            return Err(PointError::invalid_amount(self.user_id, amount));
        }

        if self.points < amount {
            return Err(PointError::insufficient_balance(
                self.user_id,
                amount,
                self.points,
            ));
        }

        Ok(self.points - amount)
    }
}
