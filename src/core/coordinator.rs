//! Per-user transaction coordinator
//!
//! This module provides the `PointCoordinator`, which applies charge and use
//! transactions against the backing stores while guaranteeing that, for any
//! single user, read-compute-write-append cycles never interleave.
//!
//! # Architecture
//!
//! ```text
//! PointCoordinator
//!     ├── Arc<StrategyRegistry>  (kind → strategy, fixed at startup)
//!     ├── Arc<UserLockTable>     (user id → FIFO mutex, created lazily)
//!     ├── Arc<B: BalanceStore>   (current balances)
//!     └── Arc<H: HistoryStore>   (append-only log)
//! ```
//!
//! # Execution
//!
//! 1. Resolve the strategy; unsupported kinds fail before any lock is created.
//! 2. Get or create the user's lock and wait for it (FIFO, optionally bounded).
//! 3. Under the lock: read the balance, compute, write, append the history entry.
//!    This step runs as its own task that owns the lock guard, so once started
//!    it finishes even if the caller stops waiting.
//! 4. The guard is dropped on every exit path, including errors and cancellation.
//!
//! Different users never share a lock, so one user's store latency does not
//! delay another user's transaction.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::OwnedMutexGuard;
use tracing::{debug, error, info, warn};

use super::lock_table::{UserLock, UserLockTable};
use super::query::PointQuery;
use super::traits::{BalanceStore, HistoryStore};
use crate::strategy::{StrategyRegistry, TransactionStrategy};
use crate::types::{Balance, PointError, PointRequest, Points, Timestamp, TransactionKind, UserId};

/// Coordinator tuning
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoordinatorConfig {
    /// Maximum wait for a user's lock; `None` waits indefinitely
    pub lock_timeout: Option<Duration>,
}

impl CoordinatorConfig {
    /// Bound lock acquisition; a zero duration means no bound
    pub fn with_lock_timeout(timeout: Duration) -> Self {
        Self {
            lock_timeout: (!timeout.is_zero()).then_some(timeout),
        }
    }
}

/// Serializes transactions per user against the backing stores
///
/// Cheap to clone: all state is shared behind `Arc`s, so clones can be moved
/// into spawned tasks and still coordinate through the same lock table.
#[derive(Debug)]
pub struct PointCoordinator<B, H> {
    balances: Arc<B>,
    history: Arc<H>,
    registry: Arc<StrategyRegistry>,
    locks: Arc<UserLockTable>,
    config: CoordinatorConfig,
}

impl<B, H> Clone for PointCoordinator<B, H> {
    fn clone(&self) -> Self {
        Self {
            balances: Arc::clone(&self.balances),
            history: Arc::clone(&self.history),
            registry: Arc::clone(&self.registry),
            locks: Arc::clone(&self.locks),
            config: self.config,
        }
    }
}

impl<B: BalanceStore, H: HistoryStore> PointCoordinator<B, H> {
    /// Create a coordinator with the standard registry and no lock timeout
    pub fn new(balances: Arc<B>, history: Arc<H>) -> Self {
        Self::with_registry(
            balances,
            history,
            Arc::new(StrategyRegistry::standard()),
            CoordinatorConfig::default(),
        )
    }

    /// Create a coordinator with an explicit registry and configuration
    pub fn with_registry(
        balances: Arc<B>,
        history: Arc<H>,
        registry: Arc<StrategyRegistry>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            balances,
            history,
            registry,
            locks: Arc::new(UserLockTable::new()),
            config,
        }
    }

    /// Apply one transaction for `user_id` and return the resulting balance
    ///
    /// # Errors
    ///
    /// * `UnsupportedTransactionKind` - no strategy for `kind` (no lock is touched)
    /// * `InvalidAmount`, `LimitExceeded`, `InsufficientBalance` - rejected; nothing committed
    /// * `LockTimeout` - only when a lock timeout is configured
    /// * `Store` - a backing store call failed
    pub async fn execute(
        &self,
        user_id: UserId,
        amount: Points,
        kind: TransactionKind,
        timestamp: Timestamp,
    ) -> Result<Balance, PointError> {
        let strategy = self.registry.find_strategy(kind)?;
        self.run_exclusive(strategy.kind(), user_id, amount, timestamp).await
    }

    /// Like `execute`, for an untyped and possibly missing kind
    pub async fn execute_raw(
        &self,
        user_id: UserId,
        amount: Points,
        kind: Option<&str>,
        timestamp: Timestamp,
    ) -> Result<Balance, PointError> {
        let strategy = self.registry.resolve(kind)?;
        self.run_exclusive(strategy.kind(), user_id, amount, timestamp).await
    }

    /// Apply a request read from input
    pub async fn submit(&self, request: &PointRequest) -> Result<Balance, PointError> {
        self.execute_raw(
            request.user_id,
            request.amount,
            request.kind.as_deref(),
            request.timestamp,
        )
        .await
    }

    /// Read-only view over the same stores
    pub fn query(&self) -> PointQuery<B, H> {
        PointQuery::new(Arc::clone(&self.balances), Arc::clone(&self.history))
    }

    /// The per-user lock table
    pub fn locks(&self) -> &UserLockTable {
        &self.locks
    }

    pub fn registry(&self) -> &StrategyRegistry {
        &self.registry
    }

    async fn run_exclusive(
        &self,
        kind: TransactionKind,
        user_id: UserId,
        amount: Points,
        timestamp: Timestamp,
    ) -> Result<Balance, PointError> {
        let guard = self.acquire(user_id, self.locks.lock_for(user_id)).await?;
        debug!(user_id, %kind, amount, "lock acquired");

        // Owns the guard: read, write and append complete together or not at all
        let coordinator = self.clone();
        let critical_section = tokio::spawn(async move {
            let result = coordinator.apply(kind, user_id, amount, timestamp).await;
            match &result {
                Ok(balance) => {
                    info!(user_id, %kind, amount, points = balance.points, "transaction applied")
                }
                Err(e) if e.is_rejection() => {
                    warn!(user_id, %kind, amount, reason = %e, "transaction rejected")
                }
                Err(e) => error!(user_id, %kind, amount, reason = %e, "transaction failed"),
            }

            drop(guard);
            result
        });

        critical_section.await.map_err(|e| {
            PointError::store(format!("transaction task for user {} aborted: {}", user_id, e))
        })?
    }

    async fn acquire(
        &self,
        user_id: UserId,
        lock: UserLock,
    ) -> Result<OwnedMutexGuard<()>, PointError> {
        match self.config.lock_timeout {
            None => Ok(lock.lock_owned().await),
            Some(limit) => tokio::time::timeout(limit, lock.lock_owned())
                .await
                .map_err(|_| PointError::lock_timeout(user_id, limit)),
        }
    }

    /// The critical section; must only run while the user's lock is held
    async fn apply(
        &self,
        kind: TransactionKind,
        user_id: UserId,
        amount: Points,
        timestamp: Timestamp,
    ) -> Result<Balance, PointError> {
        let strategy: &dyn TransactionStrategy = self.registry.find_strategy(kind)?;
        let current = self.balances.read(user_id).await?;

        if strategy.is_no_op(amount) {
            debug!(user_id, %kind, "no state change, skipping write");
            return Ok(current);
        }

        let points = strategy.compute_new_balance(&current, amount)?;
        let updated = self.balances.write(user_id, points).await?;

        let entry = self
            .history
            .append(strategy.build_history_entry(user_id, amount, timestamp))
            .await?;
        debug!(user_id, sequence_id = entry.sequence_id, "history appended");

        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BalanceTable, HistoryTable, StoreLatency};
    use crate::strategy::ChargeStrategy;
    use crate::types::LogEntry;
    use rstest::rstest;
    use std::sync::atomic::{AtomicBool, Ordering};

    type Coordinator = PointCoordinator<BalanceTable, HistoryTable>;

    fn coordinator() -> Coordinator {
        PointCoordinator::new(
            Arc::new(BalanceTable::instant()),
            Arc::new(HistoryTable::instant()),
        )
    }

    async fn history<B: BalanceStore, H: HistoryStore>(
        coordinator: &PointCoordinator<B, H>,
        user_id: UserId,
    ) -> Vec<LogEntry> {
        coordinator.query().list_history(user_id).await.unwrap()
    }

    #[tokio::test]
    async fn test_charge_creates_balance_and_history() {
        let coordinator = coordinator();

        let balance = coordinator
            .execute(1, 1_000, TransactionKind::Charge, 100)
            .await
            .unwrap();

        assert_eq!(balance.user_id, 1);
        assert_eq!(balance.points, 1_000);

        let history = history(&coordinator, 1).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].amount, 1_000);
        assert_eq!(history[0].kind, TransactionKind::Charge);
        assert_eq!(history[0].timestamp, 100);
    }

    #[tokio::test]
    async fn test_charge_then_use() {
        let coordinator = coordinator();

        coordinator.execute(1, 1_000, TransactionKind::Charge, 1).await.unwrap();
        let balance = coordinator.execute(1, 300, TransactionKind::Use, 2).await.unwrap();

        assert_eq!(balance.points, 700);
        let kinds: Vec<TransactionKind> = history(&coordinator, 1)
            .await
            .iter()
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![TransactionKind::Charge, TransactionKind::Use]);
    }

    #[rstest]
    #[case::negative_charge(1_000, -100, TransactionKind::Charge)]
    #[case::zero_charge(1_000, 0, TransactionKind::Charge)]
    #[case::over_limit(9_000, 2_000, TransactionKind::Charge)]
    #[case::insufficient(1_000, 1_001, TransactionKind::Use)]
    #[tokio::test]
    async fn test_rejection_commits_nothing(
        #[case] initial: Points,
        #[case] amount: Points,
        #[case] kind: TransactionKind,
    ) {
        let coordinator = coordinator();
        coordinator.execute(1, initial, TransactionKind::Charge, 1).await.unwrap();
        let before = coordinator.query().get_balance(1).await.unwrap();

        let result = coordinator.execute(1, amount, kind, 2).await;

        assert!(result.unwrap_err().is_rejection());
        assert_eq!(coordinator.query().get_balance(1).await.unwrap(), before);
        assert_eq!(history(&coordinator, 1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_use_returns_current_balance_without_history() {
        let coordinator = coordinator();
        let charged = coordinator.execute(1, 500, TransactionKind::Charge, 1).await.unwrap();

        let balance = coordinator.execute(1, 0, TransactionKind::Use, 2).await.unwrap();

        assert_eq!(balance, charged);
        assert_eq!(history(&coordinator, 1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_zero_use_on_unknown_user_persists_nothing() {
        let balances = Arc::new(BalanceTable::instant());
        let coordinator =
            PointCoordinator::new(Arc::clone(&balances), Arc::new(HistoryTable::instant()));

        let balance = coordinator.execute(5, 0, TransactionKind::Use, 1).await.unwrap();

        assert_eq!(balance.points, 0);
        assert!(balances.is_empty());
        assert!(history(&coordinator, 5).await.is_empty());
    }

    #[rstest]
    #[case::missing(None)]
    #[case::unknown(Some("REFUND"))]
    #[tokio::test]
    async fn test_unsupported_kind_creates_no_lock(#[case] kind: Option<&str>) {
        let coordinator = coordinator();

        let err = coordinator.execute_raw(1, 100, kind, 1).await.unwrap_err();

        assert!(matches!(err, PointError::UnsupportedTransactionKind { .. }));
        assert!(coordinator.locks().is_empty());
    }

    #[tokio::test]
    async fn test_unregistered_kind_creates_no_lock() {
        let coordinator = PointCoordinator::with_registry(
            Arc::new(BalanceTable::instant()),
            Arc::new(HistoryTable::instant()),
            Arc::new(StrategyRegistry::new(vec![Box::new(ChargeStrategy)])),
            CoordinatorConfig::default(),
        );

        let err = coordinator.execute(1, 10, TransactionKind::Use, 1).await.unwrap_err();

        assert_eq!(err, PointError::unsupported_kind(Some("USE")));
        assert!(!coordinator.locks().contains(1));
    }

    #[tokio::test]
    async fn test_submit_uses_raw_request() {
        let coordinator = coordinator();
        let request = PointRequest {
            user_id: 3,
            kind: Some("CHARGE".to_string()),
            amount: 250,
            timestamp: 7,
        };

        let balance = coordinator.submit(&request).await.unwrap();

        assert_eq!(balance.points, 250);
        assert!(coordinator.locks().contains(3));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_held_lock_does_not_block_other_users() {
        let coordinator = coordinator();
        let _held = coordinator.locks().lock_for(1).lock_owned().await;

        let other = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator.execute(2, 100, TransactionKind::Charge, 1),
        )
        .await;

        assert_eq!(other.unwrap().unwrap().points, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_waiters_are_admitted_in_arrival_order() {
        let coordinator = coordinator();
        let held = coordinator.locks().lock_for(1).lock_owned().await;

        let mut tasks = Vec::new();
        for amount in 1..=5 {
            let coordinator = coordinator.clone();
            tasks.push(tokio::spawn(async move {
                coordinator.execute(1, amount, TransactionKind::Charge, amount).await
            }));
            // Let this waiter enqueue before the next one arrives
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        drop(held);
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let amounts: Vec<Points> = history(&coordinator, 1)
            .await
            .iter()
            .map(|e| e.amount)
            .collect();
        assert_eq!(amounts, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_lock_timeout_fails_without_committing() {
        let coordinator = PointCoordinator::with_registry(
            Arc::new(BalanceTable::instant()),
            Arc::new(HistoryTable::instant()),
            Arc::new(StrategyRegistry::standard()),
            CoordinatorConfig::with_lock_timeout(Duration::from_millis(20)),
        );
        let held = coordinator.locks().lock_for(1).lock_owned().await;

        let err = coordinator.execute(1, 100, TransactionKind::Charge, 1).await.unwrap_err();
        assert_eq!(err, PointError::LockTimeout { user_id: 1, waited_ms: 20 });

        drop(held);
        let balance = coordinator.execute(1, 100, TransactionKind::Charge, 2).await.unwrap();
        assert_eq!(balance.points, 100);
        assert_eq!(history(&coordinator, 1).await.len(), 1);
    }

    #[test]
    fn test_zero_lock_timeout_means_unbounded() {
        assert_eq!(CoordinatorConfig::with_lock_timeout(Duration::ZERO).lock_timeout, None);
    }

    /// Balance store that fails its first write
    #[derive(Debug)]
    struct FlakyBalances {
        inner: BalanceTable,
        failed: AtomicBool,
    }

    impl BalanceStore for FlakyBalances {
        async fn read(&self, user_id: UserId) -> Result<Balance, PointError> {
            self.inner.read(user_id).await
        }

        async fn write(&self, user_id: UserId, points: Points) -> Result<Balance, PointError> {
            if !self.failed.swap(true, Ordering::SeqCst) {
                return Err(PointError::store("balance table unavailable"));
            }
            self.inner.write(user_id, points).await
        }
    }

    #[tokio::test]
    async fn test_store_fault_propagates_and_releases_lock() {
        let coordinator = PointCoordinator::new(
            Arc::new(FlakyBalances {
                inner: BalanceTable::new(StoreLatency::none()),
                failed: AtomicBool::new(false),
            }),
            Arc::new(HistoryTable::instant()),
        );

        let err = coordinator.execute(1, 100, TransactionKind::Charge, 1).await.unwrap_err();
        assert_eq!(err, PointError::store("balance table unavailable"));
        assert!(!err.is_rejection());
        assert!(history(&coordinator, 1).await.is_empty());

        let retried = tokio::time::timeout(
            Duration::from_secs(5),
            coordinator.execute(1, 100, TransactionKind::Charge, 2),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(retried.points, 100);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancelled_execution_still_commits_atomically() {
        // Instant balance writes, slow appends: cancel lands between the two
        let coordinator = PointCoordinator::new(
            Arc::new(BalanceTable::instant()),
            Arc::new(HistoryTable::new(StoreLatency::from_millis(0, 0, 200))),
        );

        for user_id in 1..=20 {
            let _ = tokio::time::timeout(
                Duration::from_millis(5),
                coordinator.execute(user_id, 100, TransactionKind::Charge, 1),
            )
            .await;
        }

        for user_id in 1..=20 {
            // Released once the detached critical section has finished
            let released = tokio::time::timeout(
                Duration::from_secs(5),
                coordinator.locks().lock_for(user_id).lock_owned(),
            )
            .await;
            assert!(released.is_ok(), "lock of user {} never released", user_id);

            let balance = coordinator.query().get_balance(user_id).await.unwrap();
            let entries = history(&coordinator, user_id).await;
            assert_eq!(balance.points, 100 * entries.len() as Points);
            assert_eq!(entries.len(), 1);
        }
    }
}
