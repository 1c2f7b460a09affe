//! Batch dispatch of input requests onto the coordinator
//!
//! This module provides the `BatchProcessor` struct, which takes a batch of
//! `PointRequest`s and runs them on the tokio runtime in one of two modes.
//!
//! # Modes
//!
//! - **Ordered**: the batch is partitioned by user id; each user's requests
//!   run sequentially in input order while different users run in parallel.
//! - **Concurrent**: every request becomes its own task. Same-user requests
//!   race for the user's lock and are serialized by the coordinator alone, in
//!   lock-arrival order rather than input order.
//!
//! Either way, all requests are processed even if some fail; failures are
//! captured in the returned results.

use std::collections::HashMap;

use clap::ValueEnum;
use tracing::error;

use super::coordinator::PointCoordinator;
use super::traits::{BalanceStore, HistoryStore};
use crate::types::{Balance, PointError, PointRequest, UserId};

/// How a batch is spread over tasks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ProcessingMode {
    /// One task per user, input order preserved per user
    #[default]
    Ordered,
    /// One task per request, serialized per user by the coordinator
    Concurrent,
}

/// Result of processing a single request
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// The request that was processed
    pub request: PointRequest,

    /// The resulting balance or the reason it was refused
    pub result: Result<Balance, PointError>,
}

/// Dispatches request batches onto a shared coordinator
#[derive(Debug)]
pub struct BatchProcessor<B, H> {
    coordinator: PointCoordinator<B, H>,
}

impl<B, H> Clone for BatchProcessor<B, H> {
    fn clone(&self) -> Self {
        Self {
            coordinator: self.coordinator.clone(),
        }
    }
}

impl<B: BalanceStore, H: HistoryStore> BatchProcessor<B, H> {
    pub fn new(coordinator: PointCoordinator<B, H>) -> Self {
        Self { coordinator }
    }

    /// Partition a batch by user id, keeping each user's input order
    pub fn partition_by_user(
        &self,
        batch: Vec<PointRequest>,
    ) -> HashMap<UserId, Vec<PointRequest>> {
        let mut user_batches: HashMap<UserId, Vec<PointRequest>> = HashMap::new();

        for request in batch {
            user_batches.entry(request.user_id).or_default().push(request);
        }

        user_batches
    }

    /// Process one user's requests sequentially, in order
    pub async fn process_user_requests(
        &self,
        requests: Vec<PointRequest>,
    ) -> Vec<ProcessingResult> {
        let mut results = Vec::with_capacity(requests.len());

        for request in requests {
            let result = self.coordinator.submit(&request).await;
            results.push(ProcessingResult { request, result });
        }

        results
    }

    /// Process a batch and wait for every request to finish
    ///
    /// Results are grouped by task, not in input order.
    pub async fn process_batch(
        &self,
        batch: Vec<PointRequest>,
        mode: ProcessingMode,
    ) -> Vec<ProcessingResult> {
        let groups: Vec<Vec<PointRequest>> = match mode {
            ProcessingMode::Ordered => self.partition_by_user(batch).into_values().collect(),
            ProcessingMode::Concurrent => batch.into_iter().map(|request| vec![request]).collect(),
        };

        let mut tasks = Vec::with_capacity(groups.len());
        for requests in groups {
            let processor = self.clone();
            tasks.push(tokio::spawn(async move {
                processor.process_user_requests(requests).await
            }));
        }

        let mut results = Vec::new();
        for task in tasks {
            match task.await {
                Ok(task_results) => results.extend(task_results),
                Err(e) => error!(error = %e, "request task panicked"),
            }
        }

        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{BalanceTable, HistoryTable, StoreLatency};
    use crate::types::{Points, TransactionKind};
    use std::sync::Arc;
    use std::time::Duration;

    fn request(user_id: UserId, kind: &str, amount: Points) -> PointRequest {
        PointRequest {
            user_id,
            kind: Some(kind.to_string()),
            amount,
            timestamp: 0,
        }
    }

    fn processor(latency: StoreLatency) -> BatchProcessor<BalanceTable, HistoryTable> {
        BatchProcessor::new(PointCoordinator::new(
            Arc::new(BalanceTable::new(latency)),
            Arc::new(HistoryTable::new(latency)),
        ))
    }

    #[test]
    fn test_partition_by_user_empty_batch() {
        let processor = processor(StoreLatency::none());

        assert!(processor.partition_by_user(vec![]).is_empty());
    }

    #[test]
    fn test_partition_by_user_maintains_order() {
        let processor = processor(StoreLatency::none());
        let batch = vec![
            request(1, "CHARGE", 100),
            request(2, "CHARGE", 200),
            request(1, "USE", 30),
            request(2, "USE", 50),
            request(1, "USE", 20),
        ];

        let partitioned = processor.partition_by_user(batch);

        assert_eq!(partitioned.len(), 2);
        let user1: Vec<Points> = partitioned[&1].iter().map(|r| r.amount).collect();
        let user2: Vec<Points> = partitioned[&2].iter().map(|r| r.amount).collect();
        assert_eq!(user1, vec![100, 30, 20]);
        assert_eq!(user2, vec![200, 50]);
    }

    #[tokio::test]
    async fn test_process_user_requests_continues_after_error() {
        let processor = processor(StoreLatency::none());
        let requests = vec![
            request(1, "CHARGE", 100),
            request(1, "USE", 500),
            request(1, "REFUND", 10),
            request(1, "USE", 40),
        ];

        let results = processor.process_user_requests(requests).await;

        assert_eq!(results.len(), 4);
        assert_eq!(results[0].result.as_ref().unwrap().points, 100);
        assert!(matches!(results[1].result, Err(PointError::InsufficientBalance { .. })));
        assert!(matches!(results[2].result, Err(PointError::UnsupportedTransactionKind { .. })));
        assert_eq!(results[3].result.as_ref().unwrap().points, 60);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_ordered_applies_input_order() {
        let processor = processor(StoreLatency::uniform(Duration::from_millis(2)));
        // Input order matters: the use only succeeds after the charge
        let batch = vec![
            request(1, "CHARGE", 100),
            request(2, "CHARGE", 50),
            request(1, "USE", 100),
            request(2, "USE", 25),
        ];

        let results = processor.process_batch(batch, ProcessingMode::Ordered).await;

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.result.is_ok()));

        let query = processor.coordinator.query();
        assert_eq!(query.get_balance(1).await.unwrap().points, 0);
        assert_eq!(query.get_balance(2).await.unwrap().points, 25);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_process_batch_concurrent_serializes_same_user() {
        let processor = processor(StoreLatency::uniform(Duration::from_millis(2)));
        let batch: Vec<PointRequest> = (0..40).map(|_| request(7, "CHARGE", 25)).collect();

        let results = processor.process_batch(batch, ProcessingMode::Concurrent).await;

        assert_eq!(results.len(), 40);
        let query = processor.coordinator.query();
        assert_eq!(query.get_balance(7).await.unwrap().points, 1_000);
        let history = query.list_history(7).await.unwrap();
        assert_eq!(history.len(), 40);
        assert!(history.iter().all(|entry| entry.kind == TransactionKind::Charge));
    }

    #[tokio::test]
    async fn test_process_batch_empty() {
        let processor = processor(StoreLatency::none());

        let results = processor.process_batch(vec![], ProcessingMode::Concurrent).await;

        assert!(results.is_empty());
    }
}
