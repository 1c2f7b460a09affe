//! In-memory history store with simulated latency
//!
//! This module provides the `HistoryTable` struct, the default `HistoryStore`
//! implementation. Entries are grouped per user in a `DashMap`; sequence ids
//! come from one store-wide counter.
//!
//! # Ordering
//!
//! The sequence id is drawn while the user's shard entry is held, so a user's
//! entries are stored in sequence-id order even when appends for that user
//! race. Across users, ids are unique and strictly increasing in draw order.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;

use super::latency::{throttle, StoreLatency};
use super::traits::HistoryStore;
use crate::types::{LogEntry, PendingEntry, PointError, SequenceId, UserId};

/// Thread-safe, latency-simulating transaction history
#[derive(Debug)]
pub struct HistoryTable {
    /// Per-user entries in insertion order
    entries: DashMap<UserId, Vec<LogEntry>>,

    /// Last sequence id handed out (0 before the first append)
    last_sequence: AtomicU64,

    latency: StoreLatency,
}

impl HistoryTable {
    pub fn new(latency: StoreLatency) -> Self {
        Self {
            entries: DashMap::new(),
            last_sequence: AtomicU64::new(0),
            latency,
        }
    }

    /// Create an empty history without simulated latency
    pub fn instant() -> Self {
        Self::new(StoreLatency::none())
    }

    /// Every entry across all users, ordered by sequence id
    ///
    /// Does not sleep; meant for final reporting.
    pub fn snapshot(&self) -> Vec<LogEntry> {
        let mut all: Vec<LogEntry> = self
            .entries
            .iter()
            .flat_map(|entry| entry.value().clone())
            .collect();
        all.sort_by_key(|entry| entry.sequence_id);
        all
    }

    /// Total number of entries across all users
    pub fn len(&self) -> usize {
        self.entries.iter().map(|entry| entry.value().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_sequence(&self) -> SequenceId {
        self.last_sequence.fetch_add(1, Ordering::SeqCst) + 1
    }
}

impl Default for HistoryTable {
    fn default() -> Self {
        Self::new(StoreLatency::default())
    }
}

impl HistoryStore for HistoryTable {
    async fn append(&self, pending: PendingEntry) -> Result<LogEntry, PointError> {
        throttle(self.latency.append).await;

        let mut user_entries = self.entries.entry(pending.user_id).or_default();
        let entry = LogEntry::from_pending(self.next_sequence(), pending);
        user_entries.push(entry);

        Ok(entry)
    }

    async fn list_by_user(&self, user_id: UserId) -> Result<Vec<LogEntry>, PointError> {
        throttle(self.latency.read).await;

        Ok(self
            .entries
            .get(&user_id)
            .map(|entry| entry.value().clone())
            .unwrap_or_default())
    }
}
