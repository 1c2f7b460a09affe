//! Core business logic module
//!
//! This module contains the transaction processing components:
//! - `traits` - Backing store ports
//! - `balance_table` / `history_table` - In-memory stores with simulated latency
//! - `latency` - Latency profile for the in-memory stores
//! - `lock_table` - Per-user lock table
//! - `coordinator` - Per-user serialization of charge/use transactions
//! - `query` - Unsynchronized balance and history reads
//! - `batch_processor` - Batch dispatch of input requests onto the coordinator

pub mod balance_table;
pub mod batch_processor;
pub mod coordinator;
pub mod history_table;
pub mod latency;
pub mod lock_table;
pub mod query;
pub mod traits;

pub use balance_table::BalanceTable;
pub use batch_processor::{BatchProcessor, ProcessingMode, ProcessingResult};
pub use coordinator::{CoordinatorConfig, PointCoordinator};
pub use history_table::HistoryTable;
pub use latency::StoreLatency;
pub use lock_table::{UserLock, UserLockTable};
pub use query::PointQuery;
pub use traits::{BalanceStore, HistoryStore};
