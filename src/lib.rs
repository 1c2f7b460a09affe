//! Rust Points Engine Library
//! # Overview
//!
//! This library keeps a per-user point ledger. Every user has one balance and
//! an append-only history of the charges and uses that shaped it. Requests for
//! the same user are applied strictly one at a time, in arrival order, while
//! requests for different users run in parallel.
//!
//! # Architecture
//!
//! - [`types`] - Core data types (Balance, LogEntry, PointError, etc.)
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::coordinator`] - Per-user serialized read-compute-write-append
//!   - [`core::lock_table`] - Lazily created FIFO lock per user
//!   - [`core::balance_table`] / [`core::history_table`] - In-memory stores with simulated latency
//!   - [`core::query`] - Lock-free read access
//!   - [`core::batch_processor`] - Dispatch of request batches onto tokio tasks
//! - [`strategy`] - Transaction kinds and their balance rules
//! - [`io`] - Streaming CSV input and CSV output
//! - [`runner`] - File-to-file pipeline used by the binary
//!
//! # Transaction Kinds
//!
//! - **Charge**: Add points; the balance may never exceed [`Balance::LIMIT`]
//! - **Use**: Spend points; the balance may never go negative
//!
//! Rejected requests leave both the balance and the history untouched.

// Module declarations
pub mod cli;
pub mod core;
pub mod io;
pub mod runner;
pub mod strategy;
pub mod types;

pub use core::{BalanceTable, HistoryTable, PointCoordinator, PointQuery, UserLockTable};
pub use io::{write_balances_csv, write_history_csv};
pub use runner::{PointRunner, RunConfig, RunSummary};
pub use strategy::{StrategyRegistry, TransactionStrategy};
pub use types::{
    Balance, LogEntry, PendingEntry, PointError, PointRequest, Points, SequenceId, Timestamp,
    TransactionKind, UserId,
};
