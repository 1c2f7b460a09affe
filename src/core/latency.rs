//! Simulated store latency
//!
//! The in-memory tables sleep for a random duration in `[0, max]` before each
//! call, mimicking a real I/O round trip.

use rand::Rng;
use std::time::Duration;

/// Upper bounds on the random delay of each store call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreLatency {
    /// Balance reads and history listings
    pub read: Duration,
    /// Balance writes
    pub write: Duration,
    /// History appends
    pub append: Duration,
}

impl Default for StoreLatency {
    fn default() -> Self {
        Self {
            read: Duration::from_millis(200),
            write: Duration::from_millis(300),
            append: Duration::from_millis(300),
        }
    }
}

impl StoreLatency {
    /// Create a latency profile from millisecond bounds
    pub fn from_millis(read: u64, write: u64, append: u64) -> Self {
        Self {
            read: Duration::from_millis(read),
            write: Duration::from_millis(write),
            append: Duration::from_millis(append),
        }
    }

    /// No simulated delay at all
    pub fn none() -> Self {
        Self::uniform(Duration::ZERO)
    }

    /// The same bound for every call
    pub fn uniform(max: Duration) -> Self {
        Self {
            read: max,
            write: max,
            append: max,
        }
    }
}

/// Sleep for a random duration in `[0, max]`
pub async fn throttle(max: Duration) {
    if max.is_zero() {
        return;
    }

    // The thread-local rng is not Send, so it must be gone before the await
    let delay = {
        let upper = max.as_micros().min(u64::MAX as u128) as u64;
        Duration::from_micros(rand::thread_rng().gen_range(0..=upper))
    };

    tokio::time::sleep(delay).await;
}
