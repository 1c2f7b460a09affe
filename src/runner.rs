//! CSV-to-ledger processing pipeline
//!
//! The `PointRunner` wires the in-memory stores, the coordinator and the
//! batch processor together, streams requests from a CSV file and writes the
//! final balances (and optionally the full history) as CSV.
//!
//! # Architecture
//!
//! ```text
//! PointRunner
//!     ├── RunConfig (batch size, workers, mode, latency, lock timeout)
//!     ├── AsyncReader (batch CSV reading)
//!     ├── BatchProcessor (ordered or concurrent dispatch)
//!     └── PointCoordinator (per-user serialization)
//!         ├── BalanceTable
//!         └── HistoryTable
//! ```
//!
//! Batches are processed one after another, so a user's requests that span
//! several batches are still applied in file order in `Ordered` mode.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use tracing::{info, warn};

use crate::core::{
    BalanceTable, BatchProcessor, CoordinatorConfig, HistoryTable, PointCoordinator,
    ProcessingMode, ProcessingResult, StoreLatency,
};
use crate::io::{write_balances_csv, write_history_csv, AsyncReader};
use crate::types::PointError;

/// Pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Number of requests read and dispatched per batch
    pub batch_size: usize,
    /// Tokio worker threads
    pub workers: usize,
    /// How each batch is spread over tasks
    pub mode: ProcessingMode,
    /// Simulated store latency
    pub latency: StoreLatency,
    /// Coordinator tuning (lock timeout)
    pub coordinator: CoordinatorConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            batch_size: 1000,
            workers: num_cpus::get(),
            mode: ProcessingMode::default(),
            latency: StoreLatency::default(),
            coordinator: CoordinatorConfig::default(),
        }
    }
}

impl RunConfig {
    /// Create a RunConfig, falling back to defaults for zero sizes
    pub fn new(batch_size: usize, workers: usize) -> Self {
        let default = Self::default();

        let batch_size = if batch_size == 0 {
            warn!(batch_size, default = default.batch_size, "invalid batch size, using default");
            default.batch_size
        } else {
            batch_size
        };

        let workers = if workers == 0 {
            warn!(workers, default = default.workers, "invalid worker count, using default");
            default.workers
        } else {
            workers
        };

        Self {
            batch_size,
            workers,
            ..default
        }
    }

    pub fn with_mode(mut self, mode: ProcessingMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_latency(mut self, latency: StoreLatency) -> Self {
        self.latency = latency;
        self
    }

    pub fn with_coordinator(mut self, coordinator: CoordinatorConfig) -> Self {
        self.coordinator = coordinator;
        self
    }
}

/// Outcome counts of one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Requests read from input
    pub processed: usize,
    /// Requests that were applied (including zero-amount uses)
    pub applied: usize,
    /// Requests refused by validation
    pub rejected: usize,
    /// Requests that hit a fault (store error, lock timeout)
    pub failed: usize,
    /// Input rows skipped because they could not be parsed
    pub malformed: usize,
}

impl RunSummary {
    fn record(&mut self, results: &[ProcessingResult]) {
        for outcome in results {
            self.processed += 1;
            match &outcome.result {
                Ok(_) => self.applied += 1,
                Err(e) if e.is_rejection() => self.rejected += 1,
                Err(_) => self.failed += 1,
            }
        }
    }
}

/// End-to-end CSV processing pipeline
#[derive(Debug, Clone)]
pub struct PointRunner {
    config: RunConfig,
}

impl PointRunner {
    pub fn new(config: RunConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Process the requests in `input_path` and write the final balances to `output`
    ///
    /// When `history_output` is given, the full history is written there too.
    ///
    /// # Errors
    ///
    /// Fatal errors only: the input cannot be opened, the runtime cannot be
    /// built, or output cannot be written. Individual request failures are
    /// logged and counted in the summary.
    pub fn run(
        &self,
        input_path: &Path,
        output: &mut dyn Write,
        history_output: Option<&mut dyn Write>,
    ) -> Result<RunSummary, PointError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(self.config.workers)
            .enable_all()
            .build()?;

        runtime.block_on(async {
            let balances = Arc::new(BalanceTable::new(self.config.latency));
            let history = Arc::new(HistoryTable::new(self.config.latency));
            let coordinator = PointCoordinator::with_registry(
                Arc::clone(&balances),
                Arc::clone(&history),
                Arc::default(),
                self.config.coordinator,
            );
            let processor = BatchProcessor::new(coordinator);

            let file = tokio::fs::File::open(input_path).await.map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    PointError::FileNotFound {
                        path: input_path.display().to_string(),
                    }
                } else {
                    PointError::from(e)
                }
            })?;

            let compat_file = tokio_util::compat::TokioAsyncReadCompatExt::compat(file);
            let mut reader = AsyncReader::new(compat_file);
            let mut summary = RunSummary::default();

            loop {
                let batch = reader.read_batch(self.config.batch_size).await;
                if batch.is_empty() {
                    break;
                }

                let results = processor.process_batch(batch, self.config.mode).await;
                summary.record(&results);
            }
            summary.malformed = reader.malformed_rows().len();

            info!(
                processed = summary.processed,
                applied = summary.applied,
                rejected = summary.rejected,
                failed = summary.failed,
                malformed = summary.malformed,
                "input processed"
            );

            write_balances_csv(&balances.snapshot(), output)?;
            if let Some(history_output) = history_output {
                write_history_csv(&history.snapshot(), history_output)?;
            }

            Ok::<_, PointError>(summary)
        })
    }
}
