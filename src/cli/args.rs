use crate::core::{CoordinatorConfig, ProcessingMode, StoreLatency};
use crate::runner::RunConfig;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Apply point charge/use requests against a per-user ledger
#[derive(Parser, Debug)]
#[command(name = "points-engine")]
#[command(about = "Apply point charge/use requests against a per-user ledger", long_about = None)]
pub struct CliArgs {
    /// Input CSV file path containing point requests
    #[arg(value_name = "INPUT", help = "Path to the input CSV file (user,kind,amount[,timestamp])")]
    pub input_file: PathBuf,

    /// How requests within a batch are dispatched
    #[arg(
        long = "mode",
        value_name = "MODE",
        default_value = "ordered",
        help = "'ordered' keeps per-user file order; 'concurrent' lets same-user requests race for the user lock"
    )]
    pub mode: ProcessingMode,

    /// Number of requests per batch
    #[arg(
        long = "batch-size",
        value_name = "SIZE",
        help = "Number of requests per batch (default: 1000)"
    )]
    pub batch_size: Option<usize>,

    /// Tokio worker threads
    #[arg(
        long = "workers",
        value_name = "COUNT",
        help = "Number of worker threads (default: CPU cores)"
    )]
    pub workers: Option<usize>,

    /// Upper bound of the simulated balance read delay
    #[arg(long = "read-latency-ms", value_name = "MS", default_value_t = 200)]
    pub read_latency_ms: u64,

    /// Upper bound of the simulated balance write delay
    #[arg(long = "write-latency-ms", value_name = "MS", default_value_t = 300)]
    pub write_latency_ms: u64,

    /// Upper bound of the simulated history append delay
    #[arg(long = "append-latency-ms", value_name = "MS", default_value_t = 300)]
    pub append_latency_ms: u64,

    /// Give up waiting for a user's lock after this long (0 waits forever)
    #[arg(long = "lock-timeout-ms", value_name = "MS", default_value_t = 0)]
    pub lock_timeout_ms: u64,

    /// Also write the transaction history to this file
    #[arg(long = "history-output", value_name = "FILE")]
    pub history_output: Option<PathBuf>,
}

impl CliArgs {
    /// Build the pipeline configuration from CLI arguments
    ///
    /// Missing or zero sizes fall back to the defaults.
    pub fn to_run_config(&self) -> RunConfig {
        let default = RunConfig::default();

        RunConfig::new(
            self.batch_size.unwrap_or(default.batch_size),
            self.workers.unwrap_or(default.workers),
        )
        .with_mode(self.mode)
        .with_latency(StoreLatency::from_millis(
            self.read_latency_ms,
            self.write_latency_ms,
            self.append_latency_ms,
        ))
        .with_coordinator(CoordinatorConfig::with_lock_timeout(Duration::from_millis(
            self.lock_timeout_ms,
        )))
    }
}
