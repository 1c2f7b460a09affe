//! Rust Points Engine CLI
//!
//! Command-line interface for applying point charge/use requests from CSV files.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- requests.csv > balances.csv
//! cargo run -- --mode concurrent requests.csv > balances.csv
//! cargo run -- --read-latency-ms 0 --write-latency-ms 0 --append-latency-ms 0 requests.csv
//! cargo run -- --history-output history.csv --lock-timeout-ms 5000 requests.csv
//! ```
//!
//! The program reads point requests from the input CSV file, applies them
//! through the per-user coordinator, and prints the final balances to stdout.
//! Diagnostics go to stderr; set `RUST_LOG` to change their verbosity.
//!
//! # Exit Codes
//!
//! - 0: Success (individual rejected requests do not fail the run)
//! - 1: Error (missing arguments, file not found, unwritable output, etc.)

use rust_points_engine::cli;
use rust_points_engine::runner::PointRunner;
use std::fs::File;
use std::io::Write;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    let runner = PointRunner::new(args.to_run_config());

    let mut history_file = match args.history_output.as_deref().map(File::create).transpose() {
        Ok(file) => file,
        Err(e) => {
            error!(error = %e, "cannot create history output file");
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    let mut output = std::io::stdout();
    let history_output = history_file.as_mut().map(|file| file as &mut dyn Write);

    if let Err(e) = runner.run(&args.input_file, &mut output, history_output) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
