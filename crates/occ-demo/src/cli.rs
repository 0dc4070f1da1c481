//! Command-line surface.

use std::time::Duration;

use clap::Parser;
use occ_demo_core::{Backoff, DemoConfig, UpdateMode};

/// Race concurrent counter increments against a DynamoDB table.
///
/// With no arguments, runs the workers with unsafe read-modify-write updates.
#[derive(Debug, Parser)]
#[allow(clippy::struct_excessive_bools)]
#[command(name = "occ-demo", version)]
pub struct Cli {
    /// Load the table with generated records, then exit.
    #[arg(short = 'l', long = "load")]
    pub load: bool,

    /// Use a safe conditional write.
    #[arg(short = 's', long = "safe")]
    pub safe: bool,

    /// Create the table before loading if it does not exist.
    #[arg(long, requires = "load")]
    pub create_table: bool,

    /// Number of concurrent workers (overrides OCC_WORKERS).
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Committed writes each worker must reach (overrides OCC_WRITES_PER_WORKER).
    #[arg(short = 'm', long)]
    pub writes: Option<u64>,

    /// Base delay in milliseconds for jittered backoff after a failed attempt.
    #[arg(long)]
    pub backoff_ms: Option<u64>,

    /// Print the final report as JSON.
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// The update mode selected by `-s`.
    #[must_use]
    pub const fn mode(&self) -> UpdateMode {
        UpdateMode::from_safe_flag(self.safe)
    }

    /// Apply command-line overrides on top of `config`.
    pub fn apply(&self, config: &mut DemoConfig) {
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        if let Some(writes) = self.writes {
            config.writes_per_worker = writes;
        }
        match self.backoff_ms {
            Some(0) => config.backoff = Backoff::None,
            Some(ms) => config.backoff = Backoff::jittered(Duration::from_millis(ms)),
            None => {}
        }
    }
}
