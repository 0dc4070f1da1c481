//! Update modes and per-worker statistics.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize, Serializer};

/// How a worker commits its increment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Read-modify-write with an unconditional put. Loses updates under contention.
    #[default]
    Unsafe,

    /// Read-modify-write with a put conditioned on the counter value that was read.
    Safe,
}

impl UpdateMode {
    /// Select a mode from the `safe` flag.
    #[must_use]
    pub const fn from_safe_flag(safe: bool) -> Self {
        if safe {
            Self::Safe
        } else {
            Self::Unsafe
        }
    }

    /// Get the mode name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unsafe => "unsafe",
            Self::Safe => "safe",
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters accumulated by one worker over its lifetime.
///
/// A worker owns its stats exclusively until the driver collects them after join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkerStats {
    /// Spawn index of the worker.
    pub worker: usize,

    /// Committed increments.
    pub writes: u64,

    /// Attempts that failed at the read step.
    pub read_errors: u64,

    /// Attempts whose write was rejected or failed.
    pub write_errors: u64,

    /// Total attempts, `writes + read_errors + write_errors`.
    pub attempts: u64,

    /// Wall-clock time from worker start to completion.
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

impl WorkerStats {
    /// Create empty stats for the worker at `worker`.
    #[must_use]
    pub const fn new(worker: usize) -> Self {
        Self {
            worker,
            writes: 0,
            read_errors: 0,
            write_errors: 0,
            attempts: 0,
            elapsed: Duration::ZERO,
        }
    }

    /// Number of attempts that did not commit.
    #[must_use]
    pub const fn errors(&self) -> u64 {
        self.read_errors + self.write_errors
    }
}

impl fmt::Display for WorkerStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "routine {} writes: {} read errs: {} write errs: {} elapsed: {:?}",
            self.worker, self.writes, self.read_errors, self.write_errors, self.elapsed
        )
    }
}

#[allow(clippy::trivially_copy_pass_by_ref)]
fn serialize_millis<S: Serializer>(elapsed: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
}
