//! Demo configuration.
//!
//! Replaces the fixed table name, account id, and key under test with an explicit
//! record that is handed to the loader and the driver.

use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::resource::ResourceKey;

// ============================================================================
// Constants
// ============================================================================

/// Default table name.
pub const DEFAULT_TABLE_NAME: &str = "resources";

/// Default account id shared by every seeded resource.
pub const DEFAULT_ACCOUNT_ID: &str = "10001";

/// Default resource id the workers race on.
pub const DEFAULT_RESOURCE_ID: &str = "100";

/// Default number of concurrent workers.
pub const DEFAULT_WORKERS: usize = 5;

/// Default number of committed writes each worker must reach.
pub const DEFAULT_WRITES_PER_WORKER: u64 = 10;

/// First resource id written by the loader.
pub const DEFAULT_SEED_FIRST_RESOURCE_ID: u64 = 100;

/// Number of resources written by the loader.
pub const DEFAULT_SEED_COUNT: u64 = 5;

/// Pause policy between a failed attempt and the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Backoff {
    /// Retry immediately.
    #[default]
    None,

    /// Sleep a random duration in `[0, min(max, base * 2^k)]`, where `k` counts
    /// consecutive failed attempts.
    Jittered {
        /// Initial ceiling.
        base: Duration,
        /// Upper bound on the ceiling.
        max: Duration,
    },
}

impl Backoff {
    /// Build a jittered policy from a base delay, capping the ceiling at 32 times the base.
    #[must_use]
    pub fn jittered(base: Duration) -> Self {
        Self::Jittered {
            base,
            max: base.saturating_mul(32),
        }
    }

    /// Upper bound of the sleep after `consecutive_failures` failed attempts in a row.
    ///
    /// Returns `None` when no pause should be taken.
    #[must_use]
    pub fn ceiling(&self, consecutive_failures: u32) -> Option<Duration> {
        match *self {
            Self::None => None,
            Self::Jittered { base, max } => {
                if consecutive_failures == 0 || base.is_zero() {
                    return None;
                }
                let shift = (consecutive_failures - 1).min(16);
                Some(base.saturating_mul(1 << shift).min(max))
            }
        }
    }
}

/// Configuration for the loader and the concurrent driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Store table name (default: "resources").
    pub table_name: String,

    /// Account id of every seeded record (default: "10001").
    pub account_id: String,

    /// Resource id the workers target (default: "100").
    pub resource_id: String,

    /// Number of concurrent workers (default: 5).
    pub workers: usize,

    /// Committed writes each worker must accumulate (default: 10).
    pub writes_per_worker: u64,

    /// First resource id written by the loader (default: 100).
    pub seed_first_resource_id: u64,

    /// Number of records written by the loader (default: 5).
    pub seed_count: u64,

    /// Pause policy after rejected or failed attempts.
    pub backoff: Backoff,
}

impl DemoConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Recognised variables: `OCC_TABLE`, `OCC_ACCOUNT_ID`, `OCC_RESOURCE_ID`,
    /// `OCC_WORKERS`, `OCC_WRITES_PER_WORKER`, `OCC_BACKOFF_MS`.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidEnv` if a numeric variable does not parse.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let backoff = match parse_env::<u64>("OCC_BACKOFF_MS")? {
            Some(0) | None => Backoff::None,
            Some(ms) => Backoff::jittered(Duration::from_millis(ms)),
        };

        let config = Self {
            table_name: std::env::var("OCC_TABLE").unwrap_or(defaults.table_name),
            account_id: std::env::var("OCC_ACCOUNT_ID").unwrap_or(defaults.account_id),
            resource_id: std::env::var("OCC_RESOURCE_ID").unwrap_or(defaults.resource_id),
            workers: parse_env("OCC_WORKERS")?.unwrap_or(defaults.workers),
            writes_per_worker: parse_env("OCC_WRITES_PER_WORKER")?
                .unwrap_or(defaults.writes_per_worker),
            seed_first_resource_id: defaults.seed_first_resource_id,
            seed_count: defaults.seed_count,
            backoff,
        };

        tracing::debug!(?config, "Demo configuration loaded");
        Ok(config)
    }

    /// Check that the configuration can drive a run.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Configuration` for an empty table name or key component,
    /// zero workers, or zero writes per worker.
    pub fn validate(&self) -> Result<()> {
        if self.table_name.is_empty() {
            return Err(CoreError::Configuration("table name is empty".into()));
        }
        if self.account_id.is_empty() || self.resource_id.is_empty() {
            return Err(CoreError::Configuration("key components must be non-empty".into()));
        }
        if self.workers == 0 {
            return Err(CoreError::Configuration("workers must be at least 1".into()));
        }
        if self.writes_per_worker == 0 {
            return Err(CoreError::Configuration(
                "writes per worker must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// The key the workers race on.
    #[must_use]
    pub fn target_key(&self) -> ResourceKey {
        ResourceKey::new(self.resource_id.clone(), self.account_id.clone())
    }

    /// The contiguous range of keys written by the loader.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidResourceId` if the range overflows.
    pub fn seed_keys(&self) -> Result<Vec<ResourceKey>> {
        (0..self.seed_count)
            .map(|offset| {
                self.seed_first_resource_id
                    .checked_add(offset)
                    .map(|id| ResourceKey::new(id.to_string(), self.account_id.clone()))
                    .ok_or_else(|| {
                        CoreError::InvalidResourceId(format!(
                            "{} + {offset}",
                            self.seed_first_resource_id
                        ))
                    })
            })
            .collect()
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            table_name: DEFAULT_TABLE_NAME.into(),
            account_id: DEFAULT_ACCOUNT_ID.into(),
            resource_id: DEFAULT_RESOURCE_ID.into(),
            workers: DEFAULT_WORKERS,
            writes_per_worker: DEFAULT_WRITES_PER_WORKER,
            seed_first_resource_id: DEFAULT_SEED_FIRST_RESOURCE_ID,
            seed_count: DEFAULT_SEED_COUNT,
            backoff: Backoff::None,
        }
    }
}

/// Read and parse an optional environment variable.
fn parse_env<T: FromStr>(name: &'static str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| CoreError::InvalidEnv { name, value }),
        Err(_) => Ok(None),
    }
}
