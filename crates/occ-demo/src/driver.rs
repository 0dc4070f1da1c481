//! The concurrent driver.
//!
//! Spawns `W` workers that race on the same key. Each worker loops update attempts
//! until it has accumulated `M` commits, counting failed reads and failed or rejected
//! writes along the way. Workers never give up on their own: only a record that does
//! not decode stops a run.
//!
//! ```text
//!         ┌──────── Committed ─────────┐
//! start → RUNNING ─── ReadFailed ──→ RUNNING  (read_errors++)
//!         │       └── WriteRejected ─→ RUNNING (write_errors++)
//!         │       └── WriteFailed ───→ RUNNING (write_errors++)
//!         └── writes == M ──→ DONE
//! ```

use std::sync::Arc;
use std::time::Duration;

use occ_demo_core::{Backoff, CoreError, DemoConfig, ResourceKey, UpdateMode, WorkerStats};
use occ_demo_store::Store;
use rand::Rng;
use tokio::task::JoinSet;
use tokio::time::Instant;

use crate::error::{DriverError, UpdateError};
use crate::updater::{Outcome, Updater};

/// Fans out workers over a shared updater and joins them.
#[derive(Debug)]
pub struct Driver<S> {
    updater: Arc<Updater<S>>,
    backoff: Backoff,
}

impl<S: Store + 'static> Driver<S> {
    /// Create a driver that retries immediately after a failed attempt.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            updater: Arc::new(Updater::new(store)),
            backoff: Backoff::None,
        }
    }

    /// Use `backoff` between a failed attempt and the next one.
    #[must_use]
    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        self.updater.store()
    }

    /// The pause policy used by [`Driver::run`].
    #[must_use]
    pub const fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Run with the key, worker count, target, and backoff taken from `config`.
    ///
    /// `config.backoff` applies to this run only; the driver's own policy is left as is.
    ///
    /// # Errors
    ///
    /// See [`Driver::run`]; additionally fails if `config` does not validate.
    pub async fn run_config(
        &self,
        config: &DemoConfig,
        mode: UpdateMode,
    ) -> Result<Vec<WorkerStats>, DriverError> {
        config.validate()?;
        self.spawn_workers(
            &config.target_key(),
            config.workers,
            config.writes_per_worker,
            mode,
            config.backoff,
        )
        .await
    }

    /// Run `workers` workers, each until it has committed `writes_per_worker` increments.
    ///
    /// Stats are returned in spawn order. Dropping the returned future aborts every
    /// worker still running.
    ///
    /// # Errors
    ///
    /// - `DriverError::Config` if `workers` or `writes_per_worker` is zero.
    /// - `DriverError::Codec` if any worker reads a record that does not decode; the
    ///   remaining workers are aborted.
    /// - `DriverError::Join` if a worker task panics.
    pub async fn run(
        &self,
        key: &ResourceKey,
        workers: usize,
        writes_per_worker: u64,
        mode: UpdateMode,
    ) -> Result<Vec<WorkerStats>, DriverError> {
        self.spawn_workers(key, workers, writes_per_worker, mode, self.backoff)
            .await
    }

    async fn spawn_workers(
        &self,
        key: &ResourceKey,
        workers: usize,
        writes_per_worker: u64,
        mode: UpdateMode,
        backoff: Backoff,
    ) -> Result<Vec<WorkerStats>, DriverError> {
        if workers == 0 || writes_per_worker == 0 {
            return Err(CoreError::Configuration(
                "workers and writes per worker must be at least 1".into(),
            )
            .into());
        }

        tracing::info!(%key, workers, writes_per_worker, %mode, ?backoff, "Starting workers");

        let mut tasks = JoinSet::new();
        for worker in 0..workers {
            let updater = Arc::clone(&self.updater);
            let key = key.clone();
            tasks.spawn(async move {
                run_worker(&updater, worker, &key, writes_per_worker, mode, backoff).await
            });
        }

        let mut slots: Vec<Option<WorkerStats>> = vec![None; workers];
        while let Some(joined) = tasks.join_next().await {
            let stats = joined??;
            let worker = stats.worker;
            slots[worker] = Some(stats);
        }

        Ok(slots.into_iter().flatten().collect())
    }
}

/// One worker: loop attempts until `target` commits.
async fn run_worker<S: Store>(
    updater: &Updater<S>,
    worker: usize,
    key: &ResourceKey,
    target: u64,
    mode: UpdateMode,
    backoff: Backoff,
) -> Result<WorkerStats, DriverError> {
    let started = Instant::now();
    let mut stats = WorkerStats::new(worker);
    let mut consecutive_failures: u32 = 0;

    while stats.writes < target {
        let outcome = match updater.increment(key, mode).await {
            Ok(outcome) => outcome,
            Err(UpdateError::Codec(source)) => {
                tracing::error!(worker, %key, error = %source, "Failed to decode record");
                return Err(DriverError::Codec { worker, source });
            }
        };
        stats.attempts += 1;

        if outcome.is_committed() {
            stats.writes += 1;
            consecutive_failures = 0;
            continue;
        }
        if outcome == Outcome::ReadFailed {
            stats.read_errors += 1;
        } else {
            stats.write_errors += 1;
        }

        consecutive_failures = consecutive_failures.saturating_add(1);
        pause(backoff, consecutive_failures).await;
    }

    stats.elapsed = started.elapsed();
    tracing::info!(
        worker,
        writes = stats.writes,
        read_errors = stats.read_errors,
        write_errors = stats.write_errors,
        elapsed = ?stats.elapsed,
        "Worker finished"
    );
    Ok(stats)
}

/// Sleep according to the backoff policy, or yield so a failing worker cannot starve
/// the other tasks on its thread.
async fn pause(backoff: Backoff, consecutive_failures: u32) {
    match backoff.ceiling(consecutive_failures) {
        Some(ceiling) => {
            let delay = rand::thread_rng().gen_range(Duration::ZERO..=ceiling);
            tokio::time::sleep(delay).await;
        }
        None => tokio::task::yield_now().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occ_demo_core::Resource;
    use occ_demo_store::MemoryStore;

    fn key() -> ResourceKey {
        ResourceKey::new("100", "10001")
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .put_unconditional(&Resource::seed(&key()))
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn single_worker_reaches_target() {
        let driver = Driver::new(seeded_store().await);
        let stats = driver.run(&key(), 1, 10, UpdateMode::Safe).await.unwrap();

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].writes, 10);
        assert_eq!(stats[0].attempts, 10);
        assert_eq!(driver.store().get(&key()).await.unwrap().num_calls, 10);
    }

    #[tokio::test]
    async fn stats_are_in_spawn_order() {
        let driver = Driver::new(seeded_store().await);
        let stats = driver.run(&key(), 4, 3, UpdateMode::Safe).await.unwrap();
        let order: Vec<_> = stats.iter().map(|s| s.worker).collect();
        assert_eq!(order, [0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn zero_workers_is_rejected() {
        let driver = Driver::new(seeded_store().await);
        let result = driver.run(&key(), 0, 10, UpdateMode::Safe).await;
        assert!(matches!(result, Err(DriverError::Config(_))));
    }

    #[tokio::test]
    async fn run_config_uses_configured_key() {
        let config = DemoConfig {
            workers: 2,
            writes_per_worker: 3,
            ..DemoConfig::default()
        };
        let driver = Driver::new(seeded_store().await);
        let stats = driver.run_config(&config, UpdateMode::Safe).await.unwrap();
        assert_eq!(stats.len(), 2);
        assert_eq!(driver.store().get(&key()).await.unwrap().num_calls, 6);
    }

    #[tokio::test(start_paused = true)]
    async fn jittered_backoff_still_converges() {
        let store = MemoryStore::new().with_latency(Duration::from_millis(2));
        store
            .put_unconditional(&Resource::seed(&key()))
            .await
            .unwrap();
        let driver =
            Driver::new(store).with_backoff(Backoff::jittered(Duration::from_millis(1)));

        let stats = driver.run(&key(), 3, 5, UpdateMode::Safe).await.unwrap();
        assert!(stats.iter().all(|s| s.writes == 5));
        assert_eq!(driver.store().get(&key()).await.unwrap().num_calls, 15);
    }

    #[tokio::test(start_paused = true)]
    async fn run_config_keeps_driver_backoff() {
        let jitter = Backoff::jittered(Duration::from_millis(3));
        let driver = Driver::new(seeded_store().await).with_backoff(jitter);
        let config = DemoConfig {
            workers: 1,
            writes_per_worker: 1,
            ..DemoConfig::default()
        };
        assert_eq!(config.backoff, Backoff::None);

        driver.run_config(&config, UpdateMode::Safe).await.unwrap();
        assert_eq!(driver.backoff(), jitter);

        // The driver's own policy still drives plain runs afterwards.
        let stats = driver.run(&key(), 2, 2, UpdateMode::Safe).await.unwrap();
        assert!(stats.iter().all(|s| s.writes == 2));
        assert_eq!(driver.store().get(&key()).await.unwrap().num_calls, 5);
    }
}
