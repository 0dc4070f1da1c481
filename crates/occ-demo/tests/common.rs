//! Common test utilities for driver integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use occ_demo::Loader;
use occ_demo_core::{DemoConfig, ResourceKey, WorkerStats};
use occ_demo_store::{MemoryStore, Store};

/// The key every scenario races on.
pub fn target_key() -> ResourceKey {
    DemoConfig::default().target_key()
}

/// A store with the default seed range loaded.
pub async fn seeded_store(latency: Duration) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new().with_latency(latency));
    Loader::new(Arc::clone(&store))
        .load_config(&DemoConfig::default())
        .await
        .expect("Failed to seed store");
    store
}

/// A seeded store whose target counter starts at `initial`.
pub async fn store_starting_at(initial: u64, latency: Duration) -> Arc<MemoryStore> {
    let store = seeded_store(latency).await;
    let mut resource = store.get(&target_key()).await.expect("seeded record");
    resource.num_calls = initial;
    store
        .put_unconditional(&resource)
        .await
        .expect("Failed to set initial counter");
    store
}

/// Current counter of the target record.
pub async fn num_calls(store: &MemoryStore) -> u64 {
    store
        .get(&target_key())
        .await
        .expect("Failed to read target")
        .num_calls
}

/// Every worker reached the target and its attempts add up.
pub fn assert_accounting(stats: &[WorkerStats], workers: usize, writes_per_worker: u64) {
    assert_eq!(stats.len(), workers);
    for (index, worker) in stats.iter().enumerate() {
        assert_eq!(worker.worker, index, "stats out of spawn order");
        assert_eq!(worker.writes, writes_per_worker);
        assert_eq!(
            worker.attempts,
            worker.writes + worker.read_errors + worker.write_errors
        );
    }
}
