//! Concurrent driver integration tests against the in-memory store.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{assert_accounting, num_calls, seeded_store, store_starting_at, target_key};
use occ_demo::{Driver, DriverError, Loader};
use occ_demo_core::{DemoConfig, Resource, UpdateMode};
use occ_demo_store::{codec, schema::attr, MemoryStore, Store};

const RTT: Duration = Duration::from_millis(5);

// ============================================================================
// Seeding
// ============================================================================

#[tokio::test]
async fn seed_then_read() {
    let store = seeded_store(Duration::ZERO).await;

    assert_eq!(num_calls(&store).await, 0);
    for key in DemoConfig::default().seed_keys().unwrap() {
        assert_eq!(store.get(&key).await.unwrap(), Resource::seed(&key));
    }
}

#[tokio::test]
async fn loading_twice_matches_loading_once() {
    let once = seeded_store(Duration::ZERO).await;
    let twice = seeded_store(Duration::ZERO).await;
    Loader::new(Arc::clone(&twice))
        .load_config(&DemoConfig::default())
        .await
        .unwrap();

    assert_eq!(once.len().unwrap(), twice.len().unwrap());
    for key in DemoConfig::default().seed_keys().unwrap() {
        assert_eq!(
            once.get(&key).await.unwrap(),
            twice.get(&key).await.unwrap()
        );
    }
}

// ============================================================================
// Safe mode
// ============================================================================

#[tokio::test]
async fn single_worker_safe() {
    let store = seeded_store(Duration::ZERO).await;
    let driver = Driver::new(Arc::clone(&store));

    let stats = driver
        .run(&target_key(), 1, 10, UpdateMode::Safe)
        .await
        .unwrap();

    assert_accounting(&stats, 1, 10);
    assert_eq!(stats[0].errors(), 0);
    assert_eq!(num_calls(&store).await, 10);
}

#[tokio::test(start_paused = true)]
async fn multi_worker_safe_counts_every_commit() {
    let store = seeded_store(RTT).await;
    let driver = Driver::new(Arc::clone(&store));

    let stats = driver
        .run(&target_key(), 5, 10, UpdateMode::Safe)
        .await
        .unwrap();

    assert_accounting(&stats, 5, 10);
    assert_eq!(stats.iter().map(|s| s.writes).sum::<u64>(), 50);
    assert!(
        stats.iter().any(|s| s.write_errors > 0),
        "lockstep workers must collide"
    );
    assert_eq!(num_calls(&store).await, 50);

    // Every commit costs a read and a write round trip.
    let floor = RTT * 2 * 10;
    for worker in &stats {
        assert!(
            worker.elapsed >= floor,
            "worker {} took {:?}, less than {floor:?}",
            worker.worker,
            worker.elapsed
        );
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn multi_worker_safe_on_parallel_threads() {
    let store = seeded_store(Duration::ZERO).await;
    let driver = Driver::new(Arc::clone(&store));

    let stats = driver
        .run(&target_key(), 8, 25, UpdateMode::Safe)
        .await
        .unwrap();

    assert_accounting(&stats, 8, 25);
    assert_eq!(num_calls(&store).await, 200);
}

#[tokio::test(start_paused = true)]
async fn safe_final_value_is_initial_plus_commits() {
    for (workers, writes, initial) in [(1, 1, 0), (3, 4, 7), (6, 2, 100)] {
        let store = store_starting_at(initial, RTT).await;
        let driver = Driver::new(Arc::clone(&store));

        let stats = driver
            .run(&target_key(), workers, writes, UpdateMode::Safe)
            .await
            .unwrap();

        assert_accounting(&stats, workers, writes);
        assert_eq!(num_calls(&store).await, initial + workers as u64 * writes);
    }
}

#[tokio::test(start_paused = true)]
async fn safe_commits_are_monotonic_and_gapless() {
    let store = seeded_store(RTT).await;
    let driver = Driver::new(Arc::clone(&store));
    driver
        .run(&target_key(), 4, 5, UpdateMode::Safe)
        .await
        .unwrap();

    // The seed write followed by one commit per increment.
    let history = store.history(&target_key()).unwrap();
    let expected: Vec<u64> = (0..=20).collect();
    assert_eq!(history, expected);
}

// ============================================================================
// Unsafe mode
// ============================================================================

#[tokio::test(start_paused = true)]
async fn multi_worker_unsafe_loses_updates() {
    let store = seeded_store(RTT).await;
    let driver = Driver::new(Arc::clone(&store));

    let stats = driver
        .run(&target_key(), 5, 10, UpdateMode::Unsafe)
        .await
        .unwrap();

    assert_accounting(&stats, 5, 10);
    assert!(stats.iter().all(|s| s.errors() == 0));

    let final_calls = num_calls(&store).await;
    assert!(final_calls > 0);
    assert!(final_calls < 50, "expected lost updates, got {final_calls}");

    // Every commit was accepted, but more commits happened than the counter shows.
    let commits = store.history(&target_key()).unwrap().len() - 1;
    assert_eq!(commits, 50);
    assert!(commits as u64 > final_calls);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn unsafe_stays_within_bounds_on_parallel_threads() {
    let mut observed_loss = false;

    for _ in 0..20 {
        let store = seeded_store(Duration::from_millis(1)).await;
        let driver = Driver::new(Arc::clone(&store));
        let stats = driver
            .run(&target_key(), 5, 10, UpdateMode::Unsafe)
            .await
            .unwrap();
        assert_accounting(&stats, 5, 10);

        let final_calls = num_calls(&store).await;
        assert!((1..=50).contains(&final_calls));
        if final_calls < 50 {
            observed_loss = true;
            break;
        }
    }

    assert!(observed_loss, "no lost update observed in 20 runs");
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test(start_paused = true)]
async fn transient_write_failure_is_retried() {
    for mode in [UpdateMode::Safe, UpdateMode::Unsafe] {
        let store = seeded_store(Duration::from_millis(1)).await;
        store.fail_next_writes(3);
        let driver = Driver::new(Arc::clone(&store));

        // A lone worker never conflicts, so every write error is an injected fault.
        let stats = driver.run(&target_key(), 1, 5, mode).await.unwrap();

        assert_accounting(&stats, 1, 5);
        assert_eq!(stats[0].write_errors, 3, "{mode}");
        assert_eq!(stats[0].read_errors, 0, "{mode}");
        assert_eq!(stats[0].attempts, 8, "{mode}");
        assert_eq!(num_calls(&store).await, 5, "{mode}");
    }
}

#[tokio::test(start_paused = true)]
async fn transient_write_failures_do_not_break_contention() {
    let store = seeded_store(Duration::from_millis(1)).await;
    store.fail_next_writes(5);
    let driver = Driver::new(Arc::clone(&store));

    let stats = driver
        .run(&target_key(), 5, 10, UpdateMode::Safe)
        .await
        .unwrap();

    assert_accounting(&stats, 5, 10);
    assert!(stats.iter().map(|s| s.write_errors).sum::<u64>() >= 5);
    assert_eq!(num_calls(&store).await, 50);
}

#[tokio::test(start_paused = true)]
async fn transient_read_failure_is_retried() {
    let store = seeded_store(Duration::from_millis(1)).await;
    store.fail_next_reads(3);
    let driver = Driver::new(Arc::clone(&store));

    let stats = driver
        .run(&target_key(), 3, 4, UpdateMode::Safe)
        .await
        .unwrap();

    assert_accounting(&stats, 3, 4);
    assert_eq!(stats.iter().map(|s| s.read_errors).sum::<u64>(), 3);
    assert_eq!(num_calls(&store).await, 12);
}

#[tokio::test(start_paused = true)]
async fn missing_seed_makes_no_progress() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(1)));
    let driver = Driver::new(Arc::clone(&store));

    let result = tokio::time::timeout(
        Duration::from_secs(1),
        driver.run(&target_key(), 5, 10, UpdateMode::Safe),
    )
    .await;

    assert!(result.is_err(), "driver finished without a seeded record");
    assert!(store.is_empty().unwrap());
    assert!(store.history(&target_key()).unwrap().is_empty());
}

#[tokio::test(start_paused = true)]
async fn late_seed_lets_workers_finish() {
    let store = Arc::new(MemoryStore::new().with_latency(Duration::from_millis(1)));
    let driver = Driver::new(Arc::clone(&store));

    let run = tokio::spawn(async move {
        driver
            .run(&target_key(), 3, 5, UpdateMode::Safe)
            .await
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    Loader::new(Arc::clone(&store))
        .load(&[target_key()])
        .await
        .unwrap();

    let stats = run.await.unwrap().unwrap();
    assert_accounting(&stats, 3, 5);
    assert!(stats.iter().all(|s| s.read_errors > 0));
    assert_eq!(num_calls(&store).await, 15);
}

#[tokio::test]
async fn malformed_record_aborts_run() {
    let store = Arc::new(MemoryStore::new());
    let mut item = codec::encode(&Resource::seed(&target_key()));
    item.remove(attr::STATUS);
    store.insert_raw(target_key(), item).unwrap();
    let driver = Driver::new(Arc::clone(&store));

    let result = driver.run(&target_key(), 3, 10, UpdateMode::Safe).await;
    assert!(matches!(result, Err(DriverError::Codec { .. })));
}
