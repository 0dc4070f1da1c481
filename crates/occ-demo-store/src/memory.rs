//! In-memory store implementation.
//!
//! `MemoryStore` keeps encoded items in a map behind a mutex. The predicate check and
//! the write of `put_if` happen under a single lock acquisition, which gives it the
//! same atomicity as a conditional write at a remote store.
//!
//! To make races observable in-process, every operation can be delayed by a simulated
//! round trip before it touches the map, and transport failures can be injected.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use occ_demo_core::{Resource, ResourceKey};

use crate::codec::{decode, encode, Item};
use crate::error::{Result, StoreError};
use crate::schema::attr;
use crate::Store;

#[derive(Default)]
struct Inner {
    items: HashMap<ResourceKey, Item>,
    /// Counter values in the order they were committed, per key.
    history: HashMap<ResourceKey, Vec<u64>>,
}

/// In-process store for tests and local runs.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    latency: Duration,
    read_faults: AtomicU64,
    write_faults: AtomicU64,
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("latency", &self.latency)
            .field("read_faults", &self.read_faults.load(Ordering::Relaxed))
            .field("write_faults", &self.write_faults.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MemoryStore {
    /// Create an empty store with no simulated latency.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every operation by `latency` before it is applied.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Make the next `count` reads fail with a transport error.
    pub fn fail_next_reads(&self, count: u64) {
        self.read_faults.fetch_add(count, Ordering::SeqCst);
    }

    /// Make the next `count` writes (conditional or not) fail with a transport error.
    pub fn fail_next_writes(&self, count: u64) {
        self.write_faults.fetch_add(count, Ordering::SeqCst);
    }

    /// Store an item as-is, bypassing the codec.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the store lock is poisoned.
    pub fn insert_raw(&self, key: ResourceKey, item: Item) -> Result<()> {
        self.lock()?.items.insert(key, item);
        Ok(())
    }

    /// Counter values committed for `key`, in commit order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the store lock is poisoned.
    pub fn history(&self, key: &ResourceKey) -> Result<Vec<u64>> {
        Ok(self.lock()?.history.get(key).cloned().unwrap_or_default())
    }

    /// Number of keys currently stored.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the store lock is poisoned.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.items.len())
    }

    /// Whether the store holds no items.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Transport("memory store lock poisoned".into()))
    }

    async fn round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Consume one pending fault, if any.
    fn take_fault(faults: &AtomicU64) -> bool {
        faults
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }

    fn commit(inner: &mut Inner, resource: &Resource) {
        let key = resource.key();
        inner
            .history
            .entry(key.clone())
            .or_default()
            .push(resource.num_calls);
        inner.items.insert(key, encode(resource));
    }
}

/// Numeric value of the stored counter, if the item has a well-formed one.
fn stored_counter(item: &Item) -> Option<u64> {
    item.get(attr::NUM_CALLS)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

#[async_trait]
impl Store for MemoryStore {
    async fn get(&self, key: &ResourceKey) -> Result<Resource> {
        self.round_trip().await;
        if Self::take_fault(&self.read_faults) {
            return Err(StoreError::Transport("injected read failure".into()));
        }

        let item = self
            .lock()?
            .items
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        Ok(decode(&item)?)
    }

    async fn put_unconditional(&self, resource: &Resource) -> Result<()> {
        self.round_trip().await;
        if Self::take_fault(&self.write_faults) {
            return Err(StoreError::Transport("injected write failure".into()));
        }

        Self::commit(&mut *self.lock()?, resource);
        Ok(())
    }

    async fn put_if(&self, resource: &Resource, expected_num_calls: u64) -> Result<()> {
        self.round_trip().await;
        if Self::take_fault(&self.write_faults) {
            return Err(StoreError::Transport("injected write failure".into()));
        }

        let mut inner = self.lock()?;
        let current = inner.items.get(&resource.key()).and_then(stored_counter);
        if current != Some(expected_num_calls) {
            return Err(StoreError::Conflict {
                expected: expected_num_calls,
            });
        }

        Self::commit(&mut inner, resource);
        Ok(())
    }
}
