//! Store adapter for the optimistic concurrency demo.
//!
//! This crate provides the thin abstraction over the remote key-value store that the
//! updater relies on, the record codec, and two backends:
//!
//! - `DynamoStore`: Amazon DynamoDB (or any endpoint speaking its protocol)
//! - `MemoryStore`: in-process store with simulated latency and fault injection
//!
//! # Atomicity
//!
//! `put_if` checks the predicate and applies the write as one step at the store.
//! The predicate is always expressed over the counter value that was *read*, never
//! over the incremented value being written.
//!
//! # Example
//!
//! ```no_run
//! use occ_demo_core::{Resource, ResourceKey};
//! use occ_demo_store::{MemoryStore, Store};
//!
//! # async fn demo() -> occ_demo_store::Result<()> {
//! let store = MemoryStore::new();
//! let key = ResourceKey::new("100", "10001");
//! store.put_unconditional(&Resource::seed(&key)).await?;
//!
//! let current = store.get(&key).await?;
//! if let Some(next) = current.incremented() {
//!     store.put_if(&next, current.num_calls).await?;
//! }
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod codec;
pub mod dynamo;
pub mod error;
pub mod memory;
pub mod schema;

pub use codec::Item;
pub use dynamo::{DynamoDbConfig, DynamoStore};
pub use error::{CodecError, Result, StoreError};
pub use memory::MemoryStore;

use std::sync::Arc;

use async_trait::async_trait;
use occ_demo_core::{Resource, ResourceKey};

/// The storage trait the updater and loader are written against.
///
/// This trait abstracts the remote store, allowing for different implementations
/// (e.g., DynamoDB, in-memory for testing).
#[async_trait]
pub trait Store: Send + Sync {
    /// Read the current record for a key.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no record exists.
    /// - `StoreError::Transport` on network or service failure.
    /// - `StoreError::Codec` if the stored item does not decode.
    async fn get(&self, key: &ResourceKey) -> Result<Resource>;

    /// Replace the record unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` on network or service failure.
    async fn put_unconditional(&self, resource: &Resource) -> Result<()>;

    /// Replace the record only if the stored `num_calls` equals `expected_num_calls`.
    ///
    /// # Errors
    ///
    /// - `StoreError::Conflict` if the stored counter differs (or no record exists).
    /// - `StoreError::Transport` on network or service failure.
    async fn put_if(&self, resource: &Resource, expected_num_calls: u64) -> Result<()>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for &S {
    async fn get(&self, key: &ResourceKey) -> Result<Resource> {
        (**self).get(key).await
    }

    async fn put_unconditional(&self, resource: &Resource) -> Result<()> {
        (**self).put_unconditional(resource).await
    }

    async fn put_if(&self, resource: &Resource, expected_num_calls: u64) -> Result<()> {
        (**self).put_if(resource, expected_num_calls).await
    }
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn get(&self, key: &ResourceKey) -> Result<Resource> {
        (**self).get(key).await
    }

    async fn put_unconditional(&self, resource: &Resource) -> Result<()> {
        (**self).put_unconditional(resource).await
    }

    async fn put_if(&self, resource: &Resource, expected_num_calls: u64) -> Result<()> {
        (**self).put_if(resource, expected_num_calls).await
    }
}
