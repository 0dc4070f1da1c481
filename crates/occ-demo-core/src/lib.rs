//! Core types for the optimistic concurrency demo.
//!
//! This crate provides the types shared by the store adapter and the driver:
//!
//! - **Records**: `Resource`, `ResourceKey`
//! - **Modes**: `UpdateMode` (unsafe read-modify-write vs. safe conditional write)
//! - **Statistics**: `WorkerStats`
//! - **Configuration**: `DemoConfig`, `Backoff`
//!
//! # Counter semantics
//!
//! Every record carries a `num_calls` counter. Workers race to increment the same
//! record; in safe mode each increment is committed only if the stored counter
//! still equals the value the worker read.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod error;
pub mod resource;
pub mod stats;

pub use config::{
    Backoff, DemoConfig, DEFAULT_ACCOUNT_ID, DEFAULT_RESOURCE_ID, DEFAULT_SEED_COUNT,
    DEFAULT_SEED_FIRST_RESOURCE_ID, DEFAULT_TABLE_NAME, DEFAULT_WORKERS,
    DEFAULT_WRITES_PER_WORKER,
};
pub use error::{CoreError, Result};
pub use resource::{Resource, ResourceKey, STATUS_OFFLINE};
pub use stats::{UpdateMode, WorkerStats};
