//! Error types for the updater, driver, and loader.

use occ_demo_core::CoreError;
use occ_demo_store::{CodecError, StoreError};

/// Errors that end an update attempt without producing an `Outcome`.
///
/// Only a codec failure does: a record that no longer decodes means the schema has
/// drifted, and retrying cannot fix it.
#[derive(Debug, thiserror::Error)]
pub enum UpdateError {
    /// The stored record did not decode.
    #[error("record decode failed: {0}")]
    Codec(#[from] CodecError),
}

/// Errors returned by the concurrent driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A worker read a record that did not decode.
    #[error("worker {worker} aborted: {source}")]
    Codec {
        /// Spawn index of the worker.
        worker: usize,
        /// The decode failure.
        source: CodecError,
    },

    /// A worker task panicked or was cancelled.
    #[error("worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    /// The run parameters were rejected.
    #[error(transparent)]
    Config(#[from] CoreError),
}

/// Errors returned by the loader.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// Writing a seed record failed.
    #[error("failed to load {resource_id}: {source}")]
    Store {
        /// The resource that could not be written.
        resource_id: String,
        /// The store failure.
        source: StoreError,
    },

    /// The seed range was invalid.
    #[error(transparent)]
    Config(#[from] CoreError),
}

/// Errors returned by a full demo run.
#[derive(Debug, thiserror::Error)]
pub enum DemoError {
    /// The record could not be read before the run, and retrying will not help.
    #[error("error reading the initial state: {0}")]
    InitialRead(#[source] StoreError),

    /// The driver did not complete.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// The record could not be read after the run.
    #[error("error reading the final state: {0}")]
    FinalRead(#[source] StoreError),
}
