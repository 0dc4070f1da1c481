//! The optimistic updater.
//!
//! One call to [`Updater::increment`] is one attempt: read the record, build the
//! successor with `num_calls + 1`, and write it back. In safe mode the write is
//! conditioned on the counter that was read, so a concurrent commit between the read
//! and the write makes the store reject it instead of silently overwriting it.
//!
//! The updater holds no state between attempts; retrying is the driver's job.

use occ_demo_core::{ResourceKey, UpdateMode};
use occ_demo_store::{Store, StoreError};

use crate::error::UpdateError;

/// Result of a single increment attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The store accepted the incremented record.
    Committed,

    /// The record could not be read (missing or transport failure).
    ReadFailed,

    /// The conditional write was rejected because the counter moved. Safe mode only.
    WriteRejected,

    /// The write failed for any other reason.
    WriteFailed,
}

impl Outcome {
    /// Whether this attempt advanced the counter.
    #[must_use]
    pub const fn is_committed(self) -> bool {
        matches!(self, Self::Committed)
    }
}

/// Performs read-modify-write increments against a store.
#[derive(Debug, Clone)]
pub struct Updater<S> {
    store: S,
}

impl<S: Store> Updater<S> {
    /// Create an updater over a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Attempt one increment of `num_calls` for `key`.
    ///
    /// # Errors
    ///
    /// Returns `UpdateError::Codec` if the stored record does not decode. Every other
    /// failure is reported through the returned `Outcome`.
    pub async fn increment(
        &self,
        key: &ResourceKey,
        mode: UpdateMode,
    ) -> Result<Outcome, UpdateError> {
        let current = match self.store.get(key).await {
            Ok(resource) => resource,
            Err(StoreError::Codec(e)) => return Err(UpdateError::Codec(e)),
            Err(e) => {
                tracing::warn!(%key, error = %e, "Error reading the resource");
                return Ok(Outcome::ReadFailed);
            }
        };

        let Some(next) = current.incremented() else {
            tracing::warn!(%key, "num_calls is at its maximum");
            return Ok(Outcome::WriteFailed);
        };

        // The predicate must carry the counter that was read, not the one being written.
        let result = match mode {
            UpdateMode::Unsafe => self.store.put_unconditional(&next).await,
            UpdateMode::Safe => self.store.put_if(&next, current.num_calls).await,
        };

        let outcome = match result {
            Ok(()) => Outcome::Committed,
            Err(StoreError::Conflict { expected }) => {
                tracing::debug!(%key, expected, "Conditional write rejected");
                Outcome::WriteRejected
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Error writing the resource");
                Outcome::WriteFailed
            }
        };

        Ok(outcome)
    }
}
