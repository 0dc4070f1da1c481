//! A full run: read the starting counter, race the workers, read the final record.

use occ_demo_core::{DemoConfig, UpdateMode};
use occ_demo_store::Store;

use crate::driver::Driver;
use crate::error::DemoError;
use crate::report::FinalReport;

/// Run the configured workers against `store` and report the final state.
///
/// A retryable failure of the initial read is logged and leaves the expected value
/// unknown; the workers still run and keep retrying until the record appears.
///
/// # Errors
///
/// - `DemoError::InitialRead` if the record exists but does not decode.
///
/// - `DemoError::Driver` if the configuration is invalid or a worker hits a record that
///   does not decode.
/// - `DemoError::FinalRead` if the record cannot be read after the run.
pub async fn run_demo<S: Store + 'static>(
    store: S,
    config: &DemoConfig,
    mode: UpdateMode,
) -> Result<FinalReport, DemoError> {
    let key = config.target_key();

    let initial = match store.get(&key).await {
        Ok(resource) => Some(resource.num_calls),
        Err(e) if !e.is_retryable() => return Err(DemoError::InitialRead(e)),
        Err(e) => {
            tracing::warn!(%key, error = %e, "Could not read the initial state");
            None
        }
    };

    let driver = Driver::new(store);
    let workers = driver.run_config(config, mode).await?;

    let resource = driver
        .store()
        .get(&key)
        .await
        .map_err(DemoError::FinalRead)?;

    Ok(FinalReport::new(mode, workers, resource, initial))
}
