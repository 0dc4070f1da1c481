//! Table seeding.

use occ_demo_core::{DemoConfig, Resource, ResourceKey};
use occ_demo_store::Store;

use crate::error::LoadError;

/// Writes the initial records the workers race on.
#[derive(Debug, Clone)]
pub struct Loader<S> {
    store: S,
}

impl<S: Store> Loader<S> {
    /// Create a loader over a store.
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// Seed the range of keys described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Config` for an invalid range and `LoadError::Store` for the
    /// first write that fails.
    pub async fn load_config(&self, config: &DemoConfig) -> Result<Vec<ResourceKey>, LoadError> {
        let keys = config.seed_keys()?;
        self.load(&keys).await?;
        Ok(keys)
    }

    /// Write a fresh record (`available = false`, `status = "offline"`, `num_calls = 0`)
    /// for each key, overwriting whatever is stored.
    ///
    /// # Errors
    ///
    /// Returns `LoadError::Store` for the first write that fails; earlier writes stay.
    pub async fn load(&self, keys: &[ResourceKey]) -> Result<(), LoadError> {
        for key in keys {
            let resource = Resource::seed(key);
            self.store
                .put_unconditional(&resource)
                .await
                .map_err(|source| LoadError::Store {
                    resource_id: key.resource_id.clone(),
                    source,
                })?;
            tracing::info!(%key, "Successfully added resource to table");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occ_demo_store::{MemoryStore, StoreError};

    #[tokio::test]
    async fn load_config_seeds_default_range() {
        let store = MemoryStore::new();
        let loader = Loader::new(&store);
        let keys = loader.load_config(&DemoConfig::default()).await.unwrap();

        assert_eq!(keys.len(), 5);
        assert_eq!(store.len().unwrap(), 5);
        for key in &keys {
            assert_eq!(store.get(key).await.unwrap(), Resource::seed(key));
        }
    }

    #[tokio::test]
    async fn load_overwrites_counter() {
        let store = MemoryStore::new();
        let key = ResourceKey::new("100", "10001");
        let bumped = Resource {
            num_calls: 12,
            ..Resource::seed(&key)
        };
        store.put_unconditional(&bumped).await.unwrap();

        Loader::new(&store).load(&[key.clone()]).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap().num_calls, 0);
    }

    #[tokio::test]
    async fn load_stops_at_first_failure() {
        let store = MemoryStore::new();
        store.fail_next_writes(1);
        let result = Loader::new(&store).load_config(&DemoConfig::default()).await;

        match result {
            Err(LoadError::Store {
                resource_id,
                source: StoreError::Transport(_),
            }) => assert_eq!(resource_id, "100"),
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(store.is_empty().unwrap());
    }
}
