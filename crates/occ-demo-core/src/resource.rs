//! Resource records.
//!
//! A `Resource` is the only entity in the demo. It is addressed by the compound key
//! (`resource_id`, `account_id`) and carries the `num_calls` counter that workers race
//! to increment.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Status assigned to freshly seeded resources.
pub const STATUS_OFFLINE: &str = "offline";

/// The compound primary key of a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    /// Partition component.
    pub resource_id: String,

    /// Sort component.
    pub account_id: String,
}

impl ResourceKey {
    /// Create a key from its two components.
    #[must_use]
    pub fn new(resource_id: impl Into<String>, account_id: impl Into<String>) -> Self {
        Self {
            resource_id: resource_id.into(),
            account_id: account_id.into(),
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.resource_id, self.account_id)
    }
}

/// A resource record, something like an agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    /// Partition key component.
    pub resource_id: String,

    /// Sort key component.
    pub account_id: String,

    /// Whether the resource is available.
    pub available: bool,

    /// Short status string (e.g. "offline").
    pub status: String,

    /// The counter mutated by the updater.
    pub num_calls: u64,
}

impl Resource {
    /// Build the initial record the loader writes for a key.
    #[must_use]
    pub fn seed(key: &ResourceKey) -> Self {
        Self {
            resource_id: key.resource_id.clone(),
            account_id: key.account_id.clone(),
            available: false,
            status: STATUS_OFFLINE.to_string(),
            num_calls: 0,
        }
    }

    /// Return the compound key of this record.
    #[must_use]
    pub fn key(&self) -> ResourceKey {
        ResourceKey::new(self.resource_id.clone(), self.account_id.clone())
    }

    /// Return a copy of this record with `num_calls` advanced by one.
    ///
    /// Returns `None` if the counter is already at `u64::MAX`.
    #[must_use]
    pub fn incremented(&self) -> Option<Self> {
        let num_calls = self.num_calls.checked_add(1)?;
        Some(Self {
            num_calls,
            ..self.clone()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_record_is_offline_with_zero_calls() {
        let key = ResourceKey::new("100", "10001");
        let resource = Resource::seed(&key);

        assert_eq!(resource.key(), key);
        assert!(!resource.available);
        assert_eq!(resource.status, STATUS_OFFLINE);
        assert_eq!(resource.num_calls, 0);
    }

    #[test]
    fn incremented_only_touches_counter() {
        let mut resource = Resource::seed(&ResourceKey::new("100", "10001"));
        resource.available = true;
        resource.status = "online".into();
        resource.num_calls = 41;

        let next = resource.incremented().unwrap();
        assert_eq!(next.num_calls, 42);
        assert_eq!(
            Resource {
                num_calls: 41,
                ..next
            },
            resource
        );
    }

    #[test]
    fn incremented_at_max_is_none() {
        let mut resource = Resource::seed(&ResourceKey::new("100", "10001"));
        resource.num_calls = u64::MAX;
        assert!(resource.incremented().is_none());
    }

    #[test]
    fn key_display() {
        assert_eq!(ResourceKey::new("100", "10001").to_string(), "(100, 10001)");
    }

    #[test]
    fn resource_json_field_names() {
        let resource = Resource::seed(&ResourceKey::new("100", "10001"));
        let value = serde_json::to_value(&resource).unwrap();
        assert_eq!(value["resource_id"], "100");
        assert_eq!(value["account_id"], "10001");
        assert_eq!(value["num_calls"], 0);
    }
}
