//! Table schema definitions.
//!
//! ```text
//! Table: resources (configurable)
//!
//! Primary Key:
//!   - resource_id: String (Partition Key)
//!   - account_id:  String (Sort Key)
//!
//! Attributes:
//!   - available: Boolean
//!   - status:    String (e.g. "offline")
//!   - num_calls: Number, the counter guarded by conditional writes
//! ```

/// Attribute names used in the resources table.
pub mod attr {
    /// Partition key.
    pub const RESOURCE_ID: &str = "resource_id";

    /// Sort key.
    pub const ACCOUNT_ID: &str = "account_id";

    /// Availability flag.
    pub const AVAILABLE: &str = "available";

    /// Status string. `status` is a DynamoDB reserved word, so expressions
    /// must go through `ExpressionAttributeNames`.
    pub const STATUS: &str = "status";

    /// The counter.
    pub const NUM_CALLS: &str = "num_calls";
}

/// Expression placeholders for the conditional put.
pub mod expr {
    /// Name placeholder bound to `num_calls`.
    pub const NUM_CALLS_NAME: &str = "#nc";

    /// Value placeholder bound to the pre-mutation counter.
    pub const EXPECTED_VALUE: &str = ":expected";

    /// Condition: the stored counter still equals the counter that was read.
    pub const NUM_CALLS_UNCHANGED: &str = "#nc = :expected";
}
