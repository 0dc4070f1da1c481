//! Error types for the store adapter.

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record exists for the key.
    #[error("not found: {0}")]
    NotFound(String),

    /// The conditional write predicate was false.
    #[error("conditional check failed: expected num_calls={expected}")]
    Conflict {
        /// The counter value the write was conditioned on.
        expected: u64,
    },

    /// Network, timeout, or service-side failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// A stored record could not be decoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),
}

impl StoreError {
    /// Whether another attempt may succeed.
    ///
    /// Everything except a codec failure is retryable; a record that does not decode
    /// indicates schema corruption.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        !matches!(self, Self::Codec(_))
    }
}

/// Errors decoding a record from its attribute map.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A required attribute is absent.
    #[error("missing attribute: {0}")]
    MissingAttribute(&'static str),

    /// An attribute holds a value of the wrong type.
    #[error("attribute {name} has wrong type, expected {expected}")]
    WrongType {
        /// The attribute name.
        name: &'static str,
        /// The expected attribute type.
        expected: &'static str,
    },

    /// A numeric attribute does not parse as a non-negative integer.
    #[error("attribute {name} is not a valid counter: {value:?}")]
    InvalidNumber {
        /// The attribute name.
        name: &'static str,
        /// The raw numeric string.
        value: String,
    },
}
