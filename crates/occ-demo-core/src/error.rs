//! Error types for the demo core.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur while building or validating core values.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A configuration value was rejected.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An environment variable could not be parsed.
    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv {
        /// The variable name.
        name: &'static str,
        /// The raw value that failed to parse.
        value: String,
    },

    /// A resource identifier could not be formatted.
    #[error("invalid resource id: {0}")]
    InvalidResourceId(String),
}
