//! Error types for the component-test driver.

use thiserror::Error;

use crate::BusError;

/// Main error type for test-session operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Could not connect to the session bus
    #[error("Bus connection failed: {0}")]
    BusConnection(String),

    /// A required service could not be resolved at construction
    #[error("Service unavailable: {address}: {source}")]
    ServiceUnavailable {
        /// Address that failed to resolve
        address: String,
        /// Underlying bus error
        source: BusError,
    },

    /// A lifecycle call was attempted before the launcher was found on the bus
    #[error("Launcher has not been discovered on the bus")]
    LauncherNotDiscovered,

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
