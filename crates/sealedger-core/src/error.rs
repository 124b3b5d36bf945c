//! Error types for sealedger core.

use thiserror::Error;

/// Core errors that can occur while building, decoding, or signing ledger data.
///
/// Verification failures (bad hash, bad signature, bad seal) are not errors:
/// they are reported as booleans by the verification methods.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("malformed container: {0}")]
    MalformedContainer(String),

    #[error("container {index} is full (capacity {capacity})")]
    ContainerFull { index: u64, capacity: usize },

    #[error("key material for {identity:?} is unusable: {reason}")]
    KeyIo { identity: String, reason: String },

    #[error("invalid identity: {0:?}")]
    InvalidIdentity(String),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
