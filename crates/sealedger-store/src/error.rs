//! Error types for the store module.

use sealedger_core::CoreError;
use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key material exists but cannot be read or decoded.
    #[error("key material for {identity:?} is unusable: {reason}")]
    KeyIo { identity: String, reason: String },

    /// Identity cannot be used as a key file name.
    #[error("invalid identity: {0:?}")]
    InvalidIdentity(String),

    /// Stored data failed a structural check.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A stored container claims a different index than its file name.
    #[error("container file {expected} holds index {found}")]
    IndexMismatch { expected: u64, found: u64 },

    /// An internal lock was poisoned by a panicking thread.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl From<StoreError> for CoreError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Core(inner) => inner,
            StoreError::KeyIo { identity, reason } => CoreError::KeyIo { identity, reason },
            StoreError::InvalidIdentity(identity) => CoreError::InvalidIdentity(identity),
            other => CoreError::KeyIo {
                identity: String::new(),
                reason: other.to_string(),
            },
        }
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
