//! Error types for the ledger.

use sealedger_core::CoreError;
use sealedger_store::StoreError;
use thiserror::Error;

/// Errors that can occur during ledger operations.
///
/// Tampering is never an error: it shows up as `false` in a
/// [`CheckReport`](crate::CheckReport) or [`AuditReport`](crate::AuditReport).
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Structural or key error from the core types.
    #[error("core error: {0}")]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// The ledger lock was poisoned by a panicking thread.
    #[error("ledger lock poisoned")]
    LockPoisoned,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A background task failed to complete.
    #[error("background task failed: {0}")]
    Task(String),
}

/// Result type for ledger operations.
pub type Result<T> = std::result::Result<T, LedgerError>;
