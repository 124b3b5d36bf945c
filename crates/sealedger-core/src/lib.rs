//! # sealedger core
//!
//! Pure primitives for the sealedger: signed records, proof-of-work sealed
//! containers, and the digests that link them.
//!
//! This crate contains no file I/O. Key material is reached through the
//! [`IdentityKeys`] trait, which the store crate implements on disk.
//!
//! ## Key Types
//!
//! - [`Record`] - A signed, hashed unit of ledger data
//! - [`Container`] - Up to `capacity` records, sealed by proof-of-work once full
//! - [`Digest`] - Blake3 digest with difficulty checks
//! - [`Keypair`] / [`PublicKey`] - Ed25519 identity keys

pub mod canonical;
pub mod container;
pub mod crypto;
pub mod error;
pub mod record;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use container::{
    AppendOutcome, Container, SealPolicy, DEFAULT_CAPACITY, DEFAULT_DIFFICULTY, MAX_CAPACITY,
};
pub use crypto::{Digest, IdentityKeys, KeyAlgorithm, Keypair, PublicKey, Signature};
pub use error::{CoreError, Result};
pub use record::{Record, TAMPER_MARKER};
pub use types::{PreviousDigest, RecordId};
