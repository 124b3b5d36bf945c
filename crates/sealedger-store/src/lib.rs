//! # sealedger store
//!
//! Persistence for the sealedger: per-identity signing keys and containers.
//!
//! ## Key Types
//!
//! - [`KeyStore`] - Create-or-load Ed25519 keys, one PEM file per identity
//! - [`ContainerStore`] - Trait for saving and loading containers by index
//! - [`FsContainerStore`] - One `<index>.block` file per container
//! - [`MemoryContainerStore`] - In-memory store for tests
//!
//! ## Design Notes
//!
//! - **Not found is not an error**: `load` returns `Ok(None)` past the end
//!   of the persisted history
//! - **Atomic writes**: files are written to a temp sibling and renamed
//! - **Keys are never rotated**: a corrupt key file is an error, never
//!   silently regenerated

pub mod error;
pub mod fs;
pub mod keys;
pub mod memory;
pub mod traits;

pub use error::{Result, StoreError};
pub use fs::{FsContainerStore, CONTAINER_EXTENSION};
pub use keys::{KeyStore, KEY_EXTENSION};
pub use memory::MemoryContainerStore;
pub use traits::ContainerStore;
