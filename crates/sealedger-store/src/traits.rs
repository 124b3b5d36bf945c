//! ContainerStore trait: the minimal interface for container persistence.

use std::sync::Arc;

use sealedger_core::{Container, SealPolicy};

use crate::error::Result;

/// Persistence for sealed and in-progress containers, keyed by index.
///
/// Implementations can be file-backed or in-memory. The ledger saves a
/// container after every mutation and loads containers back in ascending
/// index order until one is missing.
pub trait ContainerStore: Send + Sync {
    /// Write the container's text form, replacing any previous version.
    fn save(&self, container: &Container) -> Result<()>;

    /// Read back the container stored at `index`.
    ///
    /// Returns `Ok(None)` when nothing is stored there: the end of the
    /// persisted history, not an error.
    fn load(&self, index: u64, policy: SealPolicy) -> Result<Option<Container>>;
}

impl<S: ContainerStore + ?Sized> ContainerStore for Arc<S> {
    fn save(&self, container: &Container) -> Result<()> {
        (**self).save(container)
    }

    fn load(&self, index: u64, policy: SealPolicy) -> Result<Option<Container>> {
        (**self).load(index, policy)
    }
}
