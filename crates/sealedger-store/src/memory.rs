//! In-memory implementation of the ContainerStore trait.
//!
//! This is primarily for testing. Containers are kept in their persisted
//! text form, so loads go through the same decoding as the file store.

use std::collections::BTreeMap;
use std::sync::RwLock;

use sealedger_core::{Container, SealPolicy};

use crate::error::{Result, StoreError};
use crate::traits::ContainerStore;

/// In-memory container store. All data is lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryContainerStore {
    texts: RwLock<BTreeMap<u64, String>>,
}

impl MemoryContainerStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored text for `index`, if any.
    pub fn raw(&self, index: u64) -> Option<String> {
        self.texts.read().ok()?.get(&index).cloned()
    }

    /// Replace the stored text for `index`, bypassing encoding.
    pub fn put_raw(&self, index: u64, text: impl Into<String>) -> Result<()> {
        self.texts
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?
            .insert(index, text.into());
        Ok(())
    }

    /// Number of stored containers.
    pub fn len(&self) -> usize {
        self.texts.read().map(|t| t.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContainerStore for MemoryContainerStore {
    fn save(&self, container: &Container) -> Result<()> {
        self.put_raw(container.index(), container.to_text())
    }

    fn load(&self, index: u64, policy: SealPolicy) -> Result<Option<Container>> {
        let text = {
            let texts = self
                .texts
                .read()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            match texts.get(&index) {
                Some(text) => text.clone(),
                None => return Ok(None),
            }
        };

        let container = Container::from_text(&text, policy)?;
        if container.index() != index {
            return Err(StoreError::IndexMismatch {
                expected: index,
                found: container.index(),
            });
        }
        Ok(Some(container))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sealedger_core::{KeyAlgorithm, Record};

    use crate::keys::KeyStore;

    #[test]
    fn test_roundtrip_and_missing() {
        let store = MemoryContainerStore::new();
        let keys = KeyStore::in_memory(KeyAlgorithm::Ed25519);
        let mut container = Container::new(SealPolicy::default());
        container
            .append(Record::create(&keys, "Alice", "Bob", "1 pizzas").unwrap())
            .unwrap();

        assert!(store.load(0, SealPolicy::default()).unwrap().is_none());
        store.save(&container).unwrap();
        assert_eq!(store.len(), 1);

        let loaded = store.load(0, SealPolicy::default()).unwrap().unwrap();
        assert_eq!(loaded, container);
        assert_eq!(store.raw(0).unwrap(), container.to_text());
    }

    #[test]
    fn test_put_raw_garbage_fails_load() {
        let store = MemoryContainerStore::new();
        store.put_raw(0, "garbage").unwrap();
        assert!(store.load(0, SealPolicy::default()).is_err());
    }
}
