//! Test fixtures and helpers.
//!
//! Common setup code for ledger tests.

use std::sync::Arc;

use tempfile::TempDir;

use sealedger::{InsertReceipt, Ledger, LedgerConfig};
use sealedger_core::{Digest, IdentityKeys, KeyAlgorithm, Keypair, Result, SealPolicy};
use sealedger_store::{FsContainerStore, KeyStore, MemoryContainerStore};

/// Keys derived from `blake3(namespace || "/" || identity)`.
///
/// Two instances with the same namespace hand out the same keys, which makes
/// signatures reproducible across test runs.
#[derive(Debug, Clone)]
pub struct DerivedKeys {
    namespace: String,
}

impl DerivedKeys {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
        }
    }
}

impl Default for DerivedKeys {
    fn default() -> Self {
        Self::new("sealedger-test")
    }
}

impl IdentityKeys for DerivedKeys {
    fn keypair(&self, identity: &str) -> Result<Keypair> {
        let seed = Digest::hash(format!("{}/{identity}", self.namespace).as_bytes());
        Ok(Keypair::from_seed(seed.as_bytes()))
    }
}

/// An in-memory ledger with handles to its store and keys.
pub struct TestLedger {
    pub ledger: Arc<Ledger<Arc<MemoryContainerStore>>>,
    pub store: Arc<MemoryContainerStore>,
    pub keys: Arc<KeyStore>,
}

impl TestLedger {
    /// A reloaded, empty ledger with the default policy.
    pub fn new() -> Self {
        Self::with_policy(SealPolicy::default())
    }

    /// A reloaded, empty ledger with a custom policy.
    ///
    /// # Panics
    ///
    /// Panics if the initial reload fails, which an empty memory store never does.
    pub fn with_policy(policy: SealPolicy) -> Self {
        let store = Arc::new(MemoryContainerStore::new());
        let keys = Arc::new(KeyStore::in_memory(KeyAlgorithm::Ed25519));
        let ledger = Ledger::new(Arc::clone(&store), Arc::clone(&keys), policy);
        ledger.reload().expect("reload of empty memory store");
        Self {
            ledger: Arc::new(ledger),
            store,
            keys,
        }
    }

    /// Submit `count` records from `sender` to `receiver` with numbered payloads.
    pub fn fill(&self, count: usize, sender: &str, receiver: &str) -> Vec<InsertReceipt> {
        (0..count)
            .map(|i| {
                self.ledger
                    .submit(sender, receiver, format!("{i} pieces"))
                    .expect("submit")
            })
            .collect()
    }

    /// A second ledger over the same store and keys, freshly reloaded.
    pub fn reopen(&self) -> Ledger<Arc<MemoryContainerStore>> {
        let ledger = Ledger::new(
            Arc::clone(&self.store),
            Arc::clone(&self.keys),
            self.ledger.policy(),
        );
        ledger.reload().expect("reload");
        ledger
    }
}

impl Default for TestLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// A ledger rooted in a temporary directory, removed on drop.
pub struct DiskLedger {
    pub dir: TempDir,
    pub config: LedgerConfig,
}

impl DiskLedger {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("tempdir");
        let config = LedgerConfig::new(dir.path());
        Self { dir, config }
    }

    /// Open (or reopen) the ledger in this directory.
    pub fn open(&self) -> Ledger<FsContainerStore> {
        Ledger::open(&self.config).expect("open ledger")
    }
}

impl Default for DiskLedger {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity names for multi-party tests: `user-0`, `user-1`, ...
pub fn identities(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("user-{i}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_keys_are_stable() {
        let a = DerivedKeys::default();
        let b = DerivedKeys::default();
        assert_eq!(
            a.public_key("Alice").unwrap(),
            b.public_key("Alice").unwrap()
        );
        assert_ne!(
            a.public_key("Alice").unwrap(),
            DerivedKeys::new("other").public_key("Alice").unwrap()
        );
    }

    #[test]
    fn test_fill_and_reopen() {
        let fixture = TestLedger::new();
        let receipts = fixture.fill(12, "Alice", "Bob");

        assert_eq!(receipts.len(), 12);
        assert_eq!(receipts[11].container_index, 1);
        assert_eq!(fixture.store.len(), 2);

        let reopened = fixture.reopen();
        assert_eq!(reopened.record_count().unwrap(), 12);
    }

    #[test]
    fn test_disk_ledger_creates_layout() {
        let disk = DiskLedger::new();
        let ledger = disk.open();
        ledger.submit("Alice", "Bob", "1 pizzas").unwrap();

        assert!(disk.dir.path().join("blocks/0.block").exists());
        assert!(disk.dir.path().join("senders/Alice.pem").exists());
        assert!(!disk.dir.path().join("senders/Bob.pem").exists());
    }

    #[test]
    fn test_identities() {
        assert_eq!(identities(2), vec!["user-0", "user-1"]);
    }
}
