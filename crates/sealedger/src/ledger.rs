//! The Ledger: an ordered sequence of containers.
//!
//! The ledger routes record insertion to its tail container, opens a new
//! container when the tail is full, persists after every mutation, and
//! answers integrity and history queries.
//!
//! All state sits behind one mutex. An insert holds it for its full
//! duration, including any proof-of-work the insert triggers, so sealing
//! never overlaps another mutation. Reads take the same lock and never
//! observe a container mid-seal.

use std::sync::{Arc, Mutex, MutexGuard};

use sealedger_core::{Container, PreviousDigest, Record, RecordId, SealPolicy};
use sealedger_store::{ContainerStore, FsContainerStore, KeyStore};

use crate::config::LedgerConfig;
use crate::error::{LedgerError, Result};

/// Where an inserted record landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertReceipt {
    pub record_id: RecordId,
    pub container_index: u64,
    /// Zero-based position inside the container.
    pub position: usize,
    /// Proof-of-work attempts, if this insert sealed the container.
    pub sealed: Option<u64>,
}

/// Integrity of one record and the container holding it.
///
/// The three checks are computed independently; none short-circuits another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckReport {
    pub record_id: RecordId,
    pub container_index: u64,
    /// Recomputed record digest equals the stored one.
    pub hash_valid: bool,
    /// Signature verifies under the sender's current public key.
    pub signature_valid: bool,
    /// Container digest meets the difficulty and matches its contents.
    pub container_valid: bool,
}

impl CheckReport {
    pub fn all_valid(&self) -> bool {
        self.hash_valid && self.signature_valid && self.container_valid
    }
}

/// What a reload found in storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadSummary {
    /// Containers read back from storage (0 when a genesis was seeded).
    pub containers_loaded: usize,
    pub records_loaded: usize,
}

/// Audit result for one container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerAudit {
    pub index: u64,
    pub records: usize,
    /// Holds `capacity` records.
    pub sealed: bool,
    /// Digest meets the difficulty and matches the contents.
    pub valid: bool,
    /// Digest matches the contents.
    pub consistent: bool,
    /// `previous_digest` equals a fresh recomputation of the predecessor's
    /// digest (or is the genesis marker for index 0).
    pub linked: bool,
}

impl ContainerAudit {
    /// Consistent, linked, and valid if sealed.
    pub fn is_clean(&self) -> bool {
        self.consistent && self.linked && (self.valid || !self.sealed)
    }
}

/// Ledger-wide audit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditReport {
    pub containers: Vec<ContainerAudit>,
}

impl AuditReport {
    pub fn is_clean(&self) -> bool {
        self.containers.iter().all(ContainerAudit::is_clean)
    }

    /// Containers that fail any check.
    pub fn problems(&self) -> impl Iterator<Item = &ContainerAudit> {
        self.containers.iter().filter(|c| !c.is_clean())
    }
}

/// The ledger.
pub struct Ledger<S: ContainerStore> {
    containers: Mutex<Vec<Container>>,
    store: S,
    keys: Arc<KeyStore>,
    policy: SealPolicy,
}

impl Ledger<FsContainerStore> {
    /// Open the on-disk ledger described by `config` and reload its history.
    ///
    /// Creates the container and key directories if they are missing.
    pub fn open(config: &LedgerConfig) -> Result<Self> {
        let policy = config.seal_policy()?;
        let store = FsContainerStore::open(config.blocks_dir())?;
        let keys = Arc::new(KeyStore::open(config.keys_dir(), config.key_algorithm)?);

        let ledger = Self::new(store, keys, policy);
        ledger.reload()?;
        Ok(ledger)
    }
}

impl<S: ContainerStore> Ledger<S> {
    /// Create an empty ledger. Call [`reload`](Self::reload) to read history.
    pub fn new(store: S, keys: Arc<KeyStore>, policy: SealPolicy) -> Self {
        Self {
            containers: Mutex::new(Vec::new()),
            store,
            keys,
            policy,
        }
    }

    pub fn keys(&self) -> &Arc<KeyStore> {
        &self.keys
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> SealPolicy {
        self.policy
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Container>>> {
        self.containers.lock().map_err(|_| LedgerError::LockPoisoned)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a container, linking it to the current tail.
    ///
    /// Returns the index assigned to it.
    pub fn append_container(&self, container: Container) -> Result<u64> {
        let mut containers = self.lock()?;
        Ok(append_linked(&mut containers, container))
    }

    /// Insert a record into the tail container, opening a new one if the
    /// tail is full, then persist the container that changed.
    ///
    /// The append happens on a staged copy that replaces the tail only once
    /// it is saved, so a failed save leaves memory as it was.
    pub fn insert(&self, record: Record) -> Result<InsertReceipt> {
        let record_id = *record.id();
        let mut containers = self.lock()?;

        let (mut staged, opens_new) = match containers.last() {
            Some(tail) if !tail.is_full() => (tail.clone(), false),
            _ => {
                let mut fresh = Container::new(self.policy);
                fresh.link(containers.len() as u64, next_link(&containers));
                (fresh, true)
            }
        };

        let outcome = staged.append(record)?;
        self.store.save(&staged)?;

        let container_index = staged.index();
        if opens_new {
            containers.push(staged);
        } else if let Some(tail) = containers.last_mut() {
            *tail = staged;
        }

        tracing::debug!(
            record = %record_id,
            container = container_index,
            position = outcome.position,
            "record inserted"
        );

        Ok(InsertReceipt {
            record_id,
            container_index,
            position: outcome.position,
            sealed: outcome.sealed,
        })
    }

    /// Create a record signed by `sender` and insert it.
    pub fn submit(
        &self,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<InsertReceipt> {
        let record = Record::create(self.keys.as_ref(), sender, receiver, payload)?;
        self.insert(record)
    }

    /// Replace the in-memory containers with the persisted history.
    ///
    /// Loads index 0, 1, ... until one is missing. With nothing stored, a
    /// single empty genesis container is seeded. Any storage or structural
    /// failure aborts the reload and leaves the current state untouched.
    pub fn reload(&self) -> Result<ReloadSummary> {
        let mut containers = self.lock()?;

        let mut loaded = Vec::new();
        while let Some(container) = self.store.load(loaded.len() as u64, self.policy)? {
            append_linked(&mut loaded, container);
        }

        let summary = ReloadSummary {
            containers_loaded: loaded.len(),
            records_loaded: loaded.iter().map(Container::len).sum(),
        };

        if loaded.is_empty() {
            append_linked(&mut loaded, Container::new(self.policy));
            tracing::info!("no persisted containers; seeded genesis container");
        } else {
            tracing::info!(
                containers = summary.containers_loaded,
                records = summary.records_loaded,
                "ledger reloaded"
            );
        }

        *containers = loaded;
        Ok(summary)
    }

    /// Corrupt the payload of a record in memory, for demonstrating detection.
    ///
    /// Returns `false` if no record has that id. The change is not persisted
    /// by itself; a later append to the same container writes it out.
    pub fn tamper(&self, id: &RecordId) -> Result<bool> {
        let mut containers = self.lock()?;
        for container in containers.iter_mut().rev() {
            if let Some(record) = container.find_record_mut(id) {
                record.tamper();
                tracing::info!(record = %id, container = container.index(), "record tampered");
                return Ok(true);
            }
        }
        Ok(false)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// Check a record's hash, signature, and containing container.
    ///
    /// Searches newest container first. Returns `None` if the id is unknown.
    pub fn check(&self, id: &RecordId) -> Result<Option<CheckReport>> {
        let containers = self.lock()?;
        for container in containers.iter().rev() {
            if let Some(record) = container.find_record(id) {
                let hash_valid = record.verify_hash();
                let signature_valid = record.verify_signature(self.keys.as_ref());
                let container_valid = container.is_valid();
                return Ok(Some(CheckReport {
                    record_id: *id,
                    container_index: container.index(),
                    hash_valid,
                    signature_valid,
                    container_valid,
                }));
            }
        }
        Ok(None)
    }

    /// Up to `n` records, most recent first.
    pub fn recent(&self, n: usize) -> Result<Vec<Record>> {
        let containers = self.lock()?;
        Ok(containers
            .iter()
            .rev()
            .flat_map(|c| c.records().iter().rev())
            .take(n)
            .cloned()
            .collect())
    }

    /// Walk every container and report seal, consistency, and link state.
    ///
    /// Read-only. [`check`](Self::check) does not consult link state.
    pub fn audit(&self) -> Result<AuditReport> {
        let containers = self.lock()?;
        let mut report = AuditReport::default();
        let mut expected_previous = PreviousDigest::Genesis;

        for container in containers.iter() {
            let fresh = container.compute_digest();
            let consistent = fresh == *container.digest();
            report.containers.push(ContainerAudit {
                index: container.index(),
                records: container.len(),
                sealed: container.is_full(),
                valid: consistent && container.digest().meets_difficulty(self.policy.difficulty()),
                consistent,
                linked: *container.previous() == expected_previous,
            });
            expected_previous = PreviousDigest::Digest(fresh);
        }

        Ok(report)
    }

    pub fn container_count(&self) -> Result<usize> {
        Ok(self.lock()?.len())
    }

    pub fn record_count(&self) -> Result<usize> {
        Ok(self.lock()?.iter().map(Container::len).sum())
    }

    /// A copy of every container, oldest first.
    pub fn snapshot(&self) -> Result<Vec<Container>> {
        Ok(self.lock()?.clone())
    }
}

impl<S: ContainerStore> std::fmt::Debug for Ledger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("policy", &self.policy)
            .field("keys", &self.keys)
            .finish_non_exhaustive()
    }
}

/// The link a container appended after `containers` receives.
fn next_link(containers: &[Container]) -> PreviousDigest {
    containers
        .last()
        .map_or(PreviousDigest::Genesis, |tail| {
            PreviousDigest::Digest(*tail.digest())
        })
}

/// Link `container` after the current tail (or as genesis) and push it.
fn append_linked(containers: &mut Vec<Container>, mut container: Container) -> u64 {
    let index = containers.len() as u64;
    container.link(index, next_link(containers));
    containers.push(container);
    index
}
