//! Container: an ordered, capacity-bounded group of records.
//!
//! A container's digest covers its header and every record it holds. While
//! it has room the digest is simply recomputed after each append; the append
//! that fills it triggers a proof-of-work search for a nonce whose digest
//! starts with `difficulty` zero hex characters.
//!
//! ## Text format
//!
//! ```text
//! <index>
//! <previous digest, or "0" for genesis>
//! <created_at, unix milliseconds>
//! <digest hex>
//! <nonce>
//! <record json>
//! ...
//! ```

use std::fmt;

use crate::canonical::{container_body, container_digest};
use crate::crypto::Digest;
use crate::error::{CoreError, Result};
use crate::record::Record;
use crate::types::{PreviousDigest, RecordId};

/// Default number of records per container.
pub const DEFAULT_CAPACITY: usize = 10;

/// Default number of leading zero hex characters a sealed digest needs.
pub const DEFAULT_DIFFICULTY: usize = 2;

/// Hex characters in a digest; the upper bound for difficulty.
pub const MAX_DIFFICULTY: usize = 64;

/// Largest accepted container capacity.
pub const MAX_CAPACITY: usize = 100_000;

/// Capacity and proof-of-work difficulty shared by every container of a ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SealPolicy {
    capacity: usize,
    difficulty: usize,
}

impl SealPolicy {
    /// Create a policy. Capacity must be in `1..=MAX_CAPACITY` and
    /// difficulty at most 64.
    pub fn new(capacity: usize, difficulty: usize) -> Result<Self> {
        if capacity == 0 || capacity > MAX_CAPACITY {
            return Err(CoreError::MalformedContainer(format!(
                "capacity {capacity} outside 1..={MAX_CAPACITY}"
            )));
        }
        if difficulty > MAX_DIFFICULTY {
            return Err(CoreError::MalformedContainer(format!(
                "difficulty {difficulty} exceeds {MAX_DIFFICULTY}"
            )));
        }
        Ok(Self {
            capacity,
            difficulty,
        })
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }
}

impl Default for SealPolicy {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

/// Result of appending a record to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppendOutcome {
    /// Zero-based position of the record inside the container.
    pub position: usize,
    /// Proof-of-work attempts, if this append filled and sealed the container.
    pub sealed: Option<u64>,
}

/// A group of records sealed by proof-of-work once full.
#[derive(Clone, PartialEq, Eq)]
pub struct Container {
    index: u64,
    previous: PreviousDigest,
    created_at: i64,
    records: Vec<Record>,
    digest: Digest,
    nonce: u64,
    policy: SealPolicy,
}

impl Container {
    /// Create an empty genesis-linked container stamped with the current time.
    pub fn new(policy: SealPolicy) -> Self {
        Self::with_timestamp(policy, now_millis())
    }

    /// Create an empty container with an explicit creation time.
    pub fn with_timestamp(policy: SealPolicy, created_at: i64) -> Self {
        let mut container = Self {
            index: 0,
            previous: PreviousDigest::Genesis,
            created_at,
            records: Vec::new(),
            digest: Digest([0u8; 32]),
            nonce: 0,
            policy,
        };
        container.digest = container.compute_digest();
        container
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn previous(&self) -> &PreviousDigest {
        &self.previous
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    /// The stored digest (not recomputed).
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    pub fn policy(&self) -> &SealPolicy {
        &self.policy
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether the container holds `capacity` records.
    pub fn is_full(&self) -> bool {
        self.records.len() >= self.policy.capacity
    }

    /// Place this container in a ledger.
    ///
    /// The digest of an empty container is recomputed so it reflects its new
    /// position; a non-empty one keeps its stored digest.
    pub fn link(&mut self, index: u64, previous: PreviousDigest) {
        self.index = index;
        self.previous = previous;
        if self.records.is_empty() {
            self.digest = self.compute_digest();
        }
    }

    /// Recompute the digest from the current header fields and records.
    pub fn compute_digest(&self) -> Digest {
        self.digest_with_nonce(self.nonce, &self.body())
    }

    fn body(&self) -> Vec<u8> {
        let texts: Vec<String> = self.records.iter().map(Record::to_text).collect();
        container_body(texts.iter().map(String::as_str))
    }

    fn digest_with_nonce(&self, nonce: u64, body: &[u8]) -> Digest {
        container_digest(self.index, &self.previous, self.created_at, nonce, body)
    }

    /// Append a record, recompute the digest, and seal if now full.
    pub fn append(&mut self, record: Record) -> Result<AppendOutcome> {
        if self.is_full() {
            return Err(CoreError::ContainerFull {
                index: self.index,
                capacity: self.policy.capacity,
            });
        }

        self.records.push(record);
        self.digest = self.compute_digest();

        let position = self.records.len() - 1;
        let sealed = if self.is_full() { Some(self.seal()) } else { None };
        Ok(AppendOutcome { position, sealed })
    }

    /// Proof-of-work: bump the nonce until the digest meets the difficulty.
    ///
    /// Starts from the current digest, so an already-satisfying digest costs
    /// zero attempts. Returns the number of attempts.
    pub fn seal(&mut self) -> u64 {
        let body = self.body();
        let difficulty = self.policy.difficulty;
        let mut attempts = 0u64;

        while !self.digest.meets_difficulty(difficulty) {
            self.nonce = self.nonce.wrapping_add(1);
            self.digest = self.digest_with_nonce(self.nonce, &body);
            attempts += 1;
        }

        tracing::info!(
            index = self.index,
            nonce = self.nonce,
            attempts,
            digest = %self.digest,
            "container sealed"
        );
        attempts
    }

    /// Stored digest equals a fresh recomputation.
    pub fn is_consistent(&self) -> bool {
        self.compute_digest() == self.digest
    }

    /// Stored digest meets the difficulty AND equals a fresh recomputation.
    ///
    /// Catches both a missing proof-of-work and any edit to a contained
    /// record after the digest was taken.
    pub fn is_valid(&self) -> bool {
        self.digest.meets_difficulty(self.policy.difficulty) && self.is_consistent()
    }

    /// Find a record by id, newest first.
    pub fn find_record(&self, id: &RecordId) -> Option<&Record> {
        self.records.iter().rev().find(|r| r.id() == id)
    }

    /// Mutable variant of [`find_record`](Self::find_record).
    pub fn find_record_mut(&mut self, id: &RecordId) -> Option<&mut Record> {
        self.records.iter_mut().rev().find(|r| r.id() == id)
    }

    /// Encode as the persisted text form.
    pub fn to_text(&self) -> String {
        let mut out = format!(
            "{}\n{}\n{}\n{}\n{}\n",
            self.index, self.previous, self.created_at, self.digest, self.nonce
        );
        for record in &self.records {
            out.push_str(&record.to_text());
            out.push('\n');
        }
        out
    }

    /// Decode the persisted text form.
    ///
    /// Header values are taken as stored. Records are replayed in order
    /// through the append path, then the stored digest and nonce are
    /// restored. A full container whose stored digest already meets the
    /// difficulty is not mined again; one whose stored digest does not is
    /// sealed now.
    pub fn from_text(text: &str, policy: SealPolicy) -> Result<Self> {
        let mut lines = text.lines();
        let mut header = |name: &str| {
            lines
                .next()
                .ok_or_else(|| CoreError::MalformedContainer(format!("missing {name} line")))
        };

        let index = parse_field::<u64>("index", header("index")?)?;
        let previous: PreviousDigest = header("previous digest")?.parse()?;
        let created_at = parse_field::<i64>("created_at", header("created_at")?)?;
        let digest_line = header("digest")?;
        let stored_digest = Digest::from_hex(digest_line).map_err(|e| {
            CoreError::MalformedContainer(format!("digest {digest_line:?}: {e}"))
        })?;
        let stored_nonce = parse_field::<u64>("nonce", header("nonce")?)?;

        let records = lines
            .map(Record::from_text)
            .collect::<Result<Vec<_>>>()?;
        if records.len() > policy.capacity {
            return Err(CoreError::MalformedContainer(format!(
                "container {index} holds {} records, capacity is {}",
                records.len(),
                policy.capacity
            )));
        }

        let mut container = Self {
            index,
            previous,
            created_at,
            records: Vec::new(),
            digest: stored_digest,
            nonce: stored_nonce,
            policy,
        };

        for record in records {
            container.records.push(record);
            container.digest = container.compute_digest();
        }

        if container.digest != stored_digest {
            tracing::warn!(
                index,
                stored = %stored_digest,
                computed = %container.digest,
                "stored container digest does not match its contents"
            );
        }

        if container.is_full() && !stored_digest.meets_difficulty(policy.difficulty) {
            // Sealing never completed; finish it from the recomputed digest.
            container.seal();
        } else {
            container.digest = stored_digest;
        }

        Ok(container)
    }
}

fn parse_field<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: fmt::Display,
{
    value
        .parse()
        .map_err(|e| CoreError::MalformedContainer(format!("{name} {value:?}: {e}")))
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("index", &self.index)
            .field("previous", &self.previous)
            .field("created_at", &self.created_at)
            .field("records", &self.records.len())
            .field("digest", &self.digest)
            .field("nonce", &self.nonce)
            .finish()
    }
}

/// Get current time in milliseconds.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
