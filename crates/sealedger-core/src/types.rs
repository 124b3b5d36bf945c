//! Strong type definitions for sealedger.

use std::fmt;
use std::str::FromStr;

use uuid::Uuid;

use crate::crypto::Digest;
use crate::error::CoreError;

/// A record identifier: a UUID v7 (millisecond timestamp plus random bits).
///
/// Collisions are negligible by construction; no uniqueness check is made
/// across the ledger.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(Uuid);

impl RecordId {
    /// Generate a fresh identifier.
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl FromStr for RecordId {
    type Err = CoreError;

    /// Parse the canonical hyphenated lowercase form only.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let uuid = Uuid::parse_str(s)
            .map_err(|e| CoreError::MalformedRecord(format!("id {s:?}: {e}")))?;
        if uuid.hyphenated().to_string() != s {
            return Err(CoreError::MalformedRecord(format!(
                "id {s:?} is not in canonical form"
            )));
        }
        Ok(Self(uuid))
    }
}

impl fmt::Debug for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RecordId({})", self.0)
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// The link from a container to its predecessor.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum PreviousDigest {
    /// First container in the ledger. Text form `"0"`.
    Genesis,
    /// Digest of the preceding container, captured when this one was appended.
    Digest(Digest),
}

impl PreviousDigest {
    /// Text marker for the genesis link.
    pub const GENESIS_MARKER: &'static str = "0";

    /// Whether this is the genesis link.
    pub fn is_genesis(&self) -> bool {
        matches!(self, PreviousDigest::Genesis)
    }
}

impl FromStr for PreviousDigest {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::GENESIS_MARKER {
            return Ok(PreviousDigest::Genesis);
        }
        Digest::from_hex(s)
            .map(PreviousDigest::Digest)
            .map_err(|e| CoreError::MalformedContainer(format!("previous digest {s:?}: {e}")))
    }
}

impl fmt::Debug for PreviousDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousDigest::Genesis => f.write_str("Genesis"),
            PreviousDigest::Digest(d) => write!(f, "{d:?}"),
        }
    }
}

impl fmt::Display for PreviousDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PreviousDigest::Genesis => f.write_str(Self::GENESIS_MARKER),
            PreviousDigest::Digest(d) => write!(f, "{d}"),
        }
    }
}
