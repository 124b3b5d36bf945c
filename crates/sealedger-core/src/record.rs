//! Record: a signed, hashed unit of ledger data.
//!
//! A record names a sender, a receiver and a free-text payload. Its digest
//! and signature both cover the canonical message built from those fields
//! plus the record id. Records are immutable except through [`Record::tamper`],
//! which exists to demonstrate that later edits are detected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::canonical::record_message;
use crate::crypto::{Digest, IdentityKeys, Signature};
use crate::error::{CoreError, Result};
use crate::types::RecordId;

/// Text appended to the payload by [`Record::tamper`].
pub const TAMPER_MARKER: &str = ":)";

/// A signed ledger record.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    id: RecordId,
    sender: String,
    receiver: String,
    payload: String,
    digest: Digest,
    signature: Signature,
}

/// Borrowed wire form used for encoding.
#[derive(Serialize)]
struct RecordTextRef<'a> {
    id: String,
    sender: &'a str,
    receiver: &'a str,
    payload: &'a str,
    digest: String,
    signature: String,
}

/// Owned wire form used for strict decoding.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordText {
    id: String,
    sender: String,
    receiver: String,
    payload: String,
    digest: String,
    signature: String,
}

impl Record {
    /// Create, hash and sign a new record.
    ///
    /// The sender's signing key is fetched (or created) through `keys`.
    pub fn create<K: IdentityKeys + ?Sized>(
        keys: &K,
        sender: impl Into<String>,
        receiver: impl Into<String>,
        payload: impl Into<String>,
    ) -> Result<Self> {
        let id = RecordId::generate();
        let sender = sender.into();
        let receiver = receiver.into();
        let payload = payload.into();

        let message = record_message(&id, &sender, &receiver, &payload);
        let digest = Digest::hash(&message);
        let signature = keys.keypair(&sender)?.sign(&message);

        Ok(Self {
            id,
            sender,
            receiver,
            payload,
            digest,
            signature,
        })
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn sender(&self) -> &str {
        &self.sender
    }

    pub fn receiver(&self) -> &str {
        &self.receiver
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The stored digest (not recomputed).
    pub fn digest(&self) -> &Digest {
        &self.digest
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// The canonical message built from the current field values.
    pub fn message(&self) -> Vec<u8> {
        record_message(&self.id, &self.sender, &self.receiver, &self.payload)
    }

    /// Recompute the digest from the current fields and compare to the stored one.
    pub fn verify_hash(&self) -> bool {
        Digest::hash(&self.message()) == self.digest
    }

    /// Verify the signature against the sender's *current* public key.
    ///
    /// Never fails: a malformed signature, a key mismatch, or an unusable
    /// sender key all yield `false`.
    pub fn verify_signature<K: IdentityKeys + ?Sized>(&self, keys: &K) -> bool {
        match keys.public_key(&self.sender) {
            Ok(public_key) => public_key.verifies(&self.message(), &self.signature),
            Err(e) => {
                tracing::warn!(record = %self.id, sender = %self.sender, "sender key unavailable: {}", e);
                false
            }
        }
    }

    /// Corrupt the payload without touching digest or signature.
    pub fn tamper(&mut self) {
        self.payload.push_str(TAMPER_MARKER);
    }

    /// Encode as one line of canonical JSON.
    ///
    /// Keys appear in the order `id, sender, receiver, payload, digest, signature`.
    pub fn to_text(&self) -> String {
        let wire = RecordTextRef {
            id: self.id.to_string(),
            sender: &self.sender,
            receiver: &self.receiver,
            payload: &self.payload,
            digest: self.digest.to_hex(),
            signature: self.signature.to_hex(),
        };
        // A struct of plain strings always serializes.
        serde_json::to_string(&wire).unwrap_or_default()
    }

    /// Decode from canonical JSON.
    ///
    /// Rejects missing fields, unknown fields, non-string values, a
    /// non-canonical id, a digest that is not 64 hex characters, and a
    /// signature that is not hex.
    pub fn from_text(text: &str) -> Result<Self> {
        let wire: RecordText =
            serde_json::from_str(text).map_err(|e| CoreError::MalformedRecord(e.to_string()))?;

        let id = wire.id.parse()?;
        let digest = Digest::from_hex(&wire.digest)
            .map_err(|e| CoreError::MalformedRecord(format!("digest: {e}")))?;
        let signature = Signature::from_hex(&wire.signature)
            .map_err(|e| CoreError::MalformedRecord(format!("signature: {e}")))?;

        Ok(Self {
            id,
            sender: wire.sender,
            receiver: wire.receiver,
            payload: wire.payload,
            digest,
            signature,
        })
    }

    /// One-line human summary: `id : sender -> receiver (payload)`.
    pub fn summary(&self) -> String {
        format!(
            "{} : {} -> {} ({})",
            self.id, self.sender, self.receiver, self.payload
        )
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("id", &self.id)
            .field("sender", &self.sender)
            .field("receiver", &self.receiver)
            .field("payload_len", &self.payload.len())
            .field("digest", &self.digest)
            .finish()
    }
}
