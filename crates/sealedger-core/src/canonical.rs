//! Canonical byte forms that digests and signatures are computed over.
//!
//! Both the record digest and the record signature cover the same canonical
//! message, so any edit to an identifying field breaks both checks at once.
//! A container digest covers its header fields and the full canonical text
//! of every record it holds, signatures included.

use crate::crypto::Digest;
use crate::types::{PreviousDigest, RecordId};

/// The canonical record message: `id || sender || receiver || payload`.
///
/// Fields are concatenated as UTF-8 with no separators.
pub fn record_message(id: &RecordId, sender: &str, receiver: &str, payload: &str) -> Vec<u8> {
    let id = id.to_string();
    let mut buf = Vec::with_capacity(id.len() + sender.len() + receiver.len() + payload.len());
    buf.extend_from_slice(id.as_bytes());
    buf.extend_from_slice(sender.as_bytes());
    buf.extend_from_slice(receiver.as_bytes());
    buf.extend_from_slice(payload.as_bytes());
    buf
}

/// Concatenated canonical text of a container's records, in order.
pub fn container_body<'a>(record_texts: impl IntoIterator<Item = &'a str>) -> Vec<u8> {
    let mut buf = Vec::new();
    for text in record_texts {
        buf.extend_from_slice(text.as_bytes());
    }
    buf
}

/// Container digest over `index || previous || created_at || nonce || body`.
///
/// Numeric fields use their decimal text and `previous` its marker or hex
/// text, matching the persisted header lines byte for byte.
///
/// Fields are joined without separators, so `created_at` and `nonce` can
/// collide across different splits of the same digits (`1700001`,`1` and
/// `170000`,`11`). Persisted digests depend on this layout.
pub fn container_digest(
    index: u64,
    previous: &PreviousDigest,
    created_at: i64,
    nonce: u64,
    body: &[u8],
) -> Digest {
    let mut hasher = blake3::Hasher::new();
    hasher.update(index.to_string().as_bytes());
    hasher.update(previous.to_string().as_bytes());
    hasher.update(created_at.to_string().as_bytes());
    hasher.update(nonce.to_string().as_bytes());
    hasher.update(body);
    Digest(*hasher.finalize().as_bytes())
}
