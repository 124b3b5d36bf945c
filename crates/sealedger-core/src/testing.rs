//! Deterministic in-process key lookup for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::crypto::{Digest, IdentityKeys, Keypair};
use crate::error::Result;

/// Keys derived from `blake3(identity || generation)`.
///
/// `rotate` bumps an identity's generation, replacing its key the way an
/// operator replacing a key file would.
#[derive(Default)]
pub(crate) struct SeededKeys {
    generations: Mutex<HashMap<String, u32>>,
}

impl SeededKeys {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn rotate(&self, identity: &str) {
        let mut generations = self.generations.lock().unwrap();
        *generations.entry(identity.to_string()).or_insert(0) += 1;
    }
}

impl IdentityKeys for SeededKeys {
    fn keypair(&self, identity: &str) -> Result<Keypair> {
        let generation = *self.generations.lock().unwrap().get(identity).unwrap_or(&0);
        let seed = Digest::hash(format!("{identity}/{generation}").as_bytes());
        Ok(Keypair::from_seed(seed.as_bytes()))
    }
}
