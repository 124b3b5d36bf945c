//! KeyStore: one signing keypair per identity, created on first use.
//!
//! Keys live in `<dir>/<identity>.pem` as PKCS#8 PEM and are cached in
//! memory after the first load. A store opened with [`KeyStore::in_memory`]
//! keeps keys only in the cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use sealedger_core::{CoreError, IdentityKeys, KeyAlgorithm, Keypair, PublicKey};

use crate::error::{Result, StoreError};
use crate::fs::write_atomic;

/// File extension for persisted keys.
pub const KEY_EXTENSION: &str = "pem";

/// Per-identity keypairs, persisted once and never rotated.
pub struct KeyStore {
    dir: Option<PathBuf>,
    algorithm: KeyAlgorithm,
    cache: RwLock<HashMap<String, Keypair>>,
}

impl KeyStore {
    /// Open a key directory, creating it if needed.
    pub fn open(dir: impl AsRef<Path>, algorithm: KeyAlgorithm) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir: Some(dir),
            algorithm,
            cache: RwLock::new(HashMap::new()),
        })
    }

    /// A key store that never touches the filesystem.
    pub fn in_memory(algorithm: KeyAlgorithm) -> Self {
        Self {
            dir: None,
            algorithm,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn algorithm(&self) -> KeyAlgorithm {
        self.algorithm
    }

    /// Where the key for `identity` is (or would be) persisted.
    pub fn key_path(&self, identity: &str) -> Option<PathBuf> {
        self.dir
            .as_ref()
            .map(|dir| dir.join(format!("{identity}.{KEY_EXTENSION}")))
    }

    /// Load the keypair for `identity`, generating and persisting one if absent.
    ///
    /// Fails with [`StoreError::KeyIo`] when a key file exists but cannot be
    /// read or decoded.
    pub fn get_or_create(&self, identity: &str) -> Result<Keypair> {
        validate_identity(identity)?;

        {
            let cache = self
                .cache
                .read()
                .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
            if let Some(keypair) = cache.get(identity) {
                return Ok(keypair.clone());
            }
        }

        // Hold the write lock across load-or-generate so two callers never
        // generate competing keys for the same identity.
        let mut cache = self
            .cache
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        if let Some(keypair) = cache.get(identity) {
            return Ok(keypair.clone());
        }

        let keypair = match self.key_path(identity) {
            Some(path) if path.exists() => load_key(identity, &path)?,
            Some(path) => {
                let keypair = Keypair::generate(self.algorithm);
                let pem = keypair.to_pem().map_err(|e| StoreError::KeyIo {
                    identity: identity.to_string(),
                    reason: e.to_string(),
                })?;
                write_atomic(&path, pem.as_bytes())?;
                tracing::info!(identity, path = %path.display(), "generated key pair");
                keypair
            }
            None => {
                tracing::debug!(identity, "generated in-memory key pair");
                Keypair::generate(self.algorithm)
            }
        };

        cache.insert(identity.to_string(), keypair.clone());
        Ok(keypair)
    }

    /// The public half of [`get_or_create`](Self::get_or_create).
    pub fn public_key_of(&self, identity: &str) -> Result<PublicKey> {
        Ok(self.get_or_create(identity)?.public_key())
    }

    /// Number of identities currently cached.
    pub fn cached_identities(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or_default()
    }
}

impl IdentityKeys for KeyStore {
    fn keypair(&self, identity: &str) -> std::result::Result<Keypair, CoreError> {
        Ok(self.get_or_create(identity)?)
    }
}

impl std::fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyStore")
            .field("dir", &self.dir)
            .field("algorithm", &self.algorithm)
            .finish()
    }
}

fn load_key(identity: &str, path: &Path) -> Result<Keypair> {
    let pem = std::fs::read_to_string(path).map_err(|e| StoreError::KeyIo {
        identity: identity.to_string(),
        reason: format!("{}: {e}", path.display()),
    })?;
    Keypair::from_pem(identity, &pem).map_err(|e| StoreError::KeyIo {
        identity: identity.to_string(),
        reason: e.to_string(),
    })
}

/// Identities become file names, so they must be a single path component.
fn validate_identity(identity: &str) -> Result<()> {
    let bad = identity.is_empty()
        || identity == "."
        || identity == ".."
        || identity.contains(['/', '\\', '\0']);
    if bad {
        return Err(StoreError::InvalidIdentity(identity.to_string()));
    }
    Ok(())
}
