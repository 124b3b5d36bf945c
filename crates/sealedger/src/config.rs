//! Ledger configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use sealedger_core::{KeyAlgorithm, SealPolicy, DEFAULT_CAPACITY, DEFAULT_DIFFICULTY};

use crate::error::{LedgerError, Result};

/// Subdirectory of `data_dir` holding container files.
pub const BLOCKS_DIR: &str = "blocks";

/// Subdirectory of `data_dir` holding identity key files.
pub const KEYS_DIR: &str = "senders";

/// Configuration for a [`Ledger`](crate::Ledger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LedgerConfig {
    /// Root directory for containers and keys.
    pub data_dir: PathBuf,
    /// Records per container.
    pub container_capacity: usize,
    /// Leading zero hex characters a sealed digest needs.
    pub difficulty: usize,
    /// Signing scheme for newly generated identity keys.
    pub key_algorithm: KeyAlgorithm,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("save"),
            container_capacity: DEFAULT_CAPACITY,
            difficulty: DEFAULT_DIFFICULTY,
            key_algorithm: KeyAlgorithm::default(),
        }
    }
}

impl LedgerConfig {
    /// Default settings rooted at `data_dir`.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    /// Parse from TOML. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).map_err(|e| LedgerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| LedgerError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    pub fn blocks_dir(&self) -> PathBuf {
        self.data_dir.join(BLOCKS_DIR)
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.data_dir.join(KEYS_DIR)
    }

    /// The container policy these settings describe.
    pub fn seal_policy(&self) -> Result<SealPolicy> {
        SealPolicy::new(self.container_capacity, self.difficulty)
            .map_err(|e| LedgerError::Config(e.to_string()))
    }

    /// Reject settings no ledger can run with.
    pub fn validate(&self) -> Result<()> {
        self.seal_policy().map(|_| ())
    }
}
