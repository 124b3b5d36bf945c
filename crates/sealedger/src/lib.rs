//! # Sealedger
//!
//! A tamper-evident ledger of signed records grouped into containers that
//! are sealed by proof-of-work once full.
//!
//! ## Overview
//!
//! - **Records**: a sender, a receiver, and a payload, hashed and signed by
//!   the sender's key
//! - **Containers**: up to `capacity` records plus a digest; once full the
//!   digest is mined until it starts with `difficulty` zero hex characters
//! - **Ledger**: containers in order, each carrying its predecessor's digest,
//!   persisted after every insertion and reloaded on start
//!
//! Tampering is never rejected. It is detected: [`Ledger::check`] and
//! [`Ledger::audit`] report which digests, signatures, and seals no longer
//! hold.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sealedger::{Ledger, LedgerConfig};
//!
//! fn example() -> sealedger::Result<()> {
//!     let ledger = Ledger::open(&LedgerConfig::new("save"))?;
//!
//!     let receipt = ledger.submit("Alice", "Bob", "12 pizzas")?;
//!     let report = ledger.check(&receipt.record_id)?;
//!     assert!(report.map_or(false, |r| r.hash_valid && r.signature_valid));
//!
//!     for record in ledger.recent(10)? {
//!         println!("{}", record.summary());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `sealedger::core` - Records, containers, digests, keys
//! - `sealedger::store` - Key store and container stores

pub mod config;
pub mod error;
pub mod feed;
pub mod ledger;

pub use sealedger_core as core;
pub use sealedger_store as store;

pub use config::LedgerConfig;
pub use error::{LedgerError, Result};
pub use feed::{spawn_feed, FeedConfig, FeedHandle, FeedStats};
pub use ledger::{
    AuditReport, CheckReport, ContainerAudit, InsertReceipt, Ledger, ReloadSummary,
};

pub use sealedger_core::{Container, Record, RecordId, SealPolicy};
pub use sealedger_store::{ContainerStore, FsContainerStore, KeyStore, MemoryContainerStore};
