//! # Sealedger Testkit
//!
//! Testing utilities for sealedger.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: in-memory and temp-directory ledgers ready to use
//! - **Generators**: Proptest strategies for records, payloads, and policies
//! - **Derived keys**: reproducible per-identity keys without a key directory
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use sealedger_testkit::generators::{record_from_params, RecordParams};
//!
//! proptest! {
//!     #[test]
//!     fn record_verifies(params: RecordParams) {
//!         let record = record_from_params(&params);
//!         prop_assert!(record.verify_hash());
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust
//! use sealedger_testkit::fixtures::TestLedger;
//!
//! let fixture = TestLedger::new();
//! let receipts = fixture.fill(3, "Alice", "Bob");
//! assert_eq!(receipts.len(), 3);
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{identities, DerivedKeys, DiskLedger, TestLedger};
pub use generators::{container_from_params, record_from_params, RecordParams};
