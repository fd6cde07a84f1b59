//! # custodia-verify
//!
//! Content-integrity verification for the Custodia provenance core.
//!
//! [`IntegrityVerifier`] re-hashes stored evidence against the digest
//! recorded at intake, updates the item's integrity fields, and records
//! every hashing event in both the hash history and the audit ledger.

pub mod memory;
pub mod verifier;

pub use memory::InMemoryHashRecordStore;
pub use verifier::{
    BulkFailure, BulkVerificationReport, IntegrityVerifier, VerificationOutcome,
    BULK_VERIFY_LIMIT,
};

// ── Tests ─────────────────────────────────────────────────────────────────────
