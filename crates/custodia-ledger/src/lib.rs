//! # custodia-ledger
//!
//! Immutable, append-only, SHA-256 hash-chained audit ledger for the
//! Custodia provenance core.
//!
//! ## Overview
//!
//! Every mutation elsewhere in the system funnels through
//! [`AuditLedger::append`], which wraps the event in a [`LedgerEntry`] linked
//! to its predecessor by hash. Tampering with any stored entry — even a
//! single field — breaks the chain and is detected by
//! [`AuditLedger::verify_chain`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use custodia_ledger::{AuditLedger, InMemoryLedgerStore};
//!
//! let ledger = AuditLedger::new(Arc::new(InMemoryLedgerStore::new()));
//! ledger.append(action, "evidence", "ev-1", &actor, "details", metadata)?;
//! assert!(ledger.verify_chain().intact);
//! ```
//!
//! [`LedgerEntry`]: custodia_contracts::ledger::LedgerEntry

pub mod chain;
pub mod ledger;
pub mod memory;

pub use chain::{canonical_timestamp, entry_hash, verify_entries, GENESIS_HASH};
pub use ledger::AuditLedger;
pub use memory::InMemoryLedgerStore;

// ── Tests ─────────────────────────────────────────────────────────────────────
