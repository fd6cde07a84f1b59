//! Audit ledger entry types and the chain-verification report.
//!
//! `LedgerEntry` is immutable once written: it is produced exclusively by the
//! ledger's append operation and never mutated or deleted. The hash-input
//! layout lives with the chain code in `custodia-ledger`; this module only
//! defines the shapes that cross crate boundaries.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::actor::Role;

/// The closed taxonomy of auditable actions this core emits.
///
/// The snake_case wire names are load-bearing: `as_str()` feeds the entry
/// hash, so renaming a variant breaks recomputation of historical chains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    EvidenceUploaded,
    EvidenceVerified,
    EvidenceVerificationFailed,
    TransferRequested,
    TransferApproved,
    TransferRejected,
    TransferCompleted,
    TransferCancelled,
    AuditChainVerified,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::EvidenceUploaded => "evidence_uploaded",
            AuditAction::EvidenceVerified => "evidence_verified",
            AuditAction::EvidenceVerificationFailed => "evidence_verification_failed",
            AuditAction::TransferRequested => "transfer_requested",
            AuditAction::TransferApproved => "transfer_approved",
            AuditAction::TransferRejected => "transfer_rejected",
            AuditAction::TransferCompleted => "transfer_completed",
            AuditAction::TransferCancelled => "transfer_cancelled",
            AuditAction::AuditChainVerified => "audit_chain_verified",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One immutable entry in the hash-chained audit ledger.
///
/// `self_hash` commits to `action`, `entity_id`, `actor_id`, `details`, the
/// canonical timestamp, and `previous_hash`. The remaining fields (including
/// `metadata`) are stored but do not participate in the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub entry_id: String,
    /// Monotonic position in the chain, starting at 1.
    pub sequence: u64,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub actor_id: String,
    pub actor_email: String,
    pub actor_role: Role,
    /// Human-readable description of what happened. Hashed.
    pub details: String,
    /// Free-form context for display. Key-order-stable map; not hashed.
    pub metadata: BTreeMap<String, String>,
    /// SHA-256 (hex) over this entry's hashed fields and `previous_hash`.
    pub self_hash: String,
    /// `self_hash` of the prior entry, or the genesis constant at sequence 1.
    pub previous_hash: String,
    pub timestamp: DateTime<Utc>,
}

/// How a chain scan failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainBreak {
    /// An entry's `previous_hash` does not match the preceding entry — a
    /// deletion, insertion, or reorder.
    PreviousHashMismatch,
    /// Recomputing an entry's hash from its stored fields disagrees with the
    /// stored `self_hash` — in-place field tampering.
    SelfHashMismatch,
}

impl ChainBreak {
    pub fn as_str(self) -> &'static str {
        match self {
            ChainBreak::PreviousHashMismatch => "previous-hash-mismatch",
            ChainBreak::SelfHashMismatch => "self-hash-mismatch",
        }
    }
}

impl std::fmt::Display for ChainBreak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a full chain scan. An empty ledger is vacuously intact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainReport {
    pub intact: bool,
    pub total_entries: u64,
    /// Sequence of the first entry that failed, when not intact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub broken_at_sequence: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ChainBreak>,
}

impl ChainReport {
    /// Report for a chain that verified end to end.
    pub fn intact(total_entries: u64) -> Self {
        Self {
            intact: true,
            total_entries,
            broken_at_sequence: None,
            reason: None,
        }
    }

    /// Report for a chain that failed at `sequence`.
    pub fn broken(total_entries: u64, sequence: u64, reason: ChainBreak) -> Self {
        Self {
            intact: false,
            total_entries,
            broken_at_sequence: Some(sequence),
            reason: Some(reason),
        }
    }
}
