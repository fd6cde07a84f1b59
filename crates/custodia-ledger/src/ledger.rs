//! The `AuditLedger`: the single write funnel for every auditable mutation.
//!
//! All other components produce ledger entries exclusively through
//! [`AuditLedger::append`]; nothing else may write the store. The ledger owns
//! sequencing and chain-hash computation, and exposes the order-sensitive
//! reads (filtered queries, full-chain verification).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

use custodia_contracts::{
    actor::{Actor, Permission},
    error::{CustodyError, CustodyResult},
    ledger::{AuditAction, ChainReport, LedgerEntry},
    query::{LedgerFilter, Page},
};
use custodia_core::traits::LedgerStore;

use crate::chain::{entry_hash, verify_entries, GENESIS_HASH};

/// How many times an append re-reads the tail after losing the
/// conditional-write race before surfacing `Conflict`.
const APPEND_RETRIES: u32 = 3;

/// The append-only, hash-chained audit ledger.
///
/// # Concurrency
///
/// The append path is the core's single serialization point: each attempt
/// reads the tail, derives `sequence`/`previous_hash`, and hands the store a
/// conditional write keyed on the tail sequence it observed. Two concurrent
/// appends can never both succeed against the same tail, so the chain cannot
/// fork. Reads (`query`, `verify_chain`) run concurrently with appends over
/// committed snapshots.
pub struct AuditLedger {
    store: Arc<dyn LedgerStore>,
}

impl AuditLedger {
    pub fn new(store: Arc<dyn LedgerStore>) -> Self {
        Self { store }
    }

    /// Append one entry to the chain and return it.
    ///
    /// Derives `sequence = tail + 1` and `previous_hash` from the current
    /// tail (genesis constant on an empty ledger), stamps the entry with the
    /// append-time UTC instant, computes `self_hash`, and performs the
    /// conditional write. Losing the tail race retries the whole
    /// read-compute-write cycle a bounded number of times before returning
    /// `Conflict`.
    pub fn append(
        &self,
        action: AuditAction,
        entity_type: &str,
        entity_id: &str,
        actor: &Actor,
        details: impl Into<String>,
        metadata: BTreeMap<String, String>,
    ) -> CustodyResult<LedgerEntry> {
        let details = details.into();

        for attempt in 0..APPEND_RETRIES {
            let tail = self.store.tail();
            let expected_tail = tail.as_ref().map(|(sequence, _)| *sequence);
            let (sequence, previous_hash) = match tail {
                Some((sequence, self_hash)) => (sequence + 1, self_hash),
                None => (1, GENESIS_HASH.to_string()),
            };

            let timestamp = Utc::now();
            let self_hash = entry_hash(
                action,
                entity_id,
                &actor.user_id,
                &details,
                &timestamp,
                &previous_hash,
            );

            let entry = LedgerEntry {
                entry_id: uuid::Uuid::new_v4().to_string(),
                sequence,
                action,
                entity_type: entity_type.to_string(),
                entity_id: entity_id.to_string(),
                actor_id: actor.user_id.clone(),
                actor_email: actor.email.clone(),
                actor_role: actor.role,
                details: details.clone(),
                metadata: metadata.clone(),
                self_hash,
                previous_hash,
                timestamp,
            };

            match self.store.append_after(expected_tail, entry.clone()) {
                Ok(()) => {
                    debug!(sequence, action = %action, entity_id, "ledger entry appended");
                    return Ok(entry);
                }
                Err(CustodyError::Conflict { .. }) => {
                    warn!(attempt, action = %action, "ledger tail moved during append, retrying");
                    continue;
                }
                Err(other) => return Err(other),
            }
        }

        Err(CustodyError::Conflict {
            reason: format!("ledger append contention persisted across {APPEND_RETRIES} attempts"),
        })
    }

    /// Filtered page of entries, ordered by timestamp descending.
    pub fn query(
        &self,
        filter: &LedgerFilter,
        page: u64,
        page_size: u64,
    ) -> Page<LedgerEntry> {
        self.store.page(filter, page, page_size)
    }

    /// The audit history of one entity, newest first.
    pub fn entity_history(
        &self,
        entity_type: &str,
        entity_id: &str,
        page: u64,
        page_size: u64,
    ) -> Page<LedgerEntry> {
        self.store
            .page(&LedgerFilter::for_entity(entity_type, entity_id), page, page_size)
    }

    /// Walk the full chain and report the first break, if any.
    ///
    /// Pure read: O(n) over the whole history, meant for periodic audits
    /// rather than per-request checks. Never repairs anything.
    pub fn verify_chain(&self) -> ChainReport {
        verify_entries(&self.store.scan())
    }

    /// Chain scan that is itself recorded in the ledger.
    ///
    /// Requires the admin permission. The scan runs first; the appended
    /// `audit_chain_verified` entry then describes its outcome (and extends
    /// the chain by one).
    pub fn verify_chain_logged(&self, actor: &Actor) -> CustodyResult<ChainReport> {
        if !actor.role.can(Permission::Admin) {
            return Err(CustodyError::Forbidden {
                reason: format!("role '{}' may not run chain audits", actor.role),
            });
        }

        let report = self.verify_chain();

        let details = match (report.broken_at_sequence, report.reason) {
            (Some(sequence), Some(reason)) => format!(
                "Audit chain verification FAILED at sequence {sequence} ({reason}) over {} entries",
                report.total_entries
            ),
            _ => format!(
                "Audit chain verified intact over {} entries",
                report.total_entries
            ),
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("intact".to_string(), report.intact.to_string());
        metadata.insert("total_entries".to_string(), report.total_entries.to_string());
        if let Some(sequence) = report.broken_at_sequence {
            metadata.insert("broken_at_sequence".to_string(), sequence.to_string());
        }

        self.append(
            AuditAction::AuditChainVerified,
            "audit",
            "audit_ledger",
            actor,
            details,
            metadata,
        )?;

        Ok(report)
    }

    /// Hard gate for hosts that must not proceed over a broken chain.
    ///
    /// Returns the entry count when intact, or `IntegrityViolation` carrying
    /// the first broken sequence.
    pub fn ensure_intact(&self) -> CustodyResult<u64> {
        let report = self.verify_chain();
        match (report.intact, report.broken_at_sequence, report.reason) {
            (true, _, _) => Ok(report.total_entries),
            (false, Some(sequence), Some(reason)) => Err(CustodyError::IntegrityViolation {
                sequence,
                reason: reason.to_string(),
            }),
            // verify_entries always populates both fields on failure.
            (false, _, _) => Err(CustodyError::IntegrityViolation {
                sequence: 0,
                reason: "unreported chain break".to_string(),
            }),
        }
    }
}
