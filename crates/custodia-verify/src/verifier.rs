//! The integrity verifier: re-hash stored evidence and detect drift.
//!
//! Verification always compares against `original_hash` — the digest
//! recorded at intake — never against `current_hash`, so repeated tampering
//! can never "reset" the baseline. This component is the only legitimate
//! writer of `integrity_status` after intake; reading `current_hash` without
//! calling `verify` is stale by construction.
//!
//! Ordering is fixed: hash first, mutate the item, write the hash record,
//! append the ledger entry, then notify. The ledger entry can therefore
//! truthfully describe the outcome, and a notification failure can never
//! unwind anything.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, info, warn};

use custodia_contracts::{
    actor::{Actor, Permission},
    case::CaseStatus,
    error::{CustodyError, CustodyResult},
    evidence::IntegrityStatus,
    ledger::AuditAction,
    record::{HashEventType, HashRecord},
};
use custodia_core::{
    hash::digest_reader,
    traits::{CaseDirectory, EvidenceDirectory, HashRecordStore, NotificationSink, UserDirectory},
};
use custodia_ledger::AuditLedger;

/// Most evidence ids a single bulk verification call will process.
pub const BULK_VERIFY_LIMIT: usize = 50;

/// What one verification produced.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationOutcome {
    pub evidence_id: String,
    pub current_hash: String,
    pub original_hash: String,
    pub matches: bool,
    pub integrity_status: IntegrityStatus,
}

/// One evidence id a bulk run could not verify, with the error message.
#[derive(Debug, Clone, Serialize)]
pub struct BulkFailure {
    pub evidence_id: String,
    pub error: String,
}

/// Aggregated result of a bulk verification sweep.
#[derive(Debug, Clone, Serialize)]
pub struct BulkVerificationReport {
    /// Ids the caller submitted.
    pub requested: usize,
    /// Items whose content still matches the intake digest.
    pub intact: usize,
    /// Items whose content has drifted.
    pub tampered: usize,
    /// Ids past the per-call limit, left untouched.
    pub skipped: usize,
    pub failed: Vec<BulkFailure>,
}

/// Re-hashes stored evidence on demand and records what it finds.
pub struct IntegrityVerifier {
    users: Arc<dyn UserDirectory>,
    evidence: Arc<dyn EvidenceDirectory>,
    cases: Arc<dyn CaseDirectory>,
    records: Arc<dyn HashRecordStore>,
    ledger: Arc<AuditLedger>,
    notifier: Arc<dyn NotificationSink>,
}

impl IntegrityVerifier {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        evidence: Arc<dyn EvidenceDirectory>,
        cases: Arc<dyn CaseDirectory>,
        records: Arc<dyn HashRecordStore>,
        ledger: Arc<AuditLedger>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            users,
            evidence,
            cases,
            records,
            ledger,
            notifier,
        }
    }

    fn resolve_actor(&self, actor_id: &str, permission: Permission) -> CustodyResult<Actor> {
        let user = self.users.find(actor_id).ok_or(CustodyError::NotFound {
            entity: "user",
            id: actor_id.to_string(),
        })?;
        if !user.role.can(permission) {
            return Err(CustodyError::Forbidden {
                reason: format!("role '{}' lacks the {:?} permission", user.role, permission),
            });
        }
        Ok(user.as_actor())
    }

    /// Re-hash one evidence item and compare against its intake digest.
    ///
    /// A mismatch is a reported outcome, not an error: the item is marked
    /// `Tampered`, the event lands in the hash history and the ledger, and
    /// the current custodian is alerted.
    pub fn verify(&self, evidence_id: &str, actor_id: &str) -> CustodyResult<VerificationOutcome> {
        let actor = self.resolve_actor(actor_id, Permission::Verify)?;

        let item = self.evidence.find(evidence_id).ok_or(CustodyError::NotFound {
            entity: "evidence",
            id: evidence_id.to_string(),
        })?;

        let mut reader = self.evidence.open_content(&item.content_handle)?;
        let current_hash = digest_reader(reader.as_mut())?;

        let matches = current_hash == item.original_hash;
        let integrity_status = if matches {
            IntegrityStatus::Intact
        } else {
            IntegrityStatus::Tampered
        };
        let now = Utc::now();

        self.evidence
            .apply_verification(evidence_id, &current_hash, integrity_status, now)?;

        self.records.insert(HashRecord::new(
            evidence_id,
            current_hash.clone(),
            HashEventType::Verification,
            actor_id,
            now,
            matches,
        ))?;

        let (action, details) = if matches {
            (
                AuditAction::EvidenceVerified,
                format!("Integrity check of {}: hash matches original", item.file_name),
            )
        } else {
            (
                AuditAction::EvidenceVerificationFailed,
                format!(
                    "Integrity check of {}: hash mismatch against original",
                    item.file_name
                ),
            )
        };

        let mut metadata = BTreeMap::new();
        metadata.insert("current_hash".to_string(), current_hash.clone());
        metadata.insert("original_hash".to_string(), item.original_hash.clone());

        self.ledger
            .append(action, "evidence", evidence_id, &actor, details, metadata)?;

        if matches {
            debug!(evidence_id, "integrity verified intact");
        } else {
            info!(evidence_id, "integrity verification detected tampering");
            // Fire-and-forget: a failed alert never unwinds the recorded
            // verification.
            let alert = self.notifier.notify(
                &item.current_custodian_id,
                "integrity_alert",
                json!({
                    "evidence_id": evidence_id,
                    "current_hash": current_hash,
                    "original_hash": item.original_hash,
                }),
            );
            if let Err(e) = alert {
                warn!(evidence_id, error = %e, "integrity alert delivery failed");
            }
        }

        Ok(VerificationOutcome {
            evidence_id: evidence_id.to_string(),
            current_hash,
            original_hash: item.original_hash,
            matches,
            integrity_status,
        })
    }

    /// Verify up to [`BULK_VERIFY_LIMIT`] items independently.
    ///
    /// One item's failure never stops the sweep; ids beyond the limit are
    /// left untouched and reported via `skipped`.
    pub fn verify_many(
        &self,
        evidence_ids: &[String],
        actor_id: &str,
    ) -> CustodyResult<BulkVerificationReport> {
        // One permission check up front; per-item calls repeat it cheaply.
        self.resolve_actor(actor_id, Permission::Verify)?;

        let mut report = BulkVerificationReport {
            requested: evidence_ids.len(),
            intact: 0,
            tampered: 0,
            skipped: evidence_ids.len().saturating_sub(BULK_VERIFY_LIMIT),
            failed: Vec::new(),
        };

        for evidence_id in evidence_ids.iter().take(BULK_VERIFY_LIMIT) {
            match self.verify(evidence_id, actor_id) {
                Ok(outcome) if outcome.matches => report.intact += 1,
                Ok(_) => report.tampered += 1,
                Err(e) => report.failed.push(BulkFailure {
                    evidence_id: evidence_id.clone(),
                    error: e.to_string(),
                }),
            }
        }

        info!(
            requested = report.requested,
            intact = report.intact,
            tampered = report.tampered,
            failed = report.failed.len(),
            skipped = report.skipped,
            "bulk verification finished"
        );
        Ok(report)
    }

    /// Record the intake hash for a freshly stored item.
    ///
    /// Called by the external evidence CRUD right after it persists a new
    /// item. Guards that the item's case is still open, then writes the
    /// `upload` hash record from the intake digest and the
    /// `evidence_uploaded` ledger entry.
    pub fn record_intake(&self, evidence_id: &str, actor_id: &str) -> CustodyResult<HashRecord> {
        let actor = self.resolve_actor(actor_id, Permission::Upload)?;

        let item = self.evidence.find(evidence_id).ok_or(CustodyError::NotFound {
            entity: "evidence",
            id: evidence_id.to_string(),
        })?;

        let case = self.cases.find(&item.case_id).ok_or(CustodyError::NotFound {
            entity: "case",
            id: item.case_id.clone(),
        })?;
        if case.status != CaseStatus::Open {
            return Err(CustodyError::invalid_state("open", case.status.as_str()));
        }

        let record = HashRecord::new(
            evidence_id,
            item.original_hash.clone(),
            HashEventType::Upload,
            actor_id,
            Utc::now(),
            true,
        );
        self.records.insert(record.clone())?;

        let mut metadata = BTreeMap::new();
        metadata.insert("case_id".to_string(), item.case_id.clone());
        metadata.insert("original_hash".to_string(), item.original_hash.clone());

        self.ledger.append(
            AuditAction::EvidenceUploaded,
            "evidence",
            evidence_id,
            &actor,
            format!("Uploaded {} to case {}", item.file_name, case.case_number),
            metadata,
        )?;

        Ok(record)
    }

    /// The hash history of one item, newest first.
    pub fn hash_history(&self, evidence_id: &str) -> CustodyResult<Vec<HashRecord>> {
        if self.evidence.find(evidence_id).is_none() {
            return Err(CustodyError::NotFound {
                entity: "evidence",
                id: evidence_id.to_string(),
            });
        }
        Ok(self.records.history(evidence_id))
    }
}
