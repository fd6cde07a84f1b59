//! The custody-transfer workflow: the only path by which custodianship of an
//! evidence item may change.
//!
//! The FSM is a two-party handshake: the current custodian requests, the
//! named recipient approves (or rejects), and the custodian finalizes after
//! seeing the approval — no unilateral custody change is possible. Every
//! transition is guarded relationally (custodian / recipient), recorded in
//! the ledger, and raced through the store's compare-and-set so two
//! concurrent callers can never both win.
//!
//! Completion is also an integrity checkpoint: the item is re-hashed before
//! custody moves, catching tampering that happened while the outgoing
//! custodian held it.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use custodia_contracts::{
    actor::{Actor, Permission},
    error::{CustodyError, CustodyResult},
    evidence::EvidenceStatus,
    ledger::AuditAction,
    query::{Page, TransferFilter},
    record::{HashEventType, HashRecord},
    transfer::{TransferRequest, TransferStatus},
};
use custodia_core::{
    hash::digest_reader,
    traits::{
        EvidenceDirectory, HashRecordStore, NotificationSink, TransferStore, TransferUpdate,
        UserDirectory,
    },
};
use custodia_ledger::AuditLedger;

use crate::signature::transfer_signature;

/// Drives transfer requests through their state machine.
pub struct CustodyTransferWorkflow {
    users: Arc<dyn UserDirectory>,
    evidence: Arc<dyn EvidenceDirectory>,
    transfers: Arc<dyn TransferStore>,
    records: Arc<dyn HashRecordStore>,
    ledger: Arc<AuditLedger>,
    notifier: Arc<dyn NotificationSink>,
}

impl CustodyTransferWorkflow {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        evidence: Arc<dyn EvidenceDirectory>,
        transfers: Arc<dyn TransferStore>,
        records: Arc<dyn HashRecordStore>,
        ledger: Arc<AuditLedger>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            users,
            evidence,
            transfers,
            records,
            ledger,
            notifier,
        }
    }

    fn resolve_user(&self, user_id: &str) -> CustodyResult<custodia_contracts::actor::UserRecord> {
        self.users.find(user_id).ok_or(CustodyError::NotFound {
            entity: "user",
            id: user_id.to_string(),
        })
    }

    fn get_transfer(&self, transfer_id: &str) -> CustodyResult<TransferRequest> {
        self.transfers
            .get(transfer_id)
            .ok_or(CustodyError::NotFound {
                entity: "transfer",
                id: transfer_id.to_string(),
            })
    }

    /// Notification failures are logged and swallowed: delivery must never
    /// unwind a committed transition.
    fn notify_quietly(&self, user_id: &str, kind: &str, payload: serde_json::Value) {
        if let Err(e) = self.notifier.notify(user_id, kind, payload) {
            warn!(user_id, kind, error = %e, "notification delivery failed");
        }
    }

    // ── Transitions ───────────────────────────────────────────────────────────

    /// Open a transfer: only the current custodian of an active item may
    /// initiate, to an existing, different user, with no other pending
    /// transfer in flight for the item.
    pub fn request_transfer(
        &self,
        evidence_id: &str,
        from_user_id: &str,
        to_user_id: &str,
        reason: &str,
    ) -> CustodyResult<TransferRequest> {
        let from = self.resolve_user(from_user_id)?;
        if !from.role.can(Permission::Transfer) {
            return Err(CustodyError::Forbidden {
                reason: format!("role '{}' lacks the Transfer permission", from.role),
            });
        }

        let item = self.evidence.find(evidence_id).ok_or(CustodyError::NotFound {
            entity: "evidence",
            id: evidence_id.to_string(),
        })?;

        if item.current_custodian_id != from_user_id {
            return Err(CustodyError::Forbidden {
                reason: "only the current custodian may initiate a transfer".to_string(),
            });
        }
        if item.status != EvidenceStatus::Active {
            return Err(CustodyError::invalid_state(
                EvidenceStatus::Active.as_str(),
                item.status.as_str(),
            ));
        }

        let to = self.resolve_user(to_user_id)?;
        if to_user_id == from_user_id {
            return Err(CustodyError::Conflict {
                reason: "cannot transfer evidence to yourself".to_string(),
            });
        }

        let transfer = TransferRequest::new(evidence_id, from_user_id, to_user_id, reason, Utc::now());
        // The store enforces one-pending-per-evidence under its own lock.
        self.transfers.insert(transfer.clone())?;

        let mut metadata = BTreeMap::new();
        metadata.insert("evidence_id".to_string(), evidence_id.to_string());
        metadata.insert("from_user_id".to_string(), from_user_id.to_string());
        metadata.insert("to_user_id".to_string(), to_user_id.to_string());

        self.ledger.append(
            AuditAction::TransferRequested,
            "transfer",
            &transfer.transfer_id,
            &from.as_actor(),
            format!(
                "Requested custody transfer of {} to {}: {}",
                item.file_name, to.full_name, reason
            ),
            metadata,
        )?;

        self.notify_quietly(
            to_user_id,
            "transfer_requested",
            serde_json::json!({
                "transfer_id": transfer.transfer_id,
                "evidence_id": evidence_id,
                "from_user_id": from_user_id,
                "reason": reason,
            }),
        );

        info!(
            transfer_id = %transfer.transfer_id,
            evidence_id,
            "custody transfer requested"
        );
        Ok(transfer)
    }

    /// Recipient accepts a pending transfer, stamping `to_signature`.
    pub fn approve(&self, transfer_id: &str, user_id: &str) -> CustodyResult<TransferRequest> {
        let user = self.resolve_user(user_id)?;
        let transfer = self.get_transfer(transfer_id)?;

        if transfer.status != TransferStatus::Pending {
            return Err(CustodyError::invalid_state(
                TransferStatus::Pending.as_str(),
                transfer.status.as_str(),
            ));
        }
        if transfer.to_user_id != user_id {
            return Err(CustodyError::Forbidden {
                reason: "only the recipient may approve a transfer".to_string(),
            });
        }

        let now = Utc::now();
        let updated = self.transfers.transition(
            transfer_id,
            TransferStatus::Pending,
            TransferStatus::Approved,
            TransferUpdate {
                responded_at: Some(now),
                to_signature: Some(transfer_signature(user_id, transfer_id, &now)),
                ..TransferUpdate::default()
            },
        )?;

        self.ledger.append(
            AuditAction::TransferApproved,
            "transfer",
            transfer_id,
            &user.as_actor(),
            format!("Transfer approved by recipient {}", user.full_name),
            BTreeMap::new(),
        )?;

        self.notify_quietly(
            &updated.from_user_id,
            "transfer_approved",
            serde_json::json!({
                "transfer_id": transfer_id,
                "evidence_id": updated.evidence_id,
            }),
        );

        Ok(updated)
    }

    /// Recipient declines a pending transfer. Terminal.
    pub fn reject(&self, transfer_id: &str, user_id: &str) -> CustodyResult<TransferRequest> {
        let user = self.resolve_user(user_id)?;
        let transfer = self.get_transfer(transfer_id)?;

        if transfer.status != TransferStatus::Pending {
            return Err(CustodyError::invalid_state(
                TransferStatus::Pending.as_str(),
                transfer.status.as_str(),
            ));
        }
        if transfer.to_user_id != user_id {
            return Err(CustodyError::Forbidden {
                reason: "only the recipient may reject a transfer".to_string(),
            });
        }

        let updated = self.transfers.transition(
            transfer_id,
            TransferStatus::Pending,
            TransferStatus::Rejected,
            TransferUpdate {
                responded_at: Some(Utc::now()),
                ..TransferUpdate::default()
            },
        )?;

        self.ledger.append(
            AuditAction::TransferRejected,
            "transfer",
            transfer_id,
            &user.as_actor(),
            format!("Transfer rejected by recipient {}", user.full_name),
            BTreeMap::new(),
        )?;

        self.notify_quietly(
            &updated.from_user_id,
            "transfer_rejected",
            serde_json::json!({
                "transfer_id": transfer_id,
                "evidence_id": updated.evidence_id,
            }),
        );

        Ok(updated)
    }

    /// Sender finalizes an approved transfer: re-hash the item as a custody
    /// checkpoint, move custodianship to the recipient, and record it all.
    ///
    /// Hashing happens before any mutation so the ledger entries describe
    /// the true outcome; the compare-and-set transition then claims the
    /// completion before the custodian changes hands.
    pub fn complete(&self, transfer_id: &str, user_id: &str) -> CustodyResult<TransferRequest> {
        let user = self.resolve_user(user_id)?;
        let transfer = self.get_transfer(transfer_id)?;

        if transfer.status != TransferStatus::Approved {
            return Err(CustodyError::invalid_state(
                TransferStatus::Approved.as_str(),
                transfer.status.as_str(),
            ));
        }
        if transfer.from_user_id != user_id {
            return Err(CustodyError::Forbidden {
                reason: "only the sender may complete a transfer".to_string(),
            });
        }

        let item = self
            .evidence
            .find(&transfer.evidence_id)
            .ok_or(CustodyError::NotFound {
                entity: "evidence",
                id: transfer.evidence_id.clone(),
            })?;

        // Integrity checkpoint, taken before anything mutates.
        let mut reader = self.evidence.open_content(&item.content_handle)?;
        let checkpoint_hash = digest_reader(reader.as_mut())?;
        let checkpoint_matches = checkpoint_hash == item.original_hash;

        let now = Utc::now();
        let updated = self.transfers.transition(
            transfer_id,
            TransferStatus::Approved,
            TransferStatus::Completed,
            TransferUpdate {
                completed_at: Some(now),
                from_signature: Some(transfer_signature(user_id, transfer_id, &now)),
                ..TransferUpdate::default()
            },
        )?;

        self.records.insert(HashRecord::new(
            transfer.evidence_id.clone(),
            checkpoint_hash.clone(),
            HashEventType::Transfer,
            user_id,
            now,
            checkpoint_matches,
        ))?;

        self.evidence
            .assign_custodian(&transfer.evidence_id, &transfer.to_user_id)?;

        let actor = user.as_actor();

        let checkpoint_action = if checkpoint_matches {
            AuditAction::EvidenceVerified
        } else {
            AuditAction::EvidenceVerificationFailed
        };
        let mut checkpoint_metadata = BTreeMap::new();
        checkpoint_metadata.insert("transfer_id".to_string(), transfer_id.to_string());
        checkpoint_metadata.insert("current_hash".to_string(), checkpoint_hash);
        checkpoint_metadata.insert("original_hash".to_string(), item.original_hash.clone());
        self.ledger.append(
            checkpoint_action,
            "evidence",
            &transfer.evidence_id,
            &actor,
            format!(
                "Integrity checkpoint at custody transfer of {}",
                item.file_name
            ),
            checkpoint_metadata,
        )?;

        let to_name = self
            .users
            .find(&transfer.to_user_id)
            .map(|u| u.full_name)
            .unwrap_or_else(|| transfer.to_user_id.clone());
        let mut metadata = BTreeMap::new();
        metadata.insert("evidence_id".to_string(), transfer.evidence_id.clone());
        metadata.insert("to_user_id".to_string(), transfer.to_user_id.clone());
        self.ledger.append(
            AuditAction::TransferCompleted,
            "transfer",
            transfer_id,
            &actor,
            format!("Custody of {} transferred to {}", item.file_name, to_name),
            metadata,
        )?;

        self.notify_quietly(
            &transfer.to_user_id,
            "transfer_completed",
            serde_json::json!({
                "transfer_id": transfer_id,
                "evidence_id": transfer.evidence_id,
            }),
        );

        info!(
            transfer_id,
            evidence_id = %transfer.evidence_id,
            custodian = %transfer.to_user_id,
            checkpoint_intact = checkpoint_matches,
            "custody transfer completed"
        );
        Ok(updated)
    }

    /// Sender withdraws a pending transfer. Terminal.
    pub fn cancel(&self, transfer_id: &str, user_id: &str) -> CustodyResult<TransferRequest> {
        let user = self.resolve_user(user_id)?;
        let transfer = self.get_transfer(transfer_id)?;

        if transfer.status != TransferStatus::Pending {
            return Err(CustodyError::invalid_state(
                TransferStatus::Pending.as_str(),
                transfer.status.as_str(),
            ));
        }
        if transfer.from_user_id != user_id {
            return Err(CustodyError::Forbidden {
                reason: "only the sender may cancel a transfer".to_string(),
            });
        }

        let updated = self.transfers.transition(
            transfer_id,
            TransferStatus::Pending,
            TransferStatus::Cancelled,
            TransferUpdate {
                responded_at: Some(Utc::now()),
                ..TransferUpdate::default()
            },
        )?;

        self.ledger.append(
            AuditAction::TransferCancelled,
            "transfer",
            transfer_id,
            &user.as_actor(),
            format!("Transfer cancelled by sender {}", user.full_name),
            BTreeMap::new(),
        )?;

        Ok(updated)
    }

    // ── Reads ─────────────────────────────────────────────────────────────────

    pub fn get(&self, transfer_id: &str) -> CustodyResult<TransferRequest> {
        self.get_transfer(transfer_id)
    }

    /// Filtered page of transfers, newest requests first.
    pub fn list(
        &self,
        filter: &TransferFilter,
        page: u64,
        page_size: u64,
    ) -> Page<TransferRequest> {
        self.transfers.page(filter, page, page_size)
    }
}
