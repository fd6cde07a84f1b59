//! # custodia-custody
//!
//! The custody-transfer workflow for the Custodia provenance core.
//!
//! A transfer is a two-party handshake over one evidence item:
//!
//! ```text
//! pending ──approve──▶ approved ──complete──▶ completed
//!    │
//!    ├──reject──▶ rejected
//!    └──cancel──▶ cancelled
//! ```
//!
//! Only the current custodian may request and complete; only the named
//! recipient may approve or reject. Completion re-hashes the item as an
//! integrity checkpoint and is the sole path that changes
//! `current_custodian_id`.

pub mod memory;
pub mod signature;
pub mod workflow;

pub use memory::InMemoryTransferStore;
pub use signature::transfer_signature;
pub use workflow::CustodyTransferWorkflow;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use custodia_contracts::{
        actor::{Role, UserRecord},
        error::CustodyError,
        evidence::{ContentHandle, EvidenceItem, EvidenceStatus, IntegrityStatus},
        ledger::AuditAction,
        query::{LedgerFilter, TransferFilter},
        record::HashEventType,
        transfer::TransferStatus,
    };
    use custodia_core::{
        hash::digest_bytes,
        memory::{InMemoryEvidenceDirectory, InMemoryUserDirectory, RecordingNotificationSink},
        traits::{EvidenceDirectory, HashRecordStore, TransferStore},
    };
    use custodia_ledger::{AuditLedger, InMemoryLedgerStore};
    use custodia_verify::InMemoryHashRecordStore;

    use super::{CustodyTransferWorkflow, InMemoryTransferStore};

    // ── Helpers ──────────────────────────────────────────────────────────────

    struct Rig {
        evidence: Arc<InMemoryEvidenceDirectory>,
        transfers: Arc<InMemoryTransferStore>,
        records: Arc<InMemoryHashRecordStore>,
        ledger: Arc<AuditLedger>,
        sink: Arc<RecordingNotificationSink>,
        workflow: CustodyTransferWorkflow,
    }

    fn user(id: &str, name: &str, role: Role) -> UserRecord {
        UserRecord {
            user_id: id.to_string(),
            email: format!("{id}@agency.example"),
            full_name: name.to_string(),
            role,
        }
    }

    fn rig() -> Rig {
        let users = Arc::new(InMemoryUserDirectory::new());
        users.insert(user("user-ava", "Ava Ruiz", Role::Investigator));
        users.insert(user("user-ben", "Ben Okafor", Role::Investigator));
        users.insert(user("user-cara", "Cara Singh", Role::ForensicAnalyst));

        let evidence = Arc::new(InMemoryEvidenceDirectory::new());
        let transfers = Arc::new(InMemoryTransferStore::new());
        let records = Arc::new(InMemoryHashRecordStore::new());
        let ledger = Arc::new(AuditLedger::new(Arc::new(InMemoryLedgerStore::new())));
        let sink = Arc::new(RecordingNotificationSink::new());

        let workflow = CustodyTransferWorkflow::new(
            users,
            evidence.clone(),
            transfers.clone(),
            records.clone(),
            ledger.clone(),
            sink.clone(),
        );

        Rig {
            evidence,
            transfers,
            records,
            ledger,
            sink,
            workflow,
        }
    }

    fn seed_item(rig: &Rig, evidence_id: &str, custodian: &str, status: EvidenceStatus) {
        let content = format!("contents of {evidence_id}").into_bytes();
        let hash = digest_bytes(&content);
        rig.evidence.insert(
            EvidenceItem {
                evidence_id: evidence_id.to_string(),
                case_id: "case-1".to_string(),
                file_name: format!("{evidence_id}.img"),
                content_handle: ContentHandle::new(format!("blob/{evidence_id}")),
                original_hash: hash.clone(),
                current_hash: hash,
                integrity_status: IntegrityStatus::Intact,
                last_verified_at: None,
                current_custodian_id: custodian.to_string(),
                status,
            },
            content,
        );
    }

    // ── End-to-end handshake ─────────────────────────────────────────────────

    /// The full two-party handshake: request → approve → complete, with the
    /// custody change, transfer-time hash record, both signatures, four
    /// ledger entries in strict sequence order, and the chain intact.
    #[test]
    fn full_handshake_transfers_custody() {
        let r = rig();
        seed_item(&r, "ev-1", "user-ava", EvidenceStatus::Active);

        let requested = r
            .workflow
            .request_transfer("ev-1", "user-ava", "user-ben", "court submission")
            .unwrap();
        assert_eq!(requested.status, TransferStatus::Pending);
        assert!(requested.to_signature.is_none());

        let approved = r.workflow.approve(&requested.transfer_id, "user-ben").unwrap();
        assert_eq!(approved.status, TransferStatus::Approved);
        assert!(approved.responded_at.is_some());
        assert!(approved.to_signature.is_some());

        let completed = r.workflow.complete(&requested.transfer_id, "user-ava").unwrap();
        assert_eq!(completed.status, TransferStatus::Completed);
        assert!(completed.completed_at.is_some());
        assert!(completed.from_signature.is_some());
        assert_ne!(completed.from_signature, completed.to_signature);

        // Custody moved to the recipient.
        let item = r.evidence.find("ev-1").unwrap();
        assert_eq!(item.current_custodian_id, "user-ben");

        // The transfer-time integrity checkpoint landed in the hash history.
        let history = r.records.history("ev-1");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].event_type, HashEventType::Transfer);
        assert!(history[0].matches_original);

        // Four ledger entries, in strict sequence order.
        let entries = r.ledger.query(&LedgerFilter::default(), 1, 10);
        assert_eq!(entries.total, 4);
        let mut actions: Vec<AuditAction> = entries.items.iter().map(|e| e.action).collect();
        actions.reverse(); // query is newest-first
        assert_eq!(
            actions,
            vec![
                AuditAction::TransferRequested,
                AuditAction::TransferApproved,
                AuditAction::EvidenceVerified,
                AuditAction::TransferCompleted,
            ]
        );
        assert!(r.ledger.verify_chain().intact);

        // Recipient, sender, recipient were notified in that order.
        let sent = r.sink.sent();
        let recipients: Vec<(&str, &str)> = sent
            .iter()
            .map(|n| (n.user_id.as_str(), n.kind.as_str()))
            .collect();
        assert_eq!(
            recipients,
            vec![
                ("user-ben", "transfer_requested"),
                ("user-ava", "transfer_approved"),
                ("user-ben", "transfer_completed"),
            ]
        );
    }

    /// Tampering while the sender still holds the item is caught by the
    /// transfer-time checkpoint — custody still moves, but the record and
    /// ledger say so.
    #[test]
    fn completion_checkpoint_catches_tampering() {
        let r = rig();
        seed_item(&r, "ev-2", "user-ava", EvidenceStatus::Active);

        let t = r
            .workflow
            .request_transfer("ev-2", "user-ava", "user-ben", "handover")
            .unwrap();
        r.workflow.approve(&t.transfer_id, "user-ben").unwrap();

        r.evidence
            .overwrite_content("ev-2", b"swapped while in custody".to_vec())
            .unwrap();

        r.workflow.complete(&t.transfer_id, "user-ava").unwrap();

        let history = r.records.history("ev-2");
        assert_eq!(history.len(), 1);
        assert!(!history[0].matches_original);

        let checkpoint = r.ledger.entity_history("evidence", "ev-2", 1, 10);
        assert_eq!(
            checkpoint.items[0].action,
            AuditAction::EvidenceVerificationFailed
        );
    }

    // ── Request guards ───────────────────────────────────────────────────────

    #[test]
    fn only_the_custodian_may_request() {
        let r = rig();
        seed_item(&r, "ev-3", "user-ava", EvidenceStatus::Active);

        let err = r
            .workflow
            .request_transfer("ev-3", "user-ben", "user-ava", "grab")
            .unwrap_err();
        assert!(matches!(err, CustodyError::Forbidden { .. }));
    }

    #[test]
    fn requesting_needs_the_transfer_permission() {
        let r = rig();
        // Cara is the custodian but her role cannot transfer.
        seed_item(&r, "ev-4", "user-cara", EvidenceStatus::Active);

        let err = r
            .workflow
            .request_transfer("ev-4", "user-cara", "user-ben", "handoff")
            .unwrap_err();
        assert!(matches!(err, CustodyError::Forbidden { .. }));
    }

    #[test]
    fn only_active_evidence_may_move() {
        let r = rig();
        seed_item(&r, "ev-5", "user-ava", EvidenceStatus::Archived);

        let err = r
            .workflow
            .request_transfer("ev-5", "user-ava", "user-ben", "move")
            .unwrap_err();
        match err {
            CustodyError::InvalidState { expected, current } => {
                assert_eq!(expected, "active");
                assert_eq!(current, "archived");
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn transfer_to_self_is_rejected() {
        let r = rig();
        seed_item(&r, "ev-6", "user-ava", EvidenceStatus::Active);

        let err = r
            .workflow
            .request_transfer("ev-6", "user-ava", "user-ava", "loop")
            .unwrap_err();
        assert!(matches!(err, CustodyError::Conflict { .. }));
    }

    #[test]
    fn unknown_target_user_is_not_found() {
        let r = rig();
        seed_item(&r, "ev-7", "user-ava", EvidenceStatus::Active);

        let err = r
            .workflow
            .request_transfer("ev-7", "user-ava", "user-ghost", "to nobody")
            .unwrap_err();
        assert!(matches!(err, CustodyError::NotFound { entity: "user", .. }));
    }

    #[test]
    fn second_pending_transfer_for_same_evidence_conflicts() {
        let r = rig();
        seed_item(&r, "ev-8", "user-ava", EvidenceStatus::Active);

        r.workflow
            .request_transfer("ev-8", "user-ava", "user-ben", "first")
            .unwrap();
        let err = r
            .workflow
            .request_transfer("ev-8", "user-ava", "user-cara", "second")
            .unwrap_err();
        assert!(matches!(err, CustodyError::Conflict { .. }));
    }

    // ── Response guards ──────────────────────────────────────────────────────

    #[test]
    fn only_the_recipient_may_approve_or_reject() {
        let r = rig();
        seed_item(&r, "ev-9", "user-ava", EvidenceStatus::Active);
        let t = r
            .workflow
            .request_transfer("ev-9", "user-ava", "user-ben", "handover")
            .unwrap();

        for meddler in ["user-ava", "user-cara"] {
            let err = r.workflow.approve(&t.transfer_id, meddler).unwrap_err();
            assert!(matches!(err, CustodyError::Forbidden { .. }), "{meddler}");
            let err = r.workflow.reject(&t.transfer_id, meddler).unwrap_err();
            assert!(matches!(err, CustodyError::Forbidden { .. }), "{meddler}");
        }
    }

    #[test]
    fn rejection_is_terminal_and_logged() {
        let r = rig();
        seed_item(&r, "ev-10", "user-ava", EvidenceStatus::Active);
        let t = r
            .workflow
            .request_transfer("ev-10", "user-ava", "user-ben", "handover")
            .unwrap();

        let rejected = r.workflow.reject(&t.transfer_id, "user-ben").unwrap();
        assert_eq!(rejected.status, TransferStatus::Rejected);
        assert!(rejected.responded_at.is_some());

        // No further transitions from a terminal state.
        let err = r.workflow.approve(&t.transfer_id, "user-ben").unwrap_err();
        assert!(matches!(err, CustodyError::InvalidState { .. }));
        let err = r.workflow.cancel(&t.transfer_id, "user-ava").unwrap_err();
        assert!(matches!(err, CustodyError::InvalidState { .. }));

        let entries = r.ledger.query(&LedgerFilter::default(), 1, 10);
        assert_eq!(entries.items[0].action, AuditAction::TransferRejected);
    }

    #[test]
    fn completing_a_pending_transfer_is_invalid_state() {
        let r = rig();
        seed_item(&r, "ev-11", "user-ava", EvidenceStatus::Active);
        let t = r
            .workflow
            .request_transfer("ev-11", "user-ava", "user-ben", "handover")
            .unwrap();

        let err = r.workflow.complete(&t.transfer_id, "user-ava").unwrap_err();
        match err {
            CustodyError::InvalidState { expected, current } => {
                assert_eq!(expected, "approved");
                assert_eq!(current, "pending");
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn only_the_sender_may_complete_or_cancel() {
        let r = rig();
        seed_item(&r, "ev-12", "user-ava", EvidenceStatus::Active);
        let t = r
            .workflow
            .request_transfer("ev-12", "user-ava", "user-ben", "handover")
            .unwrap();

        let err = r.workflow.cancel(&t.transfer_id, "user-ben").unwrap_err();
        assert!(matches!(err, CustodyError::Forbidden { .. }));

        r.workflow.approve(&t.transfer_id, "user-ben").unwrap();
        let err = r.workflow.complete(&t.transfer_id, "user-ben").unwrap_err();
        assert!(matches!(err, CustodyError::Forbidden { .. }));
    }

    #[test]
    fn cancellation_frees_the_evidence_for_a_new_request() {
        let r = rig();
        seed_item(&r, "ev-13", "user-ava", EvidenceStatus::Active);
        let t = r
            .workflow
            .request_transfer("ev-13", "user-ava", "user-ben", "first try")
            .unwrap();

        let cancelled = r.workflow.cancel(&t.transfer_id, "user-ava").unwrap();
        assert_eq!(cancelled.status, TransferStatus::Cancelled);

        // The pending slot is free again.
        r.workflow
            .request_transfer("ev-13", "user-ava", "user-cara", "second try")
            .unwrap();
    }

    /// A lost compare-and-set race surfaces as InvalidState carrying the
    /// winner's status — "already handled" is distinguishable from "not
    /// allowed".
    #[test]
    fn double_approval_loses_with_invalid_state() {
        let r = rig();
        seed_item(&r, "ev-14", "user-ava", EvidenceStatus::Active);
        let t = r
            .workflow
            .request_transfer("ev-14", "user-ava", "user-ben", "handover")
            .unwrap();

        r.workflow.approve(&t.transfer_id, "user-ben").unwrap();
        let err = r.workflow.approve(&t.transfer_id, "user-ben").unwrap_err();
        match err {
            CustodyError::InvalidState { current, .. } => assert_eq!(current, "approved"),
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }

    #[test]
    fn unknown_transfer_is_not_found() {
        let r = rig();
        let err = r.workflow.approve("tr-missing", "user-ben").unwrap_err();
        assert!(matches!(
            err,
            CustodyError::NotFound { entity: "transfer", .. }
        ));
        assert!(matches!(
            r.workflow.get("tr-missing").unwrap_err(),
            CustodyError::NotFound { .. }
        ));
    }

    // ── Reads ────────────────────────────────────────────────────────────────

    #[test]
    fn listing_filters_by_status_and_participant() {
        let r = rig();
        seed_item(&r, "ev-15", "user-ava", EvidenceStatus::Active);
        seed_item(&r, "ev-16", "user-ava", EvidenceStatus::Active);

        let t1 = r
            .workflow
            .request_transfer("ev-15", "user-ava", "user-ben", "a")
            .unwrap();
        r.workflow
            .request_transfer("ev-16", "user-ava", "user-cara", "b")
            .unwrap();
        r.workflow.reject(&t1.transfer_id, "user-ben").unwrap();

        let pending = r.workflow.list(
            &TransferFilter {
                status: Some(TransferStatus::Pending),
                ..TransferFilter::default()
            },
            1,
            10,
        );
        assert_eq!(pending.total, 1);
        assert_eq!(pending.items[0].evidence_id, "ev-16");

        let to_ben = r.workflow.list(
            &TransferFilter {
                to_user_id: Some("user-ben".to_string()),
                ..TransferFilter::default()
            },
            1,
            10,
        );
        assert_eq!(to_ben.total, 1);
        assert_eq!(to_ben.items[0].status, TransferStatus::Rejected);
    }

    /// The store-level CAS rejects a transition whose expectation is stale,
    /// independent of workflow guards.
    #[test]
    fn store_transition_is_compare_and_set() {
        let r = rig();
        seed_item(&r, "ev-17", "user-ava", EvidenceStatus::Active);
        let t = r
            .workflow
            .request_transfer("ev-17", "user-ava", "user-ben", "handover")
            .unwrap();

        let err = r
            .transfers
            .transition(
                &t.transfer_id,
                TransferStatus::Approved,
                TransferStatus::Completed,
                Default::default(),
            )
            .unwrap_err();
        match err {
            CustodyError::InvalidState { expected, current } => {
                assert_eq!(expected, "approved");
                assert_eq!(current, "pending");
            }
            other => panic!("expected InvalidState, got {other:?}"),
        }
    }
}
