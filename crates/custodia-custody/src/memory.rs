//! In-memory `TransferStore` implementation.
//!
//! The invariants the workflow depends on are enforced inside the store's
//! critical sections, not just by the workflow's pre-checks: `insert` rejects
//! a second pending transfer for the same evidence, and `transition` is a
//! compare-and-set on the stored status.

use std::collections::HashMap;
use std::sync::Mutex;

use custodia_contracts::{
    error::{CustodyError, CustodyResult},
    query::{Page, TransferFilter},
    transfer::{TransferRequest, TransferStatus},
};
use custodia_core::traits::{TransferStore, TransferUpdate};

#[derive(Default)]
pub struct InMemoryTransferStore {
    transfers: Mutex<HashMap<String, TransferRequest>>,
}

impl InMemoryTransferStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(filter: &TransferFilter, transfer: &TransferRequest) -> bool {
    if let Some(evidence_id) = &filter.evidence_id {
        if &transfer.evidence_id != evidence_id {
            return false;
        }
    }
    if let Some(from_user_id) = &filter.from_user_id {
        if &transfer.from_user_id != from_user_id {
            return false;
        }
    }
    if let Some(to_user_id) = &filter.to_user_id {
        if &transfer.to_user_id != to_user_id {
            return false;
        }
    }
    if let Some(status) = filter.status {
        if transfer.status != status {
            return false;
        }
    }
    true
}

impl TransferStore for InMemoryTransferStore {
    fn insert(&self, transfer: TransferRequest) -> CustodyResult<()> {
        let mut transfers = self.transfers.lock().expect("transfer store lock poisoned");

        // One pending transfer per evidence item, checked under the lock.
        let pending_exists = transfers.values().any(|t| {
            t.evidence_id == transfer.evidence_id && t.status == TransferStatus::Pending
        });
        if pending_exists {
            return Err(CustodyError::Conflict {
                reason: format!(
                    "a pending transfer already exists for evidence '{}'",
                    transfer.evidence_id
                ),
            });
        }

        transfers.insert(transfer.transfer_id.clone(), transfer);
        Ok(())
    }

    fn get(&self, transfer_id: &str) -> Option<TransferRequest> {
        let transfers = self.transfers.lock().expect("transfer store lock poisoned");
        transfers.get(transfer_id).cloned()
    }

    fn transition(
        &self,
        transfer_id: &str,
        expected: TransferStatus,
        next: TransferStatus,
        update: TransferUpdate,
    ) -> CustodyResult<TransferRequest> {
        let mut transfers = self.transfers.lock().expect("transfer store lock poisoned");

        let transfer = transfers
            .get_mut(transfer_id)
            .ok_or(CustodyError::NotFound {
                entity: "transfer",
                id: transfer_id.to_string(),
            })?;

        if transfer.status != expected {
            return Err(CustodyError::invalid_state(
                expected.as_str(),
                transfer.status.as_str(),
            ));
        }

        transfer.status = next;
        if update.responded_at.is_some() {
            transfer.responded_at = update.responded_at;
        }
        if update.completed_at.is_some() {
            transfer.completed_at = update.completed_at;
        }
        if update.from_signature.is_some() {
            transfer.from_signature = update.from_signature;
        }
        if update.to_signature.is_some() {
            transfer.to_signature = update.to_signature;
        }

        Ok(transfer.clone())
    }

    fn page(&self, filter: &TransferFilter, page: u64, page_size: u64) -> Page<TransferRequest> {
        let transfers = self.transfers.lock().expect("transfer store lock poisoned");
        let mut selected: Vec<TransferRequest> = transfers
            .values()
            .filter(|t| matches(filter, t))
            .cloned()
            .collect();
        drop(transfers);

        selected.sort_by(|a, b| {
            b.requested_at
                .cmp(&a.requested_at)
                .then_with(|| b.transfer_id.cmp(&a.transfer_id))
        });

        Page::slice(selected, page, page_size)
    }
}
