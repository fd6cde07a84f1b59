//! In-memory reference implementations of the collaborator traits.
//!
//! These back the demo CLI and the workspace's tests. They keep everything
//! in mutex-guarded maps and are safe to share across threads behind `Arc`.
//! A real deployment replaces them with adapters over the surrounding
//! system's services; the core never knows the difference.

use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use tracing::debug;

use custodia_contracts::{
    actor::UserRecord,
    case::CaseRecord,
    error::{CustodyError, CustodyResult},
    evidence::{ContentHandle, EvidenceItem, IntegrityStatus},
};

use crate::traits::{CaseDirectory, EvidenceDirectory, NotificationSink, UserDirectory};

// ── Users ─────────────────────────────────────────────────────────────────────

/// Mutex-guarded map of user records.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, user: UserRecord) {
        let mut users = self.users.lock().expect("user directory lock poisoned");
        users.insert(user.user_id.clone(), user);
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn find(&self, user_id: &str) -> Option<UserRecord> {
        let users = self.users.lock().expect("user directory lock poisoned");
        users.get(user_id).cloned()
    }
}

// ── Cases ─────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct InMemoryCaseDirectory {
    cases: Mutex<HashMap<String, CaseRecord>>,
}

impl InMemoryCaseDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, case: CaseRecord) {
        let mut cases = self.cases.lock().expect("case directory lock poisoned");
        cases.insert(case.case_id.clone(), case);
    }
}

impl CaseDirectory for InMemoryCaseDirectory {
    fn find(&self, case_id: &str) -> Option<CaseRecord> {
        let cases = self.cases.lock().expect("case directory lock poisoned");
        cases.get(case_id).cloned()
    }
}

// ── Evidence ──────────────────────────────────────────────────────────────────

struct EvidenceState {
    items: HashMap<String, EvidenceItem>,
    /// Content bytes keyed by handle locator.
    content: HashMap<String, Vec<u8>>,
}

/// Evidence directory holding items and their content bytes in memory.
///
/// `overwrite_content` exists so tests and the demo can simulate
/// out-of-band tampering with stored bytes.
pub struct InMemoryEvidenceDirectory {
    state: Mutex<EvidenceState>,
}

impl InMemoryEvidenceDirectory {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(EvidenceState {
                items: HashMap::new(),
                content: HashMap::new(),
            }),
        }
    }

    /// Store an item together with the bytes its handle resolves to.
    pub fn insert(&self, item: EvidenceItem, content: Vec<u8>) {
        let mut state = self.state.lock().expect("evidence directory lock poisoned");
        state.content.insert(item.content_handle.0.clone(), content);
        state.items.insert(item.evidence_id.clone(), item);
    }

    /// Replace the stored bytes behind an item's handle, bypassing every
    /// integrity control — the tamper scenario.
    pub fn overwrite_content(&self, evidence_id: &str, content: Vec<u8>) -> CustodyResult<()> {
        let mut state = self.state.lock().expect("evidence directory lock poisoned");
        let handle = match state.items.get(evidence_id) {
            Some(item) => item.content_handle.0.clone(),
            None => {
                return Err(CustodyError::NotFound {
                    entity: "evidence",
                    id: evidence_id.to_string(),
                })
            }
        };
        state.content.insert(handle, content);
        Ok(())
    }
}

impl Default for InMemoryEvidenceDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl EvidenceDirectory for InMemoryEvidenceDirectory {
    fn find(&self, evidence_id: &str) -> Option<EvidenceItem> {
        let state = self.state.lock().expect("evidence directory lock poisoned");
        state.items.get(evidence_id).cloned()
    }

    fn open_content(&self, handle: &ContentHandle) -> CustodyResult<Box<dyn Read + Send>> {
        let state = self.state.lock().expect("evidence directory lock poisoned");
        match state.content.get(&handle.0) {
            Some(bytes) => Ok(Box::new(Cursor::new(bytes.clone()))),
            None => Err(CustodyError::Hashing {
                reason: format!("no content behind handle '{}'", handle.0),
            }),
        }
    }

    fn apply_verification(
        &self,
        evidence_id: &str,
        current_hash: &str,
        status: IntegrityStatus,
        verified_at: DateTime<Utc>,
    ) -> CustodyResult<()> {
        let mut state = self.state.lock().expect("evidence directory lock poisoned");
        let item = state
            .items
            .get_mut(evidence_id)
            .ok_or(CustodyError::NotFound {
                entity: "evidence",
                id: evidence_id.to_string(),
            })?;
        item.current_hash = current_hash.to_string();
        item.integrity_status = status;
        item.last_verified_at = Some(verified_at);
        debug!(evidence_id, status = status.as_str(), "verification applied");
        Ok(())
    }

    fn assign_custodian(&self, evidence_id: &str, custodian_id: &str) -> CustodyResult<()> {
        let mut state = self.state.lock().expect("evidence directory lock poisoned");
        let item = state
            .items
            .get_mut(evidence_id)
            .ok_or(CustodyError::NotFound {
                entity: "evidence",
                id: evidence_id.to_string(),
            })?;
        item.current_custodian_id = custodian_id.to_string();
        debug!(evidence_id, custodian_id, "custodian assigned");
        Ok(())
    }
}

// ── Notifications ─────────────────────────────────────────────────────────────

/// One captured notification.
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub user_id: String,
    pub kind: String,
    pub payload: serde_json::Value,
}

/// A sink that records every notification instead of delivering it.
#[derive(Default)]
pub struct RecordingNotificationSink {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingNotificationSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything notified so far, in dispatch order.
    pub fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().expect("notification lock poisoned").clone()
    }
}

impl NotificationSink for RecordingNotificationSink {
    fn notify(&self, user_id: &str, kind: &str, payload: serde_json::Value) -> CustodyResult<()> {
        let mut sent = self.sent.lock().expect("notification lock poisoned");
        sent.push(SentNotification {
            user_id: user_id.to_string(),
            kind: kind.to_string(),
            payload,
        });
        Ok(())
    }
}

/// A sink that always fails. Used in tests to prove notification failures
/// never unwind committed mutations.
pub struct FailingNotificationSink;

impl NotificationSink for FailingNotificationSink {
    fn notify(&self, user_id: &str, _kind: &str, _payload: serde_json::Value) -> CustodyResult<()> {
        Err(CustodyError::Store {
            reason: format!("notification delivery to '{user_id}' unavailable"),
        })
    }
}
