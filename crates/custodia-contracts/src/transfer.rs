//! Custody-transfer request data and its state machine vocabulary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Transfer FSM states.
///
/// `Pending → Approved → Completed` is the success path; `Rejected` and
/// `Cancelled` are terminal alternatives reachable only from `Pending`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferStatus {
    Pending,
    Approved,
    Rejected,
    Completed,
    Cancelled,
}

impl TransferStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Approved => "approved",
            TransferStatus::Rejected => "rejected",
            TransferStatus::Completed => "completed",
            TransferStatus::Cancelled => "cancelled",
        }
    }

    /// True for states that admit no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            TransferStatus::Rejected | TransferStatus::Completed | TransferStatus::Cancelled
        )
    }
}

impl std::fmt::Display for TransferStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One custody handoff between two identities.
///
/// Created once per request, mutated in place through the FSM, never deleted.
/// At most one `Pending` transfer may exist per evidence item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub transfer_id: String,
    pub evidence_id: String,
    pub from_user_id: String,
    pub to_user_id: String,
    pub reason: String,
    pub status: TransferStatus,
    pub requested_at: DateTime<Utc>,
    /// When the recipient approved or rejected, or the sender cancelled.
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Non-repudiation stamp the sender produces at completion.
    pub from_signature: Option<String>,
    /// Non-repudiation stamp the recipient produces at approval.
    pub to_signature: Option<String>,
}

impl TransferRequest {
    /// Build a freshly requested (pending) transfer.
    pub fn new(
        evidence_id: impl Into<String>,
        from_user_id: impl Into<String>,
        to_user_id: impl Into<String>,
        reason: impl Into<String>,
        requested_at: DateTime<Utc>,
    ) -> Self {
        Self {
            transfer_id: uuid::Uuid::new_v4().to_string(),
            evidence_id: evidence_id.into(),
            from_user_id: from_user_id.into(),
            to_user_id: to_user_id.into(),
            reason: reason.into(),
            status: TransferStatus::Pending,
            requested_at,
            responded_at: None,
            completed_at: None,
            from_signature: None,
            to_signature: None,
        }
    }
}
