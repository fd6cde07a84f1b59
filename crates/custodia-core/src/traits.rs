//! Trait seams between the provenance core and its collaborators.
//!
//! Two families live here:
//!
//! - **Directories and the notification sink** — the surrounding system
//!   (user management, evidence CRUD, case management, notification
//!   delivery) implements these. The core only reads identities and cases,
//!   and mutates exactly the evidence fields it owns.
//! - **Stores** — persistence for the three record types the core itself
//!   owns (ledger entries, hash records, transfer requests). Store methods
//!   carry the concurrency primitives the core relies on: a conditional
//!   append for the ledger and a compare-and-set transition for transfers.
//!
//! All implementations must be `Send + Sync`; the core holds them behind
//! `Arc<dyn …>` and may be called from many threads.

use std::io::Read;

use chrono::{DateTime, Utc};

use custodia_contracts::{
    actor::UserRecord,
    case::CaseRecord,
    error::CustodyResult,
    evidence::{ContentHandle, EvidenceItem, IntegrityStatus},
    ledger::LedgerEntry,
    query::{LedgerFilter, Page, TransferFilter},
    record::HashRecord,
    transfer::{TransferRequest, TransferStatus},
};

// ── External collaborators ────────────────────────────────────────────────────

/// Identity lookups. Backed by the external user service.
pub trait UserDirectory: Send + Sync {
    /// Resolve a user id to its directory record, if known.
    fn find(&self, user_id: &str) -> Option<UserRecord>;
}

/// The evidence collaborator: lookups, content access, and the narrow
/// mutators for the fields this core owns.
pub trait EvidenceDirectory: Send + Sync {
    /// Resolve an evidence id to its core-relevant projection.
    fn find(&self, evidence_id: &str) -> Option<EvidenceItem>;

    /// Open the byte stream behind a content handle for re-hashing.
    ///
    /// The handle is opaque to the core; only the directory can resolve it.
    fn open_content(&self, handle: &ContentHandle) -> CustodyResult<Box<dyn Read + Send>>;

    /// Record the outcome of an integrity verification on the item.
    ///
    /// This is the only path that may set `integrity_status` after intake.
    fn apply_verification(
        &self,
        evidence_id: &str,
        current_hash: &str,
        status: IntegrityStatus,
        verified_at: DateTime<Utc>,
    ) -> CustodyResult<()>;

    /// Change the item's current custodian. Called exclusively by the
    /// custody workflow when a transfer completes.
    fn assign_custodian(&self, evidence_id: &str, custodian_id: &str) -> CustodyResult<()>;
}

/// Read-only case lookups, used for intake guard checks.
pub trait CaseDirectory: Send + Sync {
    fn find(&self, case_id: &str) -> Option<CaseRecord>;
}

/// Fire-and-forget notification dispatch.
///
/// A failure here must never roll back a committed ledger append or transfer
/// transition — callers log the error and move on.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, user_id: &str, kind: &str, payload: serde_json::Value) -> CustodyResult<()>;
}

// ── Stores owned by the core ──────────────────────────────────────────────────

/// Persistence for ledger entries.
///
/// The append path is the single serialization point of the whole core: the
/// conditional `append_after` is what keeps two concurrent appends from
/// observing the same tail and forking the chain.
pub trait LedgerStore: Send + Sync {
    /// The highest-sequence entry currently stored, as
    /// `(sequence, self_hash)`, or `None` for an empty ledger.
    fn tail(&self) -> Option<(u64, String)>;

    /// Append `entry`, but only if the tail sequence still equals
    /// `expected_tail` (`None` meaning the store must still be empty).
    ///
    /// Returns `Conflict` if another append won the race; the caller
    /// re-reads the tail and retries.
    fn append_after(&self, expected_tail: Option<u64>, entry: LedgerEntry) -> CustodyResult<()>;

    /// A consistent snapshot of every entry, ascending by sequence.
    ///
    /// Committed entries are never retracted, so a snapshot taken while
    /// appends continue is still a valid chain prefix.
    fn scan(&self) -> Vec<LedgerEntry>;

    /// Filtered page of entries, ordered by timestamp descending.
    fn page(&self, filter: &LedgerFilter, page: u64, page_size: u64) -> Page<LedgerEntry>;
}

/// Persistence for hash-history records.
pub trait HashRecordStore: Send + Sync {
    fn insert(&self, record: HashRecord) -> CustodyResult<()>;

    /// All records for one evidence item, ordered `computed_at` descending.
    fn history(&self, evidence_id: &str) -> Vec<HashRecord>;
}

/// The fields a transfer transition is allowed to change, applied atomically
/// with the status flip. `None` leaves the stored value untouched.
#[derive(Debug, Clone, Default)]
pub struct TransferUpdate {
    pub responded_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub from_signature: Option<String>,
    pub to_signature: Option<String>,
}

/// Persistence for transfer requests.
pub trait TransferStore: Send + Sync {
    /// Insert a freshly requested transfer.
    ///
    /// Enforces the one-pending-per-evidence invariant under the store's own
    /// lock: if another `Pending` transfer exists for the same evidence,
    /// returns `Conflict` — closing the workflow's check-then-insert race.
    fn insert(&self, transfer: TransferRequest) -> CustodyResult<()>;

    fn get(&self, transfer_id: &str) -> Option<TransferRequest>;

    /// Compare-and-set transition: move the transfer from `expected` to
    /// `next`, applying `update` in the same critical section.
    ///
    /// Returns `NotFound` for an unknown id, or `InvalidState` carrying the
    /// actual current status when `expected` no longer holds (another caller
    /// won the race).
    fn transition(
        &self,
        transfer_id: &str,
        expected: TransferStatus,
        next: TransferStatus,
        update: TransferUpdate,
    ) -> CustodyResult<TransferRequest>;

    /// Filtered page of transfers, ordered `requested_at` descending.
    fn page(&self, filter: &TransferFilter, page: u64, page_size: u64) -> Page<TransferRequest>;
}
