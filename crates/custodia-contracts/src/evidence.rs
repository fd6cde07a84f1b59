//! Evidence item fields the provenance core reads and mutates.
//!
//! The full evidence record (category, classification, tags, geolocation, …)
//! belongs to the external evidence-management collaborator. Custodia sees
//! only the fields that matter for integrity and custody, and mutates exactly
//! four of them: `current_hash`, `integrity_status`, `last_verified_at`
//! (through verification) and `current_custodian_id` (through a completed
//! transfer).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque locator for an evidence item's byte stream.
///
/// The core passes this back to the evidence directory to re-read content; it
/// is never serialized outward, so storage paths do not leak to clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContentHandle(pub String);

impl ContentHandle {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }
}

/// Outcome of the most recent integrity verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntegrityStatus {
    Intact,
    Tampered,
    Unverified,
}

impl IntegrityStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            IntegrityStatus::Intact => "intact",
            IntegrityStatus::Tampered => "tampered",
            IntegrityStatus::Unverified => "unverified",
        }
    }
}

/// Lifecycle status of an evidence item. Only `Active` items may change
/// custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvidenceStatus {
    Active,
    Archived,
    Disposed,
}

impl EvidenceStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceStatus::Active => "active",
            EvidenceStatus::Archived => "archived",
            EvidenceStatus::Disposed => "disposed",
        }
    }
}

/// The core-relevant projection of an evidence item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvidenceItem {
    pub evidence_id: String,
    /// Case the item was collected under; the intake hook checks the case is
    /// still open.
    pub case_id: String,
    /// Original upload filename, used in human-readable ledger details.
    pub file_name: String,
    /// Locator the directory resolves to a byte stream. Never exposed.
    #[serde(skip_serializing, default)]
    pub content_handle: ContentHandle,
    /// Digest recorded at intake. The comparison baseline for every later
    /// verification — repeated tampering can never reset it.
    pub original_hash: String,
    /// Digest from the most recent hashing event.
    pub current_hash: String,
    pub integrity_status: IntegrityStatus,
    pub last_verified_at: Option<DateTime<Utc>>,
    pub current_custodian_id: String,
    pub status: EvidenceStatus,
}
