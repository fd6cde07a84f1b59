//! Hash-history records: one row per hashing event on an evidence item.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The digest algorithm recorded on every hash record.
pub const HASH_ALGORITHM: &str = "sha256";

/// Why a hash was computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashEventType {
    /// Intake digest, recorded once when the item enters the system.
    Upload,
    /// On-demand integrity verification.
    Verification,
    /// The integrity checkpoint taken when custody changes hands.
    Transfer,
}

impl HashEventType {
    pub fn as_str(self) -> &'static str {
        match self {
            HashEventType::Upload => "upload",
            HashEventType::Verification => "verification",
            HashEventType::Transfer => "transfer",
        }
    }
}

/// An append-only record of one hashing event, ordered by `computed_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HashRecord {
    pub record_id: String,
    pub evidence_id: String,
    pub hash_value: String,
    /// Always [`HASH_ALGORITHM`]; stored so history stays self-describing if
    /// the algorithm ever changes.
    pub algorithm: String,
    pub event_type: HashEventType,
    pub computed_at: DateTime<Utc>,
    pub computed_by: String,
    /// Whether `hash_value` equals the item's intake digest.
    pub matches_original: bool,
}

impl HashRecord {
    /// Build a record for a hashing event that just happened.
    pub fn new(
        evidence_id: impl Into<String>,
        hash_value: impl Into<String>,
        event_type: HashEventType,
        computed_by: impl Into<String>,
        computed_at: DateTime<Utc>,
        matches_original: bool,
    ) -> Self {
        Self {
            record_id: uuid::Uuid::new_v4().to_string(),
            evidence_id: evidence_id.into(),
            hash_value: hash_value.into(),
            algorithm: HASH_ALGORITHM.to_string(),
            event_type,
            computed_at,
            computed_by: computed_by.into(),
            matches_original,
        }
    }
}
