//! Read-only case directory data.
//!
//! Cases are owned entirely by the external case-management collaborator; the
//! core only reads them for guard checks (evidence intake requires an open
//! case).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CaseStatus {
    Open,
    Closed,
    Archived,
}

impl CaseStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CaseStatus::Open => "open",
            CaseStatus::Closed => "closed",
            CaseStatus::Archived => "archived",
        }
    }
}

/// The case fields the core consumes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseRecord {
    pub case_id: String,
    /// Human-facing docket number, used in ledger details.
    pub case_number: String,
    pub status: CaseStatus,
}
