//! Pagination envelope and the read-side filters.

use serde::{Deserialize, Serialize};

use crate::ledger::AuditAction;
use crate::transfer::TransferStatus;

/// Largest page a single read may return.
pub const MAX_PAGE_SIZE: u64 = 100;

/// One page of an ordered result set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub page_size: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Slice an already-filtered, already-ordered result set down to one
    /// page. `page` is 1-based; out-of-range pages yield empty `items`.
    pub fn slice(all: Vec<T>, page: u64, page_size: u64) -> Self {
        let page = page.max(1);
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let total = all.len() as u64;
        let total_pages = (total.div_ceil(page_size)).max(1);

        let start = (page - 1).saturating_mul(page_size) as usize;
        let items: Vec<T> = all
            .into_iter()
            .skip(start)
            .take(page_size as usize)
            .collect();

        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }
}

/// Filters for ledger queries. All fields are conjunctive; `None` matches
/// everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFilter {
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub action: Option<AuditAction>,
    pub actor_id: Option<String>,
}

impl LedgerFilter {
    /// Filter for the full history of one entity.
    pub fn for_entity(entity_type: impl Into<String>, entity_id: impl Into<String>) -> Self {
        Self {
            entity_type: Some(entity_type.into()),
            entity_id: Some(entity_id.into()),
            ..Self::default()
        }
    }
}

/// Filters for transfer listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFilter {
    pub evidence_id: Option<String>,
    pub from_user_id: Option<String>,
    pub to_user_id: Option<String>,
    pub status: Option<TransferStatus>,
}
