//! In-memory `LedgerStore` implementation.
//!
//! Entries live in a mutex-guarded `Vec` in append order, so index `n`
//! always holds sequence `n + 1`. The conditional append checks the tail and
//! inserts inside one critical section, which is what makes it a valid
//! compare-and-set for callers racing on the tail.

use std::sync::Mutex;

use custodia_contracts::{
    error::{CustodyError, CustodyResult},
    ledger::LedgerEntry,
    query::{LedgerFilter, Page},
};
use custodia_core::traits::LedgerStore;

/// Mutex-guarded, append-only entry vector.
#[derive(Default)]
pub struct InMemoryLedgerStore {
    pub(crate) entries: Mutex<Vec<LedgerEntry>>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches(filter: &LedgerFilter, entry: &LedgerEntry) -> bool {
    if let Some(entity_type) = &filter.entity_type {
        if &entry.entity_type != entity_type {
            return false;
        }
    }
    if let Some(entity_id) = &filter.entity_id {
        if &entry.entity_id != entity_id {
            return false;
        }
    }
    if let Some(action) = filter.action {
        if entry.action != action {
            return false;
        }
    }
    if let Some(actor_id) = &filter.actor_id {
        if &entry.actor_id != actor_id {
            return false;
        }
    }
    true
}

impl LedgerStore for InMemoryLedgerStore {
    fn tail(&self) -> Option<(u64, String)> {
        let entries = self.entries.lock().expect("ledger store lock poisoned");
        entries
            .last()
            .map(|entry| (entry.sequence, entry.self_hash.clone()))
    }

    fn append_after(&self, expected_tail: Option<u64>, entry: LedgerEntry) -> CustodyResult<()> {
        let mut entries = self.entries.lock().expect("ledger store lock poisoned");

        let current_tail = entries.last().map(|e| e.sequence);
        if current_tail != expected_tail {
            return Err(CustodyError::Conflict {
                reason: format!(
                    "ledger tail moved: expected {:?}, found {:?}",
                    expected_tail, current_tail
                ),
            });
        }

        // Uniqueness constraint on sequence, derived from the tail check.
        debug_assert_eq!(entry.sequence, current_tail.unwrap_or(0) + 1);

        entries.push(entry);
        Ok(())
    }

    fn scan(&self) -> Vec<LedgerEntry> {
        let entries = self.entries.lock().expect("ledger store lock poisoned");
        entries.clone()
    }

    fn page(&self, filter: &LedgerFilter, page: u64, page_size: u64) -> Page<LedgerEntry> {
        let entries = self.entries.lock().expect("ledger store lock poisoned");
        let mut selected: Vec<LedgerEntry> = entries
            .iter()
            .filter(|entry| matches(filter, entry))
            .cloned()
            .collect();
        drop(entries);

        // Timestamp descending; sequence breaks ties deterministically.
        selected.sort_by(|a, b| {
            b.timestamp
                .cmp(&a.timestamp)
                .then(b.sequence.cmp(&a.sequence))
        });

        Page::slice(selected, page, page_size)
    }
}
