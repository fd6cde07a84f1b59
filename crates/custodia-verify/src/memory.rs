//! In-memory `HashRecordStore` implementation.

use std::sync::Mutex;

use custodia_contracts::{error::CustodyResult, record::HashRecord};
use custodia_core::traits::HashRecordStore;

/// Mutex-guarded, append-only record vector.
#[derive(Default)]
pub struct InMemoryHashRecordStore {
    records: Mutex<Vec<HashRecord>>,
}

impl InMemoryHashRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HashRecordStore for InMemoryHashRecordStore {
    fn insert(&self, record: HashRecord) -> CustodyResult<()> {
        let mut records = self.records.lock().expect("hash record lock poisoned");
        records.push(record);
        Ok(())
    }

    fn history(&self, evidence_id: &str) -> Vec<HashRecord> {
        let records = self.records.lock().expect("hash record lock poisoned");
        let mut selected: Vec<HashRecord> = records
            .iter()
            .filter(|r| r.evidence_id == evidence_id)
            .cloned()
            .collect();
        selected.sort_by(|a, b| b.computed_at.cmp(&a.computed_at));
        selected
    }
}
