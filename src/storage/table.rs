use crate::core::{StasisRecord, TokenId};
use std::collections::BTreeMap;

/// In-memory stasis table shared by every store backend.
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    records: BTreeMap<TokenId, StasisRecord>,
    dirty: bool,
}

impl RecordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the contents with freshly loaded records and mark the table clean.
    pub fn replace_all(&mut self, records: impl IntoIterator<Item = StasisRecord>) {
        self.records = records
            .into_iter()
            .map(|record| (record.token, record))
            .collect();
        self.dirty = false;
    }

    pub fn get(&self, token: &TokenId) -> Option<&StasisRecord> {
        self.records.get(token)
    }

    pub fn put(&mut self, record: StasisRecord) {
        self.records.insert(record.token, record);
        self.dirty = true;
    }

    pub fn delete(&mut self, token: &TokenId) -> Option<StasisRecord> {
        let removed = self.records.remove(token);
        if removed.is_some() {
            self.dirty = true;
        }
        removed
    }

    pub fn ids(&self) -> Vec<TokenId> {
        self.records.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StasisRecord> + '_ {
        self.records.values()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}
