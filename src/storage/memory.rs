use super::engine::{LoadReport, RecordStore};
use super::table::RecordTable;
use crate::core::{Result, StasisRecord, TokenId};

/// Record store without stable storage.
///
/// `save` only clears the dirty flag; contents are lost when the store is dropped.
#[derive(Debug, Clone, Default)]
pub struct MemoryRecordStore {
    table: RecordTable,
    saves: u64,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing set of records, as if they had been loaded.
    pub fn with_records(records: impl IntoIterator<Item = StasisRecord>) -> Self {
        let mut table = RecordTable::new();
        table.replace_all(records);
        Self { table, saves: 0 }
    }

    /// Number of successful saves
    pub fn save_count(&self) -> u64 {
        self.saves
    }
}

impl RecordStore for MemoryRecordStore {
    fn load(&mut self) -> Result<LoadReport> {
        self.table.mark_clean();
        Ok(LoadReport {
            loaded: self.table.len(),
            dropped: 0,
        })
    }

    fn save(&mut self) -> Result<()> {
        self.table.mark_clean();
        self.saves += 1;
        Ok(())
    }

    fn get(&self, token: &TokenId) -> Option<&StasisRecord> {
        self.table.get(token)
    }

    fn put(&mut self, record: StasisRecord) {
        self.table.put(record);
    }

    fn delete(&mut self, token: &TokenId) -> Option<StasisRecord> {
        self.table.delete(token)
    }

    fn list_ids(&self) -> Vec<TokenId> {
        self.table.ids()
    }

    fn len(&self) -> usize {
        self.table.len()
    }

    fn records(&self) -> Box<dyn Iterator<Item = &StasisRecord> + '_> {
        Box::new(self.table.iter())
    }

    fn is_dirty(&self) -> bool {
        self.table.is_dirty()
    }
}
