use crate::core::{ActorId, Result, StasisRecord, TokenId};

/// Outcome of loading a stasis table from stable storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    /// Entries decoded into the in-memory table
    pub loaded: usize,
    /// Entries dropped as corrupt
    pub dropped: usize,
}

/// Record store trait - allows pluggable persistence backends
///
/// The in-memory table is authoritative between saves. Mutations only mark
/// the table dirty; `save` persists the whole table at once.
pub trait RecordStore {
    /// Replace the in-memory table with the persisted one
    fn load(&mut self) -> Result<LoadReport>;

    /// Persist the full table
    fn save(&mut self) -> Result<()>;

    /// Look up a record by token
    fn get(&self, token: &TokenId) -> Option<&StasisRecord>;

    /// Insert or overwrite the record for `record.token`
    fn put(&mut self, record: StasisRecord);

    /// Remove a record, returning it if present
    fn delete(&mut self, token: &TokenId) -> Option<StasisRecord>;

    /// All current tokens, order irrelevant
    fn list_ids(&self) -> Vec<TokenId>;

    /// Number of records
    fn len(&self) -> usize;

    /// Iterate over every record
    fn records(&self) -> Box<dyn Iterator<Item = &StasisRecord> + '_>;

    /// True when the table changed since the last successful load or save
    fn is_dirty(&self) -> bool;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn contains(&self, token: &TokenId) -> bool {
        self.get(token).is_some()
    }

    /// Token of the record holding `actor`, if any
    fn find_by_actor(&self, actor: &ActorId) -> Option<TokenId> {
        self.records()
            .find(|record| record.actor == *actor)
            .map(|record| record.token)
    }
}
