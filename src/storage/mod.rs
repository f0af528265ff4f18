pub mod engine;
pub mod memory;
pub mod persistence;
pub mod table;

pub use engine::{LoadReport, RecordStore};
pub use memory::MemoryRecordStore;
pub use persistence::{DecodedTable, DroppedEntry, FileRecordStore, decode_table, encode_table};
pub use table::RecordTable;
