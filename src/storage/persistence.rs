//! File-backed stasis table with atomic whole-file saves

use super::engine::{LoadReport, RecordStore};
use super::table::RecordTable;
use crate::core::{ActorKind, ChunkPos, Result, StasisError, StasisRecord, TokenId};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

// ============================================================================
// On-disk Layout
// ============================================================================

/// One entry of the persisted table, keyed externally by the token string.
///
/// Any missing or extra field makes the entry corrupt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct PersistedEntry {
    world: String,
    uuid: Uuid,
    #[serde(rename = "chunkX")]
    chunk_x: i32,
    #[serde(rename = "chunkZ")]
    chunk_z: i32,
    #[serde(rename = "type")]
    kind: ActorKind,
}

impl PersistedEntry {
    fn from_record(record: &StasisRecord) -> Self {
        Self {
            world: record.world.clone(),
            uuid: record.actor,
            chunk_x: record.chunk.x,
            chunk_z: record.chunk.z,
            kind: record.kind,
        }
    }

    fn into_record(self, token: TokenId) -> StasisRecord {
        StasisRecord {
            token,
            world: self.world,
            actor: self.uuid,
            chunk: ChunkPos::new(self.chunk_x, self.chunk_z),
            kind: self.kind,
        }
    }
}

/// An entry skipped while decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DroppedEntry {
    pub key: String,
    pub reason: String,
    /// Set when the entry was otherwise readable but names an actor kind this
    /// build cannot hold. Its actor is still frozen at the stash.
    pub unsupported_kind: Option<String>,
}

/// Result of decoding a persisted table.
#[derive(Debug, Clone, Default)]
pub struct DecodedTable {
    pub records: Vec<StasisRecord>,
    pub dropped: Vec<DroppedEntry>,
}

/// Decode the persisted JSON table, dropping corrupt entries.
///
/// Fails only when the document itself is unreadable or not an object.
pub fn decode_table(raw: &str) -> Result<DecodedTable> {
    if raw.trim().is_empty() {
        return Ok(DecodedTable::default());
    }
    let document: Value = serde_json::from_str(raw).map_err(|e| {
        StasisError::PersistenceFailure(format!("Failed to parse stasis table: {}", e))
    })?;
    let entries: Map<String, Value> = match document {
        Value::Object(entries) => entries,
        other => {
            return Err(StasisError::PersistenceFailure(format!(
                "Stasis table must be an object, found {}",
                json_kind(&other)
            )));
        }
    };

    let mut decoded = DecodedTable::default();
    for (key, value) in entries {
        let token = match Uuid::parse_str(&key) {
            Ok(token) => token,
            Err(e) => {
                decoded.dropped.push(DroppedEntry {
                    key,
                    reason: format!("invalid token: {}", e),
                    unsupported_kind: None,
                });
                continue;
            }
        };
        let kind_tag = value
            .get("type")
            .and_then(Value::as_str)
            .filter(|tag| tag.parse::<ActorKind>().is_err())
            .map(str::to_string);
        match serde_json::from_value::<PersistedEntry>(value) {
            Ok(entry) if entry.world.trim().is_empty() => decoded.dropped.push(DroppedEntry {
                key,
                reason: "blank world".to_string(),
                unsupported_kind: None,
            }),
            Ok(entry) => decoded.records.push(entry.into_record(token)),
            Err(e) => decoded.dropped.push(match kind_tag {
                Some(tag) => DroppedEntry {
                    key,
                    reason: format!("unsupported actor kind '{}'", tag),
                    unsupported_kind: Some(tag),
                },
                None => DroppedEntry {
                    key,
                    reason: e.to_string(),
                    unsupported_kind: None,
                },
            }),
        }
    }
    Ok(decoded)
}

/// Encode records into the persisted JSON table.
pub fn encode_table<'a>(records: impl IntoIterator<Item = &'a StasisRecord>) -> Result<String> {
    let table: BTreeMap<String, PersistedEntry> = records
        .into_iter()
        .map(|record| (record.token.to_string(), PersistedEntry::from_record(record)))
        .collect();
    serde_json::to_string_pretty(&table).map_err(|e| {
        StasisError::PersistenceFailure(format!("Failed to serialize stasis table: {}", e))
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ============================================================================
// File Record Store
// ============================================================================

/// Record store persisted as a single JSON file.
///
/// Saves go through a temp file in the same directory which is synced and then
/// renamed over the target, so readers only ever see a complete table.
#[derive(Debug)]
pub struct FileRecordStore {
    path: PathBuf,
    table: RecordTable,
}

impl FileRecordStore {
    /// Create a store for `path` with an empty table. Call `load` to read it.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            table: RecordTable::new(),
        }
    }

    /// Create a store and load it in one step.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<(Self, LoadReport)> {
        let mut store = Self::new(path);
        let report = store.load()?;
        Ok((store, report))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and decode the file without touching the in-memory table.
    pub fn read_file(&self) -> Result<DecodedTable> {
        if !self.path.exists() {
            return Ok(DecodedTable::default());
        }
        let raw = fs::read_to_string(&self.path).map_err(|e| {
            StasisError::PersistenceFailure(format!(
                "Failed to read '{}': {}",
                self.path.display(),
                e
            ))
        })?;
        decode_table(&raw)
    }

    fn write_atomically(&self, contents: &str) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&parent).map_err(|e| {
            StasisError::PersistenceFailure(format!("Failed to create data directory: {}", e))
        })?;

        let mut temp = NamedTempFile::new_in(&parent).map_err(|e| {
            StasisError::PersistenceFailure(format!("Failed to create temp file: {}", e))
        })?;
        temp.write_all(contents.as_bytes())
            .map_err(|e| StasisError::PersistenceFailure(format!("Failed to write stasis table: {}", e)))?;
        temp.flush()
            .map_err(|e| StasisError::PersistenceFailure(format!("Failed to flush stasis table: {}", e)))?;
        temp.as_file()
            .sync_all()
            .map_err(|e| StasisError::PersistenceFailure(format!("Failed to sync stasis table: {}", e)))?;
        temp.persist(&self.path).map_err(|e| {
            StasisError::PersistenceFailure(format!("Failed to replace stasis table: {}", e.error))
        })?;
        Ok(())
    }
}

impl RecordStore for FileRecordStore {
    fn load(&mut self) -> Result<LoadReport> {
        let decoded = self.read_file()?;
        for dropped in &decoded.dropped {
            match &dropped.unsupported_kind {
                Some(kind) => warn!(
                    "Dropping stasis entry '{}' from {}: actor kind {} cannot be held; \
                     its actor stays frozen at the stash until removed by hand",
                    dropped.key,
                    self.path.display(),
                    kind
                ),
                None => warn!(
                    "Dropping corrupt stasis entry '{}' from {}: {}",
                    dropped.key,
                    self.path.display(),
                    dropped.reason
                ),
            }
        }
        let report = LoadReport {
            loaded: decoded.records.len(),
            dropped: decoded.dropped.len(),
        };
        self.table.replace_all(decoded.records);
        info!(
            "Loaded {} stasis entries from {} ({} dropped)",
            report.loaded,
            self.path.display(),
            report.dropped
        );
        Ok(report)
    }

    fn save(&mut self) -> Result<()> {
        let contents = encode_table(self.table.iter())?;
        self.write_atomically(&contents)?;
        self.table.mark_clean();
        debug!(
            "Saved {} stasis entries to {}",
            self.table.len(),
            self.path.display()
        );
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
