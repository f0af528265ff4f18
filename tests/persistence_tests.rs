//! Stasis table durability across restarts

use stasis_vault::host::sim::SimHost;
use stasis_vault::{
    ActorKind, ChunkPos, FileRecordStore, Location, RecordStore, StasisConfig, StasisRecord,
    StasisService,
};
use std::fs;
use tempfile::TempDir;
use uuid::Uuid;

#[test]
fn test_records_survive_reopen() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stasis.json");

    let record = StasisRecord::new(
        Uuid::new_v4(),
        "world_nether",
        Uuid::new_v4(),
        ChunkPos::new(-7, 12),
        ActorKind::IronGolem,
    );
    {
        let (mut store, report) = FileRecordStore::open(&path).unwrap();
        assert_eq!(report.loaded, 0);
        store.put(record.clone());
        store.save().unwrap();
    }

    let (store, report) = FileRecordStore::open(&path).unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.dropped, 0);
    assert_eq!(store.get(&record.token), Some(&record));
    assert!(!store.is_dirty());
}

#[test]
fn test_file_uses_flat_token_keyed_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stasis.json");
    let token = Uuid::new_v4();
    let actor = Uuid::new_v4();

    let mut store = FileRecordStore::new(&path);
    store.put(StasisRecord::new(token, "world", actor, ChunkPos::new(3, -4), ActorKind::Cow));
    store.save().unwrap();

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let entry = &raw[token.to_string()];
    assert_eq!(entry["world"], "world");
    assert_eq!(entry["uuid"], actor.to_string());
    assert_eq!(entry["chunkX"], 3);
    assert_eq!(entry["chunkZ"], -4);
    assert_eq!(entry["type"], "COW");
}

#[test]
fn test_corrupt_entries_dropped_and_compacted_on_save() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stasis.json");
    let good = Uuid::new_v4();
    let actor = Uuid::new_v4();
    let raw = format!(
        r#"{{
            "{good}": {{"world": "world", "uuid": "{actor}", "chunkX": 0, "chunkZ": 1, "type": "PIG"}},
            "{missing_world}": {{"uuid": "{actor}", "chunkX": 0, "chunkZ": 1, "type": "PIG"}},
            "{bad_kind}": {{"world": "world", "uuid": "{actor}", "chunkX": 0, "chunkZ": 1, "type": "DRAGON"}},
            "not-a-uuid": {{"world": "world", "uuid": "{actor}", "chunkX": 0, "chunkZ": 1, "type": "PIG"}}
        }}"#,
        missing_world = Uuid::new_v4(),
        bad_kind = Uuid::new_v4(),
    );
    fs::write(&path, raw).unwrap();

    let (mut store, report) = FileRecordStore::open(&path).unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(report.dropped, 3);
    assert_eq!(store.list_ids(), vec![good]);

    store.save().unwrap();
    let decoded = FileRecordStore::new(&path).read_file().unwrap();
    assert_eq!(decoded.records.len(), 1);
    assert!(decoded.dropped.is_empty());
}

#[test]
fn test_unreadable_document_is_a_persistence_failure() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("stasis.json");
    fs::write(&path, "[1, 2, 3]").unwrap();

    assert!(matches!(
        FileRecordStore::open(&path),
        Err(stasis_vault::StasisError::PersistenceFailure(_))
    ));
}

#[test]
fn test_service_restart_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let config = StasisConfig::default().with_stash("world", 0.0, 300.0, 0.0);
    let mut host = SimHost::new();
    host.add_world("world", 64);

    let kept = host.spawn(ActorKind::Mule, Location::new("world", 100.0, 65.0, 100.0));
    let lost = host.spawn(ActorKind::Donkey, Location::new("world", -100.0, 65.0, 100.0));
    let (kept_token, lost_token) = (Uuid::new_v4(), Uuid::new_v4());
    {
        let (mut stasis, mut startup) =
            stasis_vault::open_file_service(temp_dir.path(), config.clone()).unwrap();
        stasis.tick(&mut host);
        assert_eq!(startup.try_report().unwrap().unwrap().checked, 0);

        stasis.park(&mut host, kept, kept_token).unwrap();
        stasis.park(&mut host, lost, lost_token).unwrap();
        assert!(!stasis.stats().dirty);
    }

    // The donkey disappears while the server is down.
    host.kill(lost);

    let (mut stasis, mut startup) =
        stasis_vault::open_file_service(temp_dir.path(), config.clone()).unwrap();
    assert_eq!(stasis.len(), 2);
    let report = loop {
        stasis.tick(&mut host);
        if let Some(outcome) = startup.try_report() {
            break outcome.unwrap();
        }
    };
    assert_eq!(report.removed, 1);
    assert!(stasis.contains(&kept_token));
    assert!(!stasis.contains(&lost_token));

    // The reconcile removal was saved.
    let (store, _) = FileRecordStore::open(config.data_file(temp_dir.path())).unwrap();
    assert_eq!(store.list_ids(), vec![kept_token]);

    let released = stasis
        .release(&mut host, kept_token, &Location::new("world", 1.0, 65.0, 1.0))
        .unwrap();
    assert_eq!(released.kind, ActorKind::Mule);
}

#[test]
fn test_config_file_drives_service_open() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("stasis-config.json");
    fs::write(
        &config_path,
        r#"{"stash": {"world": "vault", "y": 250}, "capacity": {"max-total": 2}}"#,
    )
    .unwrap();

    let config = StasisConfig::from_json_file(&config_path).unwrap();
    assert_eq!(config.stash.world, "vault");
    assert_eq!(config.stash.y, 250.0);
    assert!(config.capacity.enabled);
    assert_eq!(config.capacity.max_total, 2);

    let store = FileRecordStore::new(config.data_file(temp_dir.path()));
    let (stasis, report) = StasisService::open(store, config).unwrap();
    assert_eq!(report.loaded, 0);
    assert_eq!(stasis.capacity().limit(), 2);
}
