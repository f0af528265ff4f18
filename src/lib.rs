// ============================================================================
// Stasis Vault Library
// ============================================================================

pub mod config;
pub mod core;
pub mod host;
pub mod prelude;
pub mod scheduler;
pub mod stasis;
pub mod storage;

// Re-export main types for convenience
pub use crate::config::StasisConfig;
pub use crate::core::{
    ActorId, ActorKind, ChunkPos, Location, MissingReason, Result, StasisError, StasisRecord,
    TokenId,
};
pub use crate::host::{ActorFlags, HostActors, HostWorld, StasisHost};
pub use crate::stasis::{
    CapacityGuard, ReconcileHandle, ReconcileReport, ReconcileTrigger, StasisService, StasisStats,
    TickReport,
};
pub use crate::storage::{FileRecordStore, LoadReport, MemoryRecordStore, RecordStore};

// ============================================================================
// Bootstrap
// ============================================================================

/// Open the file-backed service for a data directory and schedule the
/// startup reconcile pass.
///
/// This is the usual server start sequence: load the table, then let the tick
/// loop validate it in batches.
///
/// # Examples
///
/// ```
/// use stasis_vault::{ActorKind, Location, StasisConfig};
/// use stasis_vault::host::sim::SimHost;
/// use uuid::Uuid;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let data_dir = tempfile::TempDir::new()?;
/// let mut host = SimHost::new();
/// host.add_world("world", 64);
///
/// let (mut service, mut startup) = stasis_vault::open_file_service(
///     data_dir.path(),
///     StasisConfig::default().with_stash("world", 0.0, 300.0, 0.0),
/// )?;
///
/// let cow = host.spawn(ActorKind::Cow, Location::new("world", 12.0, 65.0, 4.0));
/// let token = Uuid::new_v4();
/// service.park(&mut host, cow, token)?;
///
/// service.tick(&mut host);
/// assert_eq!(startup.try_report().unwrap()?.checked, 0);
///
/// service.release(&mut host, token, &Location::new("world", 20.0, 65.0, 4.0))?;
/// service.tick(&mut host);
/// assert!(host.actor(cow).unwrap().flags.is_interactive());
/// # Ok(())
/// # }
/// ```
pub fn open_file_service(
    data_dir: &std::path::Path,
    config: StasisConfig,
) -> Result<(StasisService<FileRecordStore>, ReconcileHandle)> {
    let store = FileRecordStore::new(config.data_file(data_dir));
    let (mut service, _) = StasisService::open(store, config)?;
    let handle = service.reconcile_on_startup();
    Ok((service, handle))
}
