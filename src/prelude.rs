//! Common imports grouped by who uses them.
//!
//! `host` is what a server adapter needs to implement; `service` is what
//! gameplay and admin code call.

pub mod host {
    //! Traits and types for wiring a game server into the stasis core.
    pub use crate::core::{ActorId, ActorKind, ChunkPos, Location};
    pub use crate::host::{ActorFlags, HostActors, HostWorld, StasisHost};
}

pub mod service {
    //! Service surface for capture/release triggers and admin tooling.
    pub use crate::config::StasisConfig;
    pub use crate::core::{MissingReason, Result, StasisError, StasisRecord, TokenId};
    pub use crate::stasis::{ReconcileHandle, ReconcileReport, StasisService, StasisStats};
    pub use crate::storage::{FileRecordStore, MemoryRecordStore, RecordStore};
}
