//! Read-only accessors and administrative deletes.

use super::StasisService;
use crate::core::{ActorId, ActorKind, Location, StasisRecord, TokenId};
use crate::host::HostWorld;
use crate::storage::RecordStore;
use log::info;

/// Point-in-time view of the service for admin tooling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StasisStats {
    pub parked: usize,
    pub capacity_enabled: bool,
    pub capacity_limit: usize,
    pub reconcile_running: bool,
    pub pending_thaws: usize,
    pub dirty: bool,
}

impl<S: RecordStore> StasisService<S> {
    pub fn list_ids(&self) -> Vec<TokenId> {
        self.store.list_ids()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn contains(&self, token: &TokenId) -> bool {
        self.store.contains(token)
    }

    pub fn record(&self, token: &TokenId) -> Option<&StasisRecord> {
        self.store.get(token)
    }

    pub fn kind_of(&self, token: &TokenId) -> Option<ActorKind> {
        self.store.get(token).map(|record| record.kind)
    }

    /// Token holding `actor`, if it is parked.
    pub fn token_for_actor(&self, actor: &ActorId) -> Option<TokenId> {
        self.store.find_by_actor(actor)
    }

    /// Approximate position of a parked actor: the centre of its chunk, one
    /// block above the surface. `None` if the record or its world is missing.
    pub fn location_of<H: HostWorld + ?Sized>(&self, host: &H, token: &TokenId) -> Option<Location> {
        let record = self.store.get(token)?;
        if !host.world_exists(&record.world) {
            return None;
        }
        let (block_x, block_z) = record.chunk.center_block();
        let surface = host.surface_height(&record.world, block_x, block_z)?;
        Some(Location::new(
            record.world.clone(),
            block_x as f64,
            surface as f64 + 1.0,
            block_z as f64,
        ))
    }

    /// Delete a record without touching its actor.
    pub fn remove(&mut self, token: &TokenId) -> Option<StasisRecord> {
        let removed = self.store.delete(token)?;
        info!("Removed stasis entry {} ({})", token, removed.kind);
        self.persist("remove");
        Some(removed)
    }

    /// Delete every record without touching any actor. Returns how many were removed.
    pub fn clear(&mut self) -> usize {
        let ids = self.store.list_ids();
        for token in &ids {
            self.store.delete(token);
        }
        if !ids.is_empty() {
            info!("Cleared {} stasis entries", ids.len());
            self.persist("clear");
        }
        ids.len()
    }

    /// Drop the record of an actor that died or was removed by the host.
    pub fn forget_actor(&mut self, actor: &ActorId) -> Option<StasisRecord> {
        let token = self.store.find_by_actor(actor)?;
        let removed = self.store.delete(&token)?;
        info!("Actor {} left the world; dropped stasis entry {}", actor, token);
        self.persist("actor removal");
        Some(removed)
    }

    pub fn stats(&self) -> StasisStats {
        StasisStats {
            parked: self.store.len(),
            capacity_enabled: self.guard.is_enabled(),
            capacity_limit: self.guard.limit(),
            reconcile_running: self.reconcile.is_some(),
            pending_thaws: self.scheduler.pending(),
            dirty: self.store.is_dirty(),
        }
    }
}
