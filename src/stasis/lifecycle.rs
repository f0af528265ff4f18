//! FREE -> PARKED -> FREE transitions.
//!
//! Park mutates the actor first and records it second; release restores the
//! actor first and deletes the record second. Nothing in between is persisted.

use super::{DeferredTask, StasisService};
use crate::core::{
    ActorId, Location, MissingReason, Result, StasisError, StasisRecord, TokenId,
};
use crate::host::StasisHost;
use crate::storage::RecordStore;
use log::{debug, warn};

/// Ticks between a release teleport and the thaw.
pub const THAW_DELAY_TICKS: u64 = 1;

impl<S: RecordStore> StasisService<S> {
    /// Freeze `actor`, move it to the stash and record it under `token`.
    ///
    /// Refusals (`DuplicateToken`, `AlreadyParked`, `CapacityExceeded`,
    /// `ActorUnavailable`) leave both the actor and the table untouched. A
    /// failed save does not fail the park: the record stays in memory and the
    /// save is retried from `tick`.
    pub fn park<H: StasisHost + ?Sized>(
        &mut self,
        host: &mut H,
        actor: ActorId,
        token: TokenId,
    ) -> Result<StasisRecord> {
        if self.store.contains(&token) {
            return Err(StasisError::DuplicateToken(token));
        }
        if let Some(existing) = self.store.find_by_actor(&actor) {
            return Err(StasisError::AlreadyParked {
                actor,
                token: existing,
            });
        }
        self.guard.check(self.store.len())?;

        let kind = host
            .actor_kind(actor)
            .ok_or(StasisError::ActorUnavailable(actor))?;
        let origin = host
            .actor_location(actor)
            .ok_or(StasisError::ActorUnavailable(actor))?;

        host.freeze(actor);

        let stash = self.stash_location(host, &origin.world);
        if !host.teleport(actor, &stash) {
            warn!("Could not move actor {} to stash {}", actor, stash);
        }

        let parked_at = host.actor_location(actor).unwrap_or(stash);
        let record = StasisRecord::new(token, parked_at.world.clone(), actor, parked_at.chunk(), kind);
        self.store.put(record.clone());
        self.persist("park");

        debug!(
            "Parked {} {} under token {} at {}",
            kind, actor, token, parked_at
        );
        Ok(record)
    }

    /// Bring the actor parked under `token` to `target` and delete its record.
    ///
    /// The actor is teleported and its motion reset immediately; its live
    /// flags come back `THAW_DELAY_TICKS` later from `tick`. Success is
    /// reported as soon as the record is gone from the table.
    pub fn release<H: StasisHost + ?Sized>(
        &mut self,
        host: &mut H,
        token: TokenId,
        target: &Location,
    ) -> Result<StasisRecord> {
        let record = self
            .store
            .get(&token)
            .cloned()
            .ok_or_else(|| StasisError::not_found(token, MissingReason::NoRecord))?;

        if !host.world_exists(&record.world) {
            return Err(StasisError::not_found(token, MissingReason::WorldUnavailable));
        }
        if !host.world_exists(&target.world) {
            return Err(StasisError::InvalidTarget(format!(
                "world '{}' is not loaded",
                target.world
            )));
        }

        if !host.is_chunk_loaded(&record.world, record.chunk) {
            host.load_chunk(&record.world, record.chunk);
        }

        if !host.actor_exists(record.actor) {
            warn!(
                "Stasis entry {} points at missing actor {}; dropping it",
                token, record.actor
            );
            self.store.delete(&token);
            self.persist("release of a missing actor");
            return Err(StasisError::not_found(token, MissingReason::ActorGone));
        }

        if !host.teleport(record.actor, target) {
            return Err(StasisError::InvalidTarget(format!(
                "actor {} could not be moved to {}",
                record.actor, target
            )));
        }
        host.reset_motion(record.actor);
        self.scheduler
            .schedule_in(THAW_DELAY_TICKS, DeferredTask::Thaw(record.actor));

        self.store.delete(&token);
        self.persist("release");

        debug!(
            "Released {} {} from token {} to {}",
            record.kind, record.actor, token, target
        );
        Ok(record)
    }

    /// The configured stash, or the same coordinates in `fallback_world` when
    /// the configured world is not loaded.
    pub fn stash_location<H: StasisHost + ?Sized>(&self, host: &H, fallback_world: &str) -> Location {
        let stash = self.config.stash.location();
        if host.world_exists(&stash.world) {
            stash
        } else {
            warn!(
                "Stash world '{}' is not loaded; using '{}'",
                stash.world, fallback_world
            );
            stash.in_world(fallback_world)
        }
    }
}
