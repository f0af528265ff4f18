//! Boundary between the stasis core and the host game server.
//!
//! The host owns worlds, chunks and actors. The stasis core only reaches them
//! through these traits, so it can run against a real server adapter or the
//! in-memory [`sim::SimHost`].

pub mod sim;

use crate::core::{ActorId, ActorKind, ChunkPos, Location};

/// World, chunk and terrain access.
pub trait HostWorld {
    /// True if a world with this name is currently loaded.
    fn world_exists(&self, world: &str) -> bool;

    fn is_chunk_loaded(&self, world: &str, chunk: ChunkPos) -> bool;

    /// Force a chunk to load. Returns false if the world does not exist.
    fn load_chunk(&mut self, world: &str, chunk: ChunkPos) -> bool;

    /// Y of the highest solid block at the given block column.
    fn surface_height(&self, world: &str, block_x: i32, block_z: i32) -> Option<i32>;
}

/// Actor registry and live-state control.
///
/// `freeze` and `thaw` are single cohesive transitions. Adapters apply every
/// flag the actor supports and silently skip the rest.
pub trait HostActors {
    /// True if the actor can be resolved to a live handle right now.
    fn actor_exists(&self, actor: ActorId) -> bool;

    fn actor_location(&self, actor: ActorId) -> Option<Location>;

    fn actor_kind(&self, actor: ActorId) -> Option<ActorKind>;

    /// Disable AI, collision, visibility, damage, sound, despawn-when-far and gravity.
    fn freeze(&mut self, actor: ActorId);

    /// Re-enable AI, collision, visibility, damage, sound and gravity.
    ///
    /// Despawn-when-far stays disabled.
    fn thaw(&mut self, actor: ActorId);

    /// Returns false if the actor could not be moved.
    fn teleport(&mut self, actor: ActorId, to: &Location) -> bool;

    /// Zero velocity and accumulated fall distance.
    fn reset_motion(&mut self, actor: ActorId);
}

/// Everything the stasis service needs from its host.
pub trait StasisHost: HostWorld + HostActors {}

impl<T: HostWorld + HostActors + ?Sized> StasisHost for T {}

/// Stasis-relevant live flags of an actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActorFlags {
    pub ai: bool,
    pub collidable: bool,
    pub invisible: bool,
    pub invulnerable: bool,
    pub silent: bool,
    pub remove_when_far: bool,
    pub gravity: bool,
}

impl ActorFlags {
    /// Flags of a freshly spawned, fully interactive actor.
    pub const LIVE: ActorFlags = ActorFlags {
        ai: true,
        collidable: true,
        invisible: false,
        invulnerable: false,
        silent: false,
        remove_when_far: true,
        gravity: true,
    };

    /// Apply the stasis transition.
    pub fn frozen(self) -> Self {
        Self {
            ai: false,
            collidable: false,
            invisible: true,
            invulnerable: true,
            silent: true,
            remove_when_far: false,
            gravity: false,
        }
    }

    /// Reverse the stasis transition, keeping `remove_when_far` as is.
    pub fn thawed(self) -> Self {
        Self {
            ai: true,
            collidable: true,
            invisible: false,
            invulnerable: false,
            silent: false,
            gravity: true,
            ..self
        }
    }

    /// True when the actor is fully parked.
    pub fn is_frozen(&self) -> bool {
        !self.ai
            && !self.collidable
            && self.invisible
            && self.invulnerable
            && self.silent
            && !self.remove_when_far
            && !self.gravity
    }

    /// True when the actor can move, collide, be seen, be hurt and make sound.
    pub fn is_interactive(&self) -> bool {
        self.ai && self.collidable && !self.invisible && !self.invulnerable && !self.silent && self.gravity
    }
}

impl Default for ActorFlags {
    fn default() -> Self {
        Self::LIVE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_freeze_thaw_round_trip_keeps_persistence() {
        let frozen = ActorFlags::LIVE.frozen();
        assert!(frozen.is_frozen());
        assert!(!frozen.is_interactive());

        let thawed = frozen.thawed();
        assert!(thawed.is_interactive());
        assert!(!thawed.remove_when_far);
        assert_ne!(thawed, ActorFlags::LIVE);
    }
}
