//! Deterministic in-memory host.
//!
//! Actors are only resolvable while their world exists and the chunk they
//! stand in is loaded, which mirrors how a real server's entity registry
//! behaves for unloaded chunks.

use super::{ActorFlags, HostActors, HostWorld};
use crate::core::{ActorId, ActorKind, ChunkPos, Location};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct SimWorld {
    loaded_chunks: HashSet<ChunkPos>,
    surface_y: i32,
    heights: HashMap<(i32, i32), i32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimActor {
    pub kind: ActorKind,
    pub location: Location,
    pub flags: ActorFlags,
    pub velocity: [f64; 3],
    pub fall_distance: f32,
    pub teleports: usize,
}

#[derive(Debug, Clone, Default)]
pub struct SimHost {
    worlds: HashMap<String, SimWorld>,
    actors: HashMap<ActorId, SimActor>,
    chunk_loads: usize,
}

impl SimHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a flat world whose surface sits at `surface_y`.
    pub fn add_world(&mut self, name: &str, surface_y: i32) {
        self.worlds.insert(
            name.to_string(),
            SimWorld {
                loaded_chunks: HashSet::new(),
                surface_y,
                heights: HashMap::new(),
            },
        );
    }

    /// Unload a world. Its actors stay registered but become unresolvable.
    pub fn remove_world(&mut self, name: &str) {
        self.worlds.remove(name);
    }

    pub fn set_surface(&mut self, world: &str, block_x: i32, block_z: i32, y: i32) {
        if let Some(w) = self.worlds.get_mut(world) {
            w.heights.insert((block_x, block_z), y);
        }
    }

    pub fn unload_chunk(&mut self, world: &str, chunk: ChunkPos) {
        if let Some(w) = self.worlds.get_mut(world) {
            w.loaded_chunks.remove(&chunk);
        }
    }

    /// Spawn a live actor, loading the chunk it lands in.
    pub fn spawn(&mut self, kind: ActorKind, location: Location) -> ActorId {
        let id = Uuid::new_v4();
        self.mark_loaded(&location.world, location.chunk());
        self.actors.insert(
            id,
            SimActor {
                kind,
                location,
                flags: ActorFlags::LIVE,
                velocity: [0.0; 3],
                fall_distance: 0.0,
                teleports: 0,
            },
        );
        id
    }

    /// Remove an actor from the registry entirely.
    pub fn kill(&mut self, actor: ActorId) -> Option<SimActor> {
        self.actors.remove(&actor)
    }

    pub fn actor(&self, actor: ActorId) -> Option<&SimActor> {
        self.actors.get(&actor)
    }

    pub fn set_motion(&mut self, actor: ActorId, velocity: [f64; 3], fall_distance: f32) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.velocity = velocity;
            a.fall_distance = fall_distance;
        }
    }

    /// Number of forced chunk loads performed through `load_chunk`.
    pub fn chunk_loads(&self) -> usize {
        self.chunk_loads
    }

    fn mark_loaded(&mut self, world: &str, chunk: ChunkPos) -> bool {
        match self.worlds.get_mut(world) {
            Some(w) => {
                w.loaded_chunks.insert(chunk);
                true
            }
            None => false,
        }
    }
}

impl HostWorld for SimHost {
    fn world_exists(&self, world: &str) -> bool {
        self.worlds.contains_key(world)
    }

    fn is_chunk_loaded(&self, world: &str, chunk: ChunkPos) -> bool {
        self.worlds
            .get(world)
            .is_some_and(|w| w.loaded_chunks.contains(&chunk))
    }

    fn load_chunk(&mut self, world: &str, chunk: ChunkPos) -> bool {
        let loaded = self.mark_loaded(world, chunk);
        if loaded {
            self.chunk_loads += 1;
        }
        loaded
    }

    fn surface_height(&self, world: &str, block_x: i32, block_z: i32) -> Option<i32> {
        let w = self.worlds.get(world)?;
        Some(*w.heights.get(&(block_x, block_z)).unwrap_or(&w.surface_y))
    }
}

impl HostActors for SimHost {
    fn actor_exists(&self, actor: ActorId) -> bool {
        self.actors
            .get(&actor)
            .is_some_and(|a| self.is_chunk_loaded(&a.location.world, a.location.chunk()))
    }

    fn actor_location(&self, actor: ActorId) -> Option<Location> {
        if !self.actor_exists(actor) {
            return None;
        }
        self.actors.get(&actor).map(|a| a.location.clone())
    }

    fn actor_kind(&self, actor: ActorId) -> Option<ActorKind> {
        if !self.actor_exists(actor) {
            return None;
        }
        self.actors.get(&actor).map(|a| a.kind)
    }

    fn freeze(&mut self, actor: ActorId) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.flags = a.flags.frozen();
        }
    }

    fn thaw(&mut self, actor: ActorId) {
        if let Some(a) = self.actors.get_mut(&actor) {
            a.flags = a.flags.thawed();
        }
    }

    fn teleport(&mut self, actor: ActorId, to: &Location) -> bool {
        if !self.actors.contains_key(&actor) || !self.mark_loaded(&to.world, to.chunk()) {
            return false;
        }
        match self.actors.get_mut(&actor) {
            Some(a) => {
                a.location = to.clone();
                a.teleports += 1;
                true
            }
            None => false,
        }
    }

    fn reset_motion(&mut self, actor: ActorId) {
        self.set_motion(actor, [0.0; 3], 0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_resolution_follows_chunk_loading() {
        let mut host = SimHost::new();
        host.add_world("world", 64);
        let spot = Location::new("world", 40.0, 65.0, -3.0);
        let id = host.spawn(ActorKind::Cow, spot.clone());
        assert!(host.actor_exists(id));

        host.unload_chunk("world", spot.chunk());
        assert!(!host.actor_exists(id));
        assert!(host.actor_location(id).is_none());

        assert!(host.load_chunk("world", spot.chunk()));
        assert!(host.actor_exists(id));
        assert_eq!(host.chunk_loads(), 1);
    }

    #[test]
    fn test_teleport_into_missing_world_fails() {
        let mut host = SimHost::new();
        host.add_world("world", 64);
        let id = host.spawn(ActorKind::Pig, Location::new("world", 0.0, 65.0, 0.0));
        assert!(!host.teleport(id, &Location::new("nether", 0.0, 65.0, 0.0)));
        assert_eq!(host.actor(id).unwrap().location.world, "world");
    }

    #[test]
    fn test_surface_height_overrides() {
        let mut host = SimHost::new();
        host.add_world("world", 64);
        host.set_surface("world", 8, 8, 90);
        assert_eq!(host.surface_height("world", 8, 8), Some(90));
        assert_eq!(host.surface_height("world", 0, 0), Some(64));
        assert_eq!(host.surface_height("nether", 0, 0), None);
    }
}
