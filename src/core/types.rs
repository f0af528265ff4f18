use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of a capture token. Primary key of the stasis table.
pub type TokenId = Uuid;

/// Identity of a live actor as tracked by the host.
pub type ActorId = Uuid;

/// Blocks per chunk edge.
pub const CHUNK_SIZE: i32 = 16;

// ============================================================================
// Spatial Types
// ============================================================================

/// Coarse partition coordinate of the host world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkPos {
    pub x: i32,
    pub z: i32,
}

impl ChunkPos {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Chunk containing the given world coordinates.
    pub fn containing(x: f64, z: f64) -> Self {
        Self {
            x: (x.floor() as i32).div_euclid(CHUNK_SIZE),
            z: (z.floor() as i32).div_euclid(CHUNK_SIZE),
        }
    }

    /// Block coordinates at the middle of the chunk.
    pub fn center_block(&self) -> (i32, i32) {
        (self.x * CHUNK_SIZE + 8, self.z * CHUNK_SIZE + 8)
    }
}

impl fmt::Display for ChunkPos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.x, self.z)
    }
}

/// A point in a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }

    pub fn chunk(&self) -> ChunkPos {
        ChunkPos::containing(self.x, self.z)
    }

    /// Same coordinates in another world.
    pub fn in_world(&self, world: impl Into<String>) -> Self {
        Self {
            world: world.into(),
            ..self.clone()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@({:.1}, {:.1}, {:.1})", self.world, self.x, self.y, self.z)
    }
}

// ============================================================================
// Actor Kinds
// ============================================================================

macro_rules! actor_kinds {
    ($($variant:ident => $tag:literal),+ $(,)?) => {
        /// Closed set of actor kinds that can sit in stasis.
        ///
        /// This is the full capturable set. Capture triggers must refuse any
        /// other kind before calling `park`; a persisted entry with a tag
        /// outside this list is dropped on load and reported through
        /// `DroppedEntry::unsupported_kind`.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum ActorKind {
            $($variant),+
        }

        impl ActorKind {
            pub const ALL: &'static [ActorKind] = &[$(ActorKind::$variant),+];

            /// Persisted tag, e.g. `IRON_GOLEM`.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(ActorKind::$variant => $tag),+
                }
            }
        }

        impl FromStr for ActorKind {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($tag => Ok(ActorKind::$variant),)+
                    other => Err(format!("unknown actor kind '{}'", other)),
                }
            }
        }
    };
}

actor_kinds! {
    Allay => "ALLAY",
    Axolotl => "AXOLOTL",
    Bee => "BEE",
    Cat => "CAT",
    Chicken => "CHICKEN",
    Cow => "COW",
    Creeper => "CREEPER",
    Donkey => "DONKEY",
    Enderman => "ENDERMAN",
    Fox => "FOX",
    Frog => "FROG",
    Goat => "GOAT",
    Horse => "HORSE",
    IronGolem => "IRON_GOLEM",
    Llama => "LLAMA",
    Mooshroom => "MOOSHROOM",
    Mule => "MULE",
    Panda => "PANDA",
    Parrot => "PARROT",
    Pig => "PIG",
    Rabbit => "RABBIT",
    Sheep => "SHEEP",
    Skeleton => "SKELETON",
    Slime => "SLIME",
    Spider => "SPIDER",
    Turtle => "TURTLE",
    Villager => "VILLAGER",
    Wolf => "WOLF",
    Zombie => "ZOMBIE",
}

impl fmt::Display for ActorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl Serialize for ActorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActorKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// Stasis Record
// ============================================================================

/// One parked actor. Created by `park`, never updated in place.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StasisRecord {
    pub token: TokenId,
    pub world: String,
    pub actor: ActorId,
    pub chunk: ChunkPos,
    pub kind: ActorKind,
}

impl StasisRecord {
    pub fn new(
        token: TokenId,
        world: impl Into<String>,
        actor: ActorId,
        chunk: ChunkPos,
        kind: ActorKind,
    ) -> Self {
        Self {
            token,
            world: world.into(),
            actor,
            chunk,
            kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunk_containing_handles_negative_coordinates() {
        assert_eq!(ChunkPos::containing(0.0, 15.9), ChunkPos::new(0, 0));
        assert_eq!(ChunkPos::containing(16.0, 31.0), ChunkPos::new(1, 1));
        assert_eq!(ChunkPos::containing(-0.5, -16.0), ChunkPos::new(-1, -1));
        assert_eq!(ChunkPos::containing(-16.5, -17.0), ChunkPos::new(-2, -2));
    }

    #[test]
    fn test_chunk_center_block() {
        assert_eq!(ChunkPos::new(0, 0).center_block(), (8, 8));
        assert_eq!(ChunkPos::new(-1, 2).center_block(), (-8, 40));
    }

    #[test]
    fn test_actor_kind_tags() {
        assert_eq!("IRON_GOLEM".parse::<ActorKind>().unwrap(), ActorKind::IronGolem);
        assert_eq!(ActorKind::Mooshroom.to_string(), "MOOSHROOM");
        assert!("iron_golem".parse::<ActorKind>().is_err());
        for kind in ActorKind::ALL {
            assert_eq!(kind.as_str().parse::<ActorKind>().unwrap(), *kind);
        }
    }

    #[test]
    fn test_actor_kind_serde_uses_tag() {
        let json = serde_json::to_string(&ActorKind::Pig).unwrap();
        assert_eq!(json, "\"PIG\"");
        let bad: std::result::Result<ActorKind, _> = serde_json::from_str("\"DRAGON\"");
        assert!(bad.is_err());
    }
}
