pub mod error;
pub mod types;

pub use error::{MissingReason, Result, StasisError};
pub use types::{ActorId, ActorKind, CHUNK_SIZE, ChunkPos, Location, StasisRecord, TokenId};
