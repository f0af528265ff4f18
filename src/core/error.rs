use crate::core::types::{ActorId, TokenId};
use std::fmt;
use thiserror::Error;

/// Why a token could not be resolved to a live, parked actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingReason {
    /// No stasis record exists for the token.
    NoRecord,
    /// The record's world is not loaded. The record is kept.
    WorldUnavailable,
    /// The actor could not be resolved after loading its chunk. The record was dropped.
    ActorGone,
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingReason::NoRecord => write!(f, "no stasis record"),
            MissingReason::WorldUnavailable => write!(f, "world unavailable"),
            MissingReason::ActorGone => write!(f, "actor no longer exists"),
        }
    }
}

#[derive(Error, Debug)]
pub enum StasisError {
    #[error("Stasis capacity reached ({limit} parked)")]
    CapacityExceeded { limit: usize },

    #[error("Stasis entry '{token}' not found: {reason}")]
    NotFound { token: TokenId, reason: MissingReason },

    #[error("Token '{0}' already has a stasis record")]
    DuplicateToken(TokenId),

    #[error("Actor '{0}' cannot be resolved")]
    ActorUnavailable(ActorId),

    #[error("Actor '{actor}' is already parked under token '{token}'")]
    AlreadyParked { actor: ActorId, token: TokenId },

    #[error("Invalid release target: {0}")]
    InvalidTarget(String),

    #[error("Persistence failure: {0}")]
    PersistenceFailure(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Interrupted: {0}")]
    Interrupted(String),
}

impl StasisError {
    pub fn not_found(token: TokenId, reason: MissingReason) -> Self {
        Self::NotFound { token, reason }
    }

    /// True for failures where nothing about the actor or the table changed.
    pub fn is_refusal(&self) -> bool {
        matches!(
            self,
            StasisError::CapacityExceeded { .. }
                | StasisError::DuplicateToken(_)
                | StasisError::ActorUnavailable(_)
                | StasisError::AlreadyParked { .. }
                | StasisError::InvalidTarget(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, StasisError>;

