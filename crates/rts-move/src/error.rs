use rts_core::EntityId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MoveError {
    /// The save stream could not be written or parsed.  On load this fires
    /// before anything is applied (the document parses as a whole), so a
    /// malformed stream never half-applies.
    #[error("save stream error: {0}")]
    Stream(#[from] serde_json::Error),

    /// The save references an entity the host has not re-created.  Loading
    /// aborts here; entities applied before this one keep their loaded
    /// state.
    #[error("saved state references missing entity {0}")]
    MissingEntity(EntityId),
}

pub type MoveResult<T> = Result<T, MoveError>;
