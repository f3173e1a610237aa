use alloc::string::String;
use thiserror::Error;

use crate::{CellCount, Coord, ShapeId, StageId};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Invalid board size {0}x{1}")]
    InvalidBoardSize(Coord, Coord),
    #[error("Unknown stage {0}")]
    UnknownStage(StageId),
    #[error("Unknown gem shape {0}")]
    UnknownShape(ShapeId),
    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),
    #[error("Gem area {gem_area} exceeds usable board area {usable_area}")]
    OverCapacity {
        gem_area: CellCount,
        usable_area: CellCount,
    },
    #[error("Failed to place all gems after {0} attempt(s)")]
    PackingFailed(u32),
    #[error("Requested {requested} dynamite but only {placed} fit")]
    TooManyDynamite { requested: CellCount, placed: CellCount },
    #[error("No stage loaded")]
    NoStageLoaded,
    #[error("Reward for stage {0} is not available")]
    RewardUnavailable(StageId),
    #[error("Reward for stage {0} was already claimed")]
    RewardAlreadyClaimed(StageId),
}

pub type Result<T> = core::result::Result<T, GameError>;
