use serde::{Deserialize, Serialize};

use crate::*;

/// Notifications for whoever drives the session, queued in the order they happened.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    StageChanged(StageId),
    GemSpawned {
        placement: Placement,
        rung: SpawnRung,
    },
    /// Every cell of the gem has been dug.
    GemCollected(GemId),
    DynamiteExploded(Coord2),
    NeedMorePickaxes {
        needed: u32,
        available: u32,
    },
    StageCompleted(StageId),
    AllStagesCompleted,
    RewardClaimed(Reward),
}
