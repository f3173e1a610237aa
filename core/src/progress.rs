use alloc::collections::BTreeSet;
use serde::{Deserialize, Serialize};

use crate::StageId;

/// Persisted player progress.
pub trait ProgressStore {
    /// Furthest stage the player may start, `None` before any progress.
    fn highest_reached(&self) -> Option<StageId>;

    /// Raises the reached stage. Lower values are ignored; returns whether anything changed.
    fn record_reached(&mut self, stage: StageId) -> bool;

    fn is_reward_claimed(&self, stage: StageId) -> bool;

    fn mark_reward_claimed(&mut self, stage: StageId);
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryProgress {
    #[serde(default)]
    reached: Option<StageId>,
    #[serde(default)]
    claimed: BTreeSet<StageId>,
}

impl ProgressStore for MemoryProgress {
    fn highest_reached(&self) -> Option<StageId> {
        self.reached
    }

    fn record_reached(&mut self, stage: StageId) -> bool {
        if self.reached.is_some_and(|reached| reached >= stage) {
            return false;
        }
        self.reached = Some(stage);
        true
    }

    fn is_reward_claimed(&self, stage: StageId) -> bool {
        self.claimed.contains(&stage)
    }

    fn mark_reward_claimed(&mut self, stage: StageId) {
        self.claimed.insert(stage);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reached_only_advances() {
        let mut progress = MemoryProgress::default();

        assert!(progress.record_reached(3));
        assert!(!progress.record_reached(2));
        assert!(!progress.record_reached(3));
        assert_eq!(progress.highest_reached(), Some(3));
    }
}
