use core::time::Duration;
use serde::{Deserialize, Serialize};

/// When gems are committed to the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlacementMode {
    /// Gems are placed one at a time, each covering the cell whose dig revealed it.
    #[default]
    Incremental,
    /// Every gem is packed when the stage loads.
    Upfront,
}

/// Engine tunables. Every field has a default, so partial settings files deserialize.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Chance that digging an unclaimed cell spawns a gem there.
    pub reveal_chance: f64,
    /// Minimum time between two accepted digs.
    pub dig_cooldown_ms: u64,
    /// Candidate placements the feasibility oracle may try before giving up.
    pub oracle_attempts: u64,
    /// Full restarts of the up-front packer.
    pub packer_retries: u32,
    /// Candidate placements per packer restart, unbounded when `None`.
    pub packer_attempts: Option<u64>,
    /// Share of the board the gems may cover.
    pub capacity_ratio: f64,
    /// Random probes per stick of dynamite before falling back to a scan.
    pub dynamite_attempts: u32,
    pub placement: PlacementMode,
}

impl EngineConfig {
    pub const fn dig_cooldown(&self) -> Duration {
        Duration::from_millis(self.dig_cooldown_ms)
    }

    pub const fn with_placement(self, placement: PlacementMode) -> Self {
        Self { placement, ..self }
    }

    pub const fn without_cooldown(self) -> Self {
        Self {
            dig_cooldown_ms: 0,
            ..self
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reveal_chance: 0.3,
            dig_cooldown_ms: 300,
            oracle_attempts: 2_000_000,
            packer_retries: 50,
            packer_attempts: None,
            capacity_ratio: 0.9,
            dynamite_attempts: 100,
            placement: PlacementMode::Incremental,
        }
    }
}
