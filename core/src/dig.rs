use alloc::vec::Vec;
use core::time::Duration;
use rand::prelude::*;
use smallvec::SmallVec;
use web_time::Instant;

use crate::*;

/// Processes one dig at a time: gates, payment, reveal, blast, gem spawning and collection.
#[derive(Clone, Debug)]
pub struct DigController {
    cooldown: Duration,
    reveal_chance: f64,
    oracle: FeasibilityOracle,
    last_dig: Option<Instant>,
    input_enabled: bool,
}

impl DigController {
    pub fn new(config: &EngineConfig) -> Self {
        let reveal_chance = if config.reveal_chance.is_nan() {
            log::warn!("Reveal chance is NaN, using 0");
            0.0
        } else {
            config.reveal_chance.clamp(0.0, 1.0)
        };
        Self {
            cooldown: config.dig_cooldown(),
            reveal_chance,
            oracle: FeasibilityOracle::new(config.oracle_attempts),
            last_dig: None,
            input_enabled: true,
        }
    }

    pub fn is_input_enabled(&self) -> bool {
        self.input_enabled
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.input_enabled = enabled;
    }

    pub fn oracle(&self) -> &FeasibilityOracle {
        &self.oracle
    }

    fn cooling_down(&self, now: Instant) -> bool {
        self.last_dig
            .is_some_and(|last| now.saturating_duration_since(last) < self.cooldown)
    }

    /// Digs `coords` on `stage`, paying from `ledger`.
    ///
    /// A rejected dig leaves every piece of state as it was, except for the `NeedMorePickaxes` event.
    pub fn dig<L, R>(
        &mut self,
        stage: &mut Stage,
        coords: Coord2,
        now: Instant,
        ledger: &mut L,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
    ) -> DigOutcome
    where
        L: ResourceLedger + ?Sized,
        R: Rng,
    {
        use DigRejection::*;

        if !self.input_enabled {
            return DigOutcome::Rejected(InputDisabled);
        }
        let Ok(coords) = stage.board.validate_coords(coords) else {
            return DigOutcome::Rejected(OutOfBounds);
        };
        if self.cooling_down(now) {
            return DigOutcome::Rejected(CoolingDown);
        }
        let cell = stage.board.cell_at(coords);
        if cell.is_revealed() {
            return DigOutcome::Rejected(AlreadyRevealed);
        }
        let cost = u32::from(cell.stone_layers());
        if !ledger.has_enough(cost) || !ledger.spend(cost) {
            let available = ledger.balance();
            log::debug!("Dig at {coords:?} needs {cost} pickaxe(s), have {available}");
            events.push(GameEvent::NeedMorePickaxes {
                needed: cost,
                available,
            });
            return DigOutcome::Rejected(NotEnoughPickaxes {
                needed: cost,
                available,
            });
        }

        self.last_dig = Some(now);
        stage.board.dig(coords);
        let mut report = DigReport {
            cost,
            ..Default::default()
        };
        report.revealed.push(coords);

        if cell.is_dynamite() {
            log::debug!("Dynamite at {coords:?}");
            stage.board.exclude(coords);
            report.exploded = true;
            events.push(GameEvent::DynamiteExploded(coords));

            let blast: SmallVec<[Coord2; 8]> = stage.board.iter_neighbors(coords).collect();
            for neighbor in blast {
                if stage.board.dig(neighbor).is_some() {
                    report.revealed.push(neighbor);
                    self.resolve(stage, neighbor, rng, events, &mut report);
                }
            }
        } else {
            self.resolve(stage, coords, rng, events, &mut report);
        }

        if stage.try_complete() {
            log::info!("Stage {} cleared", stage.id());
            self.input_enabled = false;
            report.stage_completed = true;
        }
        DigOutcome::Dug(report)
    }

    /// Decides the fate of a cell that was just dug.
    fn resolve<R: Rng>(
        &self,
        stage: &mut Stage,
        coords: Coord2,
        rng: &mut R,
        events: &mut Vec<GameEvent>,
        report: &mut DigReport,
    ) {
        let cell = stage.board.cell_at(coords);
        if let Some(gem) = cell.occupant() {
            Self::collect_if_uncovered(stage, gem, events, report);
            return;
        }
        if cell.is_dynamite() || stage.pool.unplaced().is_empty() {
            stage.board.exclude(coords);
            return;
        }

        let mut without_cell = None;
        if !rng.random_bool(self.reveal_chance) {
            let answer = self.oracle.check_board(&stage.board, &stage.pool);
            if answer.is_feasible() {
                log::trace!("No gem at {coords:?}");
                stage.board.exclude(coords);
                return;
            }
            log::debug!("Forcing a gem at {coords:?}, the reserve does not fit without it ({answer:?})");
            without_cell = Some(answer);
        }

        if let Some(placement) = spawn_covering(&stage.board, &stage.pool, coords, &self.oracle, rng) {
            Self::spawn(stage, placement, SpawnRung::Targeted, events, report);
            return;
        }

        let answer = without_cell.unwrap_or_else(|| self.oracle.check_board(&stage.board, &stage.pool));
        if answer.is_feasible() {
            log::debug!("No gem fits over {coords:?}, leaving it empty");
        } else if let Some((placement, rung)) =
            spawn_fallback(&stage.board, &stage.pool, coords, &self.oracle, rng)
        {
            Self::spawn(stage, placement, rung, events, report);
        }
        stage.board.exclude(coords);
    }

    fn spawn(
        stage: &mut Stage,
        placement: Placement,
        rung: SpawnRung,
        events: &mut Vec<GameEvent>,
        report: &mut DigReport,
    ) {
        if !commit(&mut stage.board, &mut stage.pool, placement) {
            return;
        }
        log::debug!(
            "Gem {} placed at {:?} ({rung:?}), {} left in reserve",
            placement.gem,
            placement.rect.origin,
            stage.pool.unplaced().len()
        );
        events.push(GameEvent::GemSpawned { placement, rung });
        report.spawned.push(placement);
        Self::collect_if_uncovered(stage, placement.gem, events, report);
    }

    fn collect_if_uncovered(
        stage: &mut Stage,
        gem: GemId,
        events: &mut Vec<GameEvent>,
        report: &mut DigReport,
    ) {
        let uncovered = stage
            .pool
            .gem(gem)
            .cells()
            .iter()
            .all(|&coords| stage.board.cell_at(coords).is_revealed());
        if uncovered && stage.pool.collect(gem) {
            log::debug!("Gem {gem} collected");
            events.push(GameEvent::GemCollected(gem));
            report.collected.push(gem);
        }
    }
}

impl Default for DigController {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}
