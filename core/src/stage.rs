use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// Live state of the stage being played: its board and gems.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stage {
    config: StageConfig,
    pub(crate) board: Board,
    pub(crate) pool: GemPool,
    completed: bool,
}

impl Stage {
    /// Builds the board of stage `id`.
    ///
    /// In incremental mode only dynamite is laid down, and the board is rerolled until the whole gem set is known to
    /// still fit around it. In up-front mode every gem is packed before the dynamite goes in.
    pub fn load<C, R>(catalog: &C, id: StageId, engine: &EngineConfig, rng: &mut R) -> Result<Self>
    where
        C: StageCatalog + ?Sized,
        R: Rng,
    {
        let config = catalog.stage_config(id)?.clone();
        let pool = GemPool::from_stage(catalog, &config)?;

        let (board, pool) = match engine.placement {
            PlacementMode::Upfront => Self::build_upfront(&config, pool, engine, rng)?,
            PlacementMode::Incremental => Self::build_incremental(&config, pool, engine, rng)?,
        };
        log::debug!(
            "Stage {id}: {}x{} board, {} gem(s), {} dynamite",
            config.width,
            config.height,
            pool.total(),
            board.dynamite_count()
        );

        Ok(Self::from_parts(config, board, pool))
    }

    fn build_upfront<R: Rng>(
        config: &StageConfig,
        mut pool: GemPool,
        engine: &EngineConfig,
        rng: &mut R,
    ) -> Result<(Board, GemPool)> {
        let mut board = Board::new(config.size(), rng)?;
        place_all(&mut board, &mut pool, engine, rng)?;
        board.place_dynamite(config.dynamite, engine.dynamite_attempts, rng)?;
        Ok((board, pool))
    }

    fn build_incremental<R: Rng>(
        config: &StageConfig,
        pool: GemPool,
        engine: &EngineConfig,
        rng: &mut R,
    ) -> Result<(Board, GemPool)> {
        let oracle = FeasibilityOracle::new(engine.oracle_attempts);
        let retries = engine.packer_retries.max(1);

        for attempt in 1..=retries {
            let mut board = Board::new(config.size(), rng)?;
            check_capacity(&board, &pool, engine.capacity_ratio)?;
            board.place_dynamite(config.dynamite, engine.dynamite_attempts, rng)?;

            match oracle.check_board(&board, &pool) {
                Feasibility::Feasible => return Ok((board, pool)),
                answer => log::warn!(
                    "Stage {}: gems do not fit around the dynamite ({answer:?}), attempt {attempt}",
                    config.id
                ),
            }
        }
        log::error!("Stage {}: no dynamite layout leaves room for the gems", config.id);
        Err(GameError::PackingFailed(retries))
    }

    /// Assembles a stage from an explicit board and pool.
    pub fn from_parts(config: StageConfig, board: Board, pool: GemPool) -> Self {
        Self {
            config,
            board,
            pool,
            completed: false,
        }
    }

    pub fn id(&self) -> StageId {
        self.config.id
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn pool(&self) -> &GemPool {
        &self.pool
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Every gem collected, and there was at least one.
    pub fn is_cleared(&self) -> bool {
        let total = self.pool.total();
        total > 0 && self.pool.collected_count() == total
    }

    /// Flags the stage completed the first time it is cleared. Returns whether this call did it.
    pub(crate) fn try_complete(&mut self) -> bool {
        if self.completed || !self.is_cleared() {
            return false;
        }
        self.completed = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_load_places_dynamite_only() {
        let catalog = Catalog::builtin();
        let mut rng = SmallRng::seed_from_u64(17);

        let stage = Stage::load(&catalog, 4, &EngineConfig::default(), &mut rng).unwrap();

        assert_eq!(stage.board().size(), (7, 7));
        assert_eq!(stage.board().dynamite_count(), 2);
        assert_eq!(stage.pool().unplaced().len(), 7);
        assert!(stage.pool().placed().is_empty());
        assert!(!stage.is_cleared());
    }

    #[test]
    fn upfront_load_keeps_dynamite_off_gems() {
        let catalog = Catalog::builtin();
        let mut rng = SmallRng::seed_from_u64(17);
        let engine = EngineConfig::default().with_placement(PlacementMode::Upfront);

        let stage = Stage::load(&catalog, 5, &engine, &mut rng).unwrap();

        assert!(stage.pool().unplaced().is_empty());
        assert_eq!(stage.board().dynamite_count(), 2);
        assert!(
            stage
                .board()
                .iter()
                .all(|(_, cell)| !(cell.is_dynamite() && cell.occupant().is_some()))
        );
    }

    #[test]
    fn unknown_stage_is_an_error() {
        let mut rng = SmallRng::seed_from_u64(0);

        assert_eq!(
            Stage::load(&Catalog::builtin(), 42, &EngineConfig::default(), &mut rng).unwrap_err(),
            GameError::UnknownStage(42)
        );
    }
}
