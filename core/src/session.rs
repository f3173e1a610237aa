use alloc::vec::Vec;
use rand::prelude::*;
use web_time::Instant;

use crate::*;

/// One player's run through the stages of a catalog.
///
/// Owns the live stage, the dig controller and the session rng; the catalog, ledger and progress store are the
/// collaborators it is built with.
#[derive(Clone, Debug)]
pub struct StageSession<C = Catalog, L = PickaxeLedger, P = MemoryProgress> {
    catalog: C,
    ledger: L,
    progress: P,
    config: EngineConfig,
    controller: DigController,
    rng: SmallRng,
    stage: Option<Stage>,
    events: Vec<GameEvent>,
}

impl StageSession {
    /// Built-in stages, a fresh ledger and no progress.
    pub fn builtin(config: EngineConfig, seed: u64) -> Self {
        Self::new(
            Catalog::builtin(),
            PickaxeLedger::default(),
            MemoryProgress::default(),
            config,
            seed,
        )
    }
}

impl<C, L, P> StageSession<C, L, P>
where
    C: StageCatalog,
    L: ResourceLedger,
    P: ProgressStore,
{
    pub fn new(catalog: C, ledger: L, progress: P, config: EngineConfig, seed: u64) -> Self {
        Self {
            catalog,
            ledger,
            progress,
            controller: DigController::new(&config),
            config,
            rng: SmallRng::seed_from_u64(seed),
            stage: None,
            events: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn progress(&self) -> &P {
        &self.progress
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn stage(&self) -> Option<&Stage> {
        self.stage.as_ref()
    }

    pub fn current_stage_id(&self) -> Option<StageId> {
        self.stage.as_ref().map(Stage::id)
    }

    pub fn into_parts(self) -> (C, L, P) {
        (self.catalog, self.ledger, self.progress)
    }

    /// Replaces the current stage with a freshly built `id`. On error the current stage is kept.
    pub fn load_stage(&mut self, id: StageId) -> Result<StageId> {
        let stage = Stage::load(&self.catalog, id, &self.config, &mut self.rng)?;
        log::info!(
            "Loaded stage {id} ({} gem(s), {:?} placement)",
            stage.pool().total(),
            self.config.placement
        );
        self.stage = Some(stage);
        self.controller.set_input_enabled(true);
        self.events.push(GameEvent::StageChanged(id));
        Ok(id)
    }

    /// Moves on to the stage after the current one, `None` once the catalog is exhausted.
    pub fn load_next_stage(&mut self) -> Result<Option<StageId>> {
        let current = self.current_stage_id().ok_or(GameError::NoStageLoaded)?;
        match self.catalog.next_stage(current) {
            Some(next) => self.load_stage(next).map(Some),
            None => {
                log::info!("All stages completed");
                self.events.push(GameEvent::AllStagesCompleted);
                Ok(None)
            }
        }
    }

    /// Loads the furthest stage recorded in the progress store.
    pub fn resume(&mut self) -> Result<StageId> {
        let first = self
            .catalog
            .first_stage()
            .ok_or_else(|| GameError::InvalidCatalog("catalog has no stages".into()))?;
        let target = match self.progress.highest_reached() {
            None => first,
            Some(reached) => {
                // furthest catalog stage not beyond the reached one
                let mut target = first;
                while let Some(next) = self.catalog.next_stage(target).filter(|&next| next <= reached) {
                    target = next;
                }
                target
            }
        };
        self.load_stage(target)
    }

    pub fn is_input_enabled(&self) -> bool {
        self.controller.is_input_enabled()
    }

    pub fn set_input_enabled(&mut self, enabled: bool) {
        self.controller.set_input_enabled(enabled);
    }

    pub fn dig_cell(&mut self, coords: Coord2) -> DigOutcome {
        self.dig_cell_at(coords, Instant::now())
    }

    /// Digs with an explicit clock reading for the cooldown gate.
    pub fn dig_cell_at(&mut self, coords: Coord2, now: Instant) -> DigOutcome {
        let Some(stage) = self.stage.as_mut() else {
            return DigOutcome::Rejected(DigRejection::NoStage);
        };
        let outcome = self.controller.dig(
            stage,
            coords,
            now,
            &mut self.ledger,
            &mut self.rng,
            &mut self.events,
        );
        if outcome.report().is_some_and(|report| report.stage_completed) {
            let id = stage.id();
            let reached = self.catalog.next_stage(id).unwrap_or(id.saturating_add(1));
            if self.progress.record_reached(reached) {
                log::debug!("Progress advanced to stage {reached}");
            }
            self.events.push(GameEvent::StageCompleted(id));
        }
        outcome
    }

    /// Takes every event queued since the last call.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        core::mem::take(&mut self.events)
    }

    pub fn is_reward_available(&self, stage: StageId) -> bool {
        self.progress
            .highest_reached()
            .is_some_and(|reached| reached > stage)
            && !self.progress.is_reward_claimed(stage)
            && self.catalog.reward(stage).is_some()
    }

    /// Credits the reward of a completed stage, once.
    pub fn claim_reward(&mut self, stage: StageId) -> Result<Reward> {
        if self.progress.is_reward_claimed(stage) {
            return Err(GameError::RewardAlreadyClaimed(stage));
        }
        let completed = self
            .progress
            .highest_reached()
            .is_some_and(|reached| reached > stage);
        let reward = match self.catalog.reward(stage) {
            Some(reward) if completed => reward,
            _ => return Err(GameError::RewardUnavailable(stage)),
        };

        match reward.kind {
            RewardKind::Pickaxe => self.ledger.credit(reward.amount),
        }
        self.progress.mark_reward_claimed(stage);
        log::info!("Claimed {} pickaxe(s) for stage {stage}", reward.amount);
        self.events.push(GameEvent::RewardClaimed(reward));
        Ok(reward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> StageSession {
        StageSession::builtin(EngineConfig::default().without_cooldown(), 3)
    }

    /// Digs every cell in scan order until the stage reports completion.
    fn clear_stage(session: &mut StageSession) -> usize {
        let (width, height) = session.stage().unwrap().board().size();
        let mut completions = 0;
        for x in 0..width {
            for y in 0..height {
                let outcome = session.dig_cell((x, y));
                if outcome.report().is_some_and(|report| report.stage_completed) {
                    completions += 1;
                }
            }
        }
        completions
    }

    #[test]
    fn dig_without_stage_is_rejected() {
        let mut session = session();

        assert_eq!(
            session.dig_cell((0, 0)),
            DigOutcome::Rejected(DigRejection::NoStage)
        );
        assert_eq!(session.load_next_stage(), Err(GameError::NoStageLoaded));
    }

    #[test]
    fn load_emits_stage_changed_and_enables_input() {
        let mut session = session();
        session.set_input_enabled(false);

        session.load_stage(2).unwrap();

        assert!(session.is_input_enabled());
        assert_eq!(session.drain_events(), [GameEvent::StageChanged(2)]);
        assert!(session.drain_events().is_empty());
    }

    #[test]
    fn failed_load_keeps_current_stage() {
        let mut session = session();
        session.load_stage(1).unwrap();

        assert_eq!(session.load_stage(9), Err(GameError::UnknownStage(9)));
        assert_eq!(session.current_stage_id(), Some(1));
    }

    #[test]
    fn completion_fires_once_and_advances_progress() {
        let mut session = session();
        session.load_stage(1).unwrap();
        session.drain_events();

        assert_eq!(clear_stage(&mut session), 1);

        let events = session.drain_events();
        let completed: Vec<_> = events
            .iter()
            .filter(|event| matches!(event, GameEvent::StageCompleted(_)))
            .collect();
        let collected = events
            .iter()
            .filter(|event| matches!(event, GameEvent::GemCollected(_)))
            .count();
        assert_eq!(completed, [&GameEvent::StageCompleted(1)]);
        assert_eq!(collected, 4);
        assert_eq!(session.progress().highest_reached(), Some(2));
        assert!(!session.is_input_enabled());
        assert_eq!(
            session.dig_cell((0, 0)).rejection(),
            Some(DigRejection::InputDisabled)
        );
    }

    #[test]
    fn reward_claimed_once_after_completion() {
        let mut session = session();
        session.load_stage(1).unwrap();
        assert_eq!(session.claim_reward(1), Err(GameError::RewardUnavailable(1)));

        clear_stage(&mut session);
        let balance = session.ledger().balance();

        assert!(session.is_reward_available(1));
        assert_eq!(session.claim_reward(1).unwrap().amount, 5);
        assert_eq!(session.ledger().balance(), balance + 5);
        assert_eq!(session.claim_reward(1), Err(GameError::RewardAlreadyClaimed(1)));
        assert!(!session.is_reward_available(1));
    }

    #[test]
    fn next_stage_after_last_reports_all_completed() {
        let mut session = session();
        session.load_stage(5).unwrap();
        session.drain_events();

        assert_eq!(session.load_next_stage(), Ok(None));
        assert_eq!(session.drain_events(), [GameEvent::AllStagesCompleted]);
        assert_eq!(session.current_stage_id(), Some(5));
    }

    fn session_with_progress(progress: MemoryProgress) -> StageSession {
        StageSession::new(
            Catalog::builtin(),
            PickaxeLedger::default(),
            progress,
            EngineConfig::default(),
            0,
        )
    }

    #[test]
    fn resume_clamps_to_catalog() {
        let mut progress = MemoryProgress::default();
        progress.record_reached(6);

        assert_eq!(session_with_progress(progress).resume(), Ok(5));
        assert_eq!(session_with_progress(MemoryProgress::default()).resume(), Ok(1));
    }

    #[test]
    fn same_seed_same_game() {
        let play = || {
            let mut session = session();
            session.load_stage(3).unwrap();
            clear_stage(&mut session);
            session.drain_events()
        };

        assert_eq!(play(), play());
    }
}
