use alloc::vec::Vec;

use super::*;

/// Largest whole number of cells the gems may cover on `board`.
pub fn usable_area(board: &Board, capacity_ratio: f64) -> CellCount {
    let usable = f64::from(board.total_cells()) * capacity_ratio.clamp(0.0, 1.0);
    // truncation toward zero; usable is within 0..=total_cells
    usable as CellCount
}

/// Rejects a gem set that cannot be expected to fit even in principle.
pub fn check_capacity(board: &Board, pool: &GemPool, capacity_ratio: f64) -> Result<()> {
    let gem_area = pool.unplaced_area();
    let usable_area = usable_area(board, capacity_ratio);
    if gem_area > usable_area {
        log::error!("Gem area {gem_area} exceeds {usable_area} usable cells");
        return Err(GameError::OverCapacity {
            gem_area,
            usable_area,
        });
    }
    Ok(())
}

/// Arranges every unplaced gem of `pool` on the free cells of `board` without committing anything.
///
/// Each restart sorts the gems by area, largest first, breaking ties at random, and shuffles the candidates of each
/// gem. A restart that exhausts its search space without a budget proves the set cannot fit, so no further restarts
/// are made.
pub fn pack_all<R: Rng>(
    board: &Board,
    pool: &GemPool,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<Vec<Placement>> {
    check_capacity(board, pool, config.capacity_ratio)?;

    let mut items = pool.unplaced_items(None);
    let base = Occupancy::from_board(board);
    let retries = config.packer_retries.max(1);

    for attempt in 1..=retries {
        items.shuffle(rng);
        items.sort_by_key(|item| core::cmp::Reverse(item.area()));

        let mut occupancy = base.clone();
        let mut placements = Vec::with_capacity(items.len());
        let mut search = Search::new(Some(&mut *rng as &mut dyn RngCore), config.packer_attempts);
        match search.run(&mut occupancy, &items, &mut placements) {
            SearchOutcome::Solved => {
                log::debug!(
                    "Packed {} gem(s) on attempt {attempt} after {} candidate(s)",
                    placements.len(),
                    search.attempts()
                );
                return Ok(placements);
            }
            SearchOutcome::Exhausted if config.packer_attempts.is_none() => {
                log::error!("Gem set cannot be packed, search exhausted on attempt {attempt}");
                return Err(GameError::PackingFailed(attempt));
            }
            outcome => {
                log::trace!("Packing attempt {attempt} failed: {outcome:?}");
            }
        }
    }

    log::error!("Failed to pack gems after {retries} attempt(s)");
    Err(GameError::PackingFailed(retries))
}

/// Packs and commits every unplaced gem.
pub fn place_all<R: Rng>(
    board: &mut Board,
    pool: &mut GemPool,
    config: &EngineConfig,
    rng: &mut R,
) -> Result<Vec<Placement>> {
    let placements = pack_all(board, pool, config, rng)?;
    for &placement in &placements {
        commit(board, pool, placement);
    }
    Ok(placements)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(catalog: &Catalog, id: StageId, seed: u64) -> (Board, GemPool, SmallRng) {
        let config = catalog.stage_config(id).unwrap();
        let mut rng = SmallRng::seed_from_u64(seed);
        let board = Board::new(config.size(), &mut rng).unwrap();
        let pool = GemPool::from_stage(catalog, config).unwrap();
        (board, pool, rng)
    }

    fn assert_disjoint_and_inside(board: &Board, placements: &[Placement]) {
        for (i, a) in placements.iter().enumerate() {
            assert!(a.rect.fits_within(board.size()));
            for b in &placements[i + 1..] {
                assert!(!a.rect.overlaps(&b.rect), "{a:?} overlaps {b:?}");
            }
        }
    }

    #[test]
    fn first_stage_packs_with_fixed_seed() {
        let catalog = Catalog::builtin();
        let (board, pool, mut rng) = stage(&catalog, 1, 42);

        let placements = pack_all(&board, &pool, &EngineConfig::default(), &mut rng).unwrap();

        assert_eq!(placements.len(), 4);
        assert_disjoint_and_inside(&board, &placements);
        let area: CellCount = placements.iter().map(|p| p.rect.area()).sum();
        assert_eq!(area, 11);
    }

    #[test]
    fn every_builtin_stage_packs() {
        let catalog = Catalog::builtin();
        for config in catalog.stages() {
            let (mut board, mut pool, mut rng) = stage(&catalog, config.id, 9);

            let placements = place_all(&mut board, &mut pool, &EngineConfig::default(), &mut rng).unwrap();

            assert_disjoint_and_inside(&board, &placements);
            assert!(pool.unplaced().is_empty());
            assert_eq!(pool.placed().len(), config.total_gem_count());
            for placement in &placements {
                let gem = pool.gem(placement.gem);
                assert_eq!(gem.placement(), Some(placement.rect));
                assert!(placement.rect.cells().all(|c| board[c].occupant() == Some(gem.id())));
            }
        }
    }

    #[test]
    fn packing_is_reproducible_per_seed() {
        let catalog = Catalog::builtin();
        let (board, pool, mut a) = stage(&catalog, 4, 5);
        let mut b = a.clone();
        let config = EngineConfig::default();

        assert_eq!(
            pack_all(&board, &pool, &config, &mut a).unwrap(),
            pack_all(&board, &pool, &config, &mut b).unwrap()
        );
    }

    #[test]
    fn over_capacity_is_rejected_before_search() {
        let catalog = Catalog::new(
            alloc::vec![GemShape::new(1, 3, 3)],
            alloc::vec![StageConfig {
                id: 1,
                width: 3,
                height: 3,
                dynamite: 0,
                gems: alloc::vec![GemRequest::new(1, 1)],
            }],
            Vec::new(),
        )
        .unwrap();
        let (board, pool, mut rng) = stage(&catalog, 1, 0);

        assert_eq!(
            pack_all(&board, &pool, &EngineConfig::default(), &mut rng).unwrap_err(),
            GameError::OverCapacity {
                gem_area: 9,
                usable_area: 8
            }
        );
    }

    #[test]
    fn huge_reserve_is_over_capacity_not_an_overflow() {
        let mut rng = SmallRng::seed_from_u64(0);
        let board = Board::new((10, 10), &mut rng).unwrap();
        let shape = GemShape::new(1, 2, 2);
        let gems = (0..16384)
            .map(|id| GemInstance::new(GemId(id), shape, Orientation::Vertical))
            .collect();
        let pool = GemPool::new(gems);

        assert_eq!(pool.unplaced_area(), 65536);
        assert_eq!(
            pack_all(&board, &pool, &EngineConfig::default(), &mut rng).unwrap_err(),
            GameError::OverCapacity {
                gem_area: 65536,
                usable_area: 90
            }
        );
    }

    #[test]
    fn impossible_layout_fails_after_one_exhaustive_attempt() {
        let catalog = Catalog::new(
            alloc::vec![GemShape::new(1, 2, 2)],
            alloc::vec![StageConfig {
                id: 1,
                width: 3,
                height: 3,
                dynamite: 0,
                gems: alloc::vec![GemRequest::new(1, 2)],
            }],
            Vec::new(),
        )
        .unwrap();
        let (board, pool, mut rng) = stage(&catalog, 1, 0);

        assert_eq!(
            pack_all(&board, &pool, &EngineConfig::default(), &mut rng).unwrap_err(),
            GameError::PackingFailed(1)
        );
    }
}
