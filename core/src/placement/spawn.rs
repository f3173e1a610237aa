use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use super::*;

/// How a dig-time placement was obtained, from the preferred path down to the last resort.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpawnRung {
    /// Covers the dug cell, and the rest of the reserve was shown to still fit.
    Targeted,
    /// Covers the dug cell without the feasibility check.
    ForcedCovering,
    /// Somewhere else on the board, with the feasibility check.
    ForcedAnywhere,
    /// Any gem anywhere it fits, unconditionally.
    Emergency,
}

impl SpawnRung {
    pub const fn is_fallback(self) -> bool {
        !matches!(self, Self::Targeted)
    }
}

/// Moves the gem out of the reserve and writes it to the board. Returns `false`, leaving the board alone, when the
/// gem was already placed.
pub fn commit(board: &mut Board, pool: &mut GemPool, placement: Placement) -> bool {
    if !pool.commit(placement.gem, placement.rect) {
        return false;
    }
    board.occupy(placement.rect, placement.gem);
    true
}

fn shuffled_reserve<R: Rng>(pool: &GemPool, rng: &mut R) -> Vec<PackItem> {
    let mut items = pool.unplaced_items(None);
    items.shuffle(rng);
    items
}

fn rest_of(items: &[PackItem], gem: GemId) -> Vec<PackItem> {
    items.iter().copied().filter(|item| item.gem != gem).collect()
}

/// Picks a gem and a placement covering `target` such that the rest of the reserve still fits afterwards.
///
/// `target` is exempt from the revealed check since it is the cell being dug.
pub fn spawn_covering<R: Rng>(
    board: &Board,
    pool: &GemPool,
    target: Coord2,
    oracle: &FeasibilityOracle,
    rng: &mut R,
) -> Option<Placement> {
    let mut occupancy = Occupancy::for_target(board, target);
    let items = shuffled_reserve(pool, rng);

    for &item in &items {
        let mut origins = occupancy.candidates_covering(item.footprint, target);
        origins.shuffle(rng);
        let rest = rest_of(&items, item.gem);

        for origin in origins {
            let placement = Placement::new(item, origin);
            let claim = occupancy.claim(placement.rect);
            let answer = oracle.check(&claim, &rest);
            log::trace!("Gem {} at {origin:?} covering {target:?}: {answer:?}", item.gem);
            if answer.is_feasible() {
                return Some(placement);
            }
        }
    }
    None
}

/// First rung of the fallback ladder: cover `target` with any gem that fits there.
pub fn force_covering<R: Rng>(
    board: &Board,
    pool: &GemPool,
    target: Coord2,
    rng: &mut R,
) -> Option<Placement> {
    let occupancy = Occupancy::for_target(board, target);
    shuffled_reserve(pool, rng).into_iter().find_map(|item| {
        let origins = occupancy.candidates_covering(item.footprint, target);
        origins
            .choose(rng)
            .map(|&origin| Placement::new(item, origin))
    })
}

/// Second rung: drop the covering constraint, keep the feasibility check, try larger gems first.
pub fn force_anywhere<R: Rng>(
    board: &Board,
    pool: &GemPool,
    oracle: &FeasibilityOracle,
    rng: &mut R,
) -> Option<Placement> {
    let mut occupancy = Occupancy::from_board(board);
    let mut items = shuffled_reserve(pool, rng);
    items.sort_by_key(|item| core::cmp::Reverse(item.area()));

    for &item in &items {
        let mut origins = occupancy.candidates(item.footprint);
        origins.shuffle(rng);
        let rest = rest_of(&items, item.gem);

        for origin in origins {
            let placement = Placement::new(item, origin);
            let claim = occupancy.claim(placement.rect);
            if oracle.check(&claim, &rest).is_feasible() {
                return Some(placement);
            }
        }
    }
    None
}

/// Last rung: any gem, any free spot.
pub fn emergency<R: Rng>(board: &Board, pool: &GemPool, rng: &mut R) -> Option<Placement> {
    let occupancy = Occupancy::from_board(board);
    shuffled_reserve(pool, rng).into_iter().find_map(|item| {
        occupancy
            .candidates(item.footprint)
            .choose(rng)
            .map(|&origin| Placement::new(item, origin))
    })
}

/// Runs the fallback ladder for a dug cell that needs a gem but got none from [`spawn_covering`].
pub fn spawn_fallback<R: Rng>(
    board: &Board,
    pool: &GemPool,
    target: Coord2,
    oracle: &FeasibilityOracle,
    rng: &mut R,
) -> Option<(Placement, SpawnRung)> {
    if let Some(placement) = force_covering(board, pool, target, rng) {
        log::warn!("Forced gem {} over {target:?} without a feasibility proof", placement.gem);
        return Some((placement, SpawnRung::ForcedCovering));
    }
    if let Some(placement) = force_anywhere(board, pool, oracle, rng) {
        log::warn!(
            "No gem fits over {target:?}, placed gem {} at {:?} instead",
            placement.gem,
            placement.rect.origin
        );
        return Some((placement, SpawnRung::ForcedAnywhere));
    }
    match emergency(board, pool, rng) {
        Some(placement) => {
            log::error!(
                "Backtracking found no arrangement for {target:?}, emergency gem {} at {:?}",
                placement.gem,
                placement.rect.origin
            );
            Some((placement, SpawnRung::Emergency))
        }
        None => {
            log::error!(
                "No free spot left for any of {} unplaced gem(s)",
                pool.unplaced().len()
            );
            None
        }
    }
}
