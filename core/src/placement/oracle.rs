use alloc::vec::Vec;

use super::*;

/// Answer of a bounded feasibility check.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Feasibility {
    /// An assignment of every remaining gem was found.
    Feasible,
    /// The search space was exhausted without one.
    Infeasible,
    /// The attempt ceiling ran out first.
    Inconclusive,
}

impl Feasibility {
    /// Only a found assignment counts.
    pub const fn is_feasible(self) -> bool {
        matches!(self, Self::Feasible)
    }
}

/// Decides whether a set of gems can still be packed into the free cells of a scratch grid.
///
/// Deterministic for a given grid and item set: items are tried largest first, candidates in scan order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FeasibilityOracle {
    budget: u64,
}

impl FeasibilityOracle {
    pub const fn new(budget: u64) -> Self {
        Self { budget }
    }

    pub const fn budget(&self) -> u64 {
        self.budget
    }

    pub fn check(&self, occupancy: &Occupancy, items: &[PackItem]) -> Feasibility {
        if items.is_empty() {
            return Feasibility::Feasible;
        }
        let area = total_area(items);
        if area > occupancy.free_count() {
            log::trace!(
                "Oracle: {area} cells of gems over {} free cells",
                occupancy.free_count()
            );
            return Feasibility::Infeasible;
        }

        let mut items = items.to_vec();
        items.sort_by(|a, b| b.area().cmp(&a.area()).then(a.gem.cmp(&b.gem)));

        let mut scratch = occupancy.clone();
        let mut placements = Vec::with_capacity(items.len());
        let mut search = Search::new(None, Some(self.budget));
        let outcome = search.run(&mut scratch, &items, &mut placements);
        log::trace!(
            "Oracle: {} gem(s), {outcome:?} after {} attempt(s)",
            items.len(),
            search.attempts()
        );
        match outcome {
            SearchOutcome::Solved => Feasibility::Feasible,
            SearchOutcome::Exhausted => Feasibility::Infeasible,
            SearchOutcome::OutOfBudget => Feasibility::Inconclusive,
        }
    }

    /// Whether the reserve still fits on the board as it stands.
    pub fn check_board(&self, board: &Board, pool: &GemPool) -> Feasibility {
        self.check(&Occupancy::from_board(board), &pool.unplaced_items(None))
    }
}

impl Default for FeasibilityOracle {
    fn default() -> Self {
        Self::new(EngineConfig::default().oracle_attempts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use ndarray::Array2;

    fn item(gem: u16, width: Coord, height: Coord) -> PackItem {
        PackItem::new(
            GemId(gem),
            Footprint {
                width,
                height,
                rotated: false,
            },
        )
    }

    #[test]
    fn empty_reserve_is_feasible() {
        let occupancy = Occupancy::from_mask(Array2::from_elem([1, 1], false));

        assert_eq!(
            FeasibilityOracle::default().check(&occupancy, &[]),
            Feasibility::Feasible
        );
    }

    #[test]
    fn area_bound_rejects_without_search() {
        let occupancy = Occupancy::from_mask(Array2::from_elem([2, 2], true));

        let answer = FeasibilityOracle::new(0).check(&occupancy, &[item(0, 1, 3), item(1, 1, 2)]);

        assert_eq!(answer, Feasibility::Infeasible);
    }

    #[test]
    fn fragmented_board_is_infeasible() {
        // free cells form two separate columns of height 3
        let mut free = Array2::from_elem([3, 3], true);
        for y in 0..3 {
            free[[1, y]] = false;
        }
        let occupancy = Occupancy::from_mask(free);

        let oracle = FeasibilityOracle::default();

        assert_eq!(oracle.check(&occupancy, &[item(0, 2, 1)]), Feasibility::Infeasible);
        assert_eq!(
            oracle.check(&occupancy, &[item(0, 1, 3), item(1, 1, 3)]),
            Feasibility::Feasible
        );
    }

    #[test]
    fn tiny_budget_is_inconclusive_not_infeasible() {
        let occupancy = Occupancy::from_mask(Array2::from_elem([4, 4], true));
        let items = vec![item(0, 2, 2), item(1, 2, 2), item(2, 2, 2), item(3, 2, 2)];

        assert_eq!(FeasibilityOracle::new(2).check(&occupancy, &items), Feasibility::Inconclusive);
        assert_eq!(FeasibilityOracle::new(10_000).check(&occupancy, &items), Feasibility::Feasible);
    }

    #[test]
    fn check_leaves_grid_untouched() {
        let occupancy = Occupancy::from_mask(Array2::from_elem([2, 2], true));
        let before = occupancy.clone();

        FeasibilityOracle::default().check(&occupancy, &[item(0, 2, 2)]);

        assert_eq!(occupancy, before);
    }
}
