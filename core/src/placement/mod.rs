use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

pub use oracle::*;
pub use packer::*;
pub use spawn::*;

mod oracle;
mod packer;
mod spawn;

/// A gem waiting to be placed, with its resolved footprint.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PackItem {
    pub gem: GemId,
    pub footprint: Footprint,
}

/// Combined area of `items`, saturating instead of wrapping.
pub fn total_area(items: &[PackItem]) -> CellCount {
    items
        .iter()
        .fold(0, |area: CellCount, item| area.saturating_add(item.area()))
}

impl PackItem {
    pub const fn new(gem: GemId, footprint: Footprint) -> Self {
        Self { gem, footprint }
    }

    pub const fn area(&self) -> CellCount {
        self.footprint.area()
    }
}

/// Where a gem landed.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Placement {
    pub gem: GemId,
    pub rect: Rect,
    pub rotated: bool,
}

impl Placement {
    pub const fn new(item: PackItem, origin: Coord2) -> Self {
        Self {
            gem: item.gem,
            rect: Rect::new(origin, item.footprint.size()),
            rotated: item.footprint.rotated,
        }
    }
}

/// Throwaway free-cell grid that searches mutate instead of the live board.
#[derive(Clone, Debug, PartialEq)]
pub struct Occupancy {
    free: Array2<bool>,
    free_count: CellCount,
}

impl Occupancy {
    pub fn from_board(board: &Board) -> Self {
        let free = Array2::from_shape_fn(board.size().to_nd_index(), |(x, y)| {
            board.is_occupiable((x as Coord, y as Coord))
        });
        Self::from_mask(free)
    }

    /// Free cells of `board`, plus `target` when it was just dug and nothing else rules it out.
    pub fn for_target(board: &Board, target: Coord2) -> Self {
        let mut occupancy = Self::from_board(board);
        let cell = board.cell_at(target);
        if cell.occupant().is_none() && !cell.is_dynamite() && !occupancy.free[target.to_nd_index()] {
            occupancy.free[target.to_nd_index()] = true;
            occupancy.free_count += 1;
        }
        occupancy
    }

    pub fn from_mask(free: Array2<bool>) -> Self {
        let free_count = free.iter().filter(|&&free| free).count() as CellCount;
        Self { free, free_count }
    }

    pub fn size(&self) -> Coord2 {
        let (x, y) = self.free.dim();
        (x as Coord, y as Coord)
    }

    pub fn free_count(&self) -> CellCount {
        self.free_count
    }

    pub fn is_free(&self, coords: Coord2) -> bool {
        self.free.get(coords.to_nd_index()).copied().unwrap_or(false)
    }

    pub fn fits(&self, rect: Rect) -> bool {
        rect.fits_within(self.size()) && rect.cells().all(|coords| self.free[coords.to_nd_index()])
    }

    /// Every origin where `footprint` fits on free cells, in scan order.
    pub fn candidates(&self, footprint: Footprint) -> Vec<Coord2> {
        let (width, height) = self.size();
        if footprint.width > width || footprint.height > height {
            return Vec::new();
        }
        (0..=width - footprint.width)
            .flat_map(|x| (0..=height - footprint.height).map(move |y| (x, y)))
            .filter(|&origin| self.fits(Rect::new(origin, footprint.size())))
            .collect()
    }

    /// Origins whose rectangle also contains `target`.
    pub fn candidates_covering(&self, footprint: Footprint, target: Coord2) -> Vec<Coord2> {
        let (width, height) = self.size();
        let (tx, ty) = target;
        if footprint.width > width || footprint.height > height || tx >= width || ty >= height {
            return Vec::new();
        }
        let min_x = (tx + 1).saturating_sub(footprint.width);
        let min_y = (ty + 1).saturating_sub(footprint.height);
        let max_x = tx.min(width - footprint.width);
        let max_y = ty.min(height - footprint.height);
        (min_x..=max_x)
            .flat_map(|x| (min_y..=max_y).map(move |y| (x, y)))
            .filter(|&origin| self.fits(Rect::new(origin, footprint.size())))
            .collect()
    }

    /// Takes the cells of `rect` until the returned guard is dropped or kept.
    pub fn claim(&mut self, rect: Rect) -> Claim<'_> {
        debug_assert!(self.fits(rect), "claimed {rect:?} over taken cells");
        self.set(rect, false);
        Claim {
            occupancy: self,
            rect,
            kept: false,
        }
    }

    fn set(&mut self, rect: Rect, free: bool) {
        for coords in rect.cells() {
            self.free[coords.to_nd_index()] = free;
        }
        if free {
            self.free_count += rect.area();
        } else {
            self.free_count -= rect.area();
        }
    }
}

/// Scoped occupation of a rectangle. Dropping the guard gives the cells back.
#[derive(Debug)]
pub struct Claim<'a> {
    occupancy: &'a mut Occupancy,
    rect: Rect,
    kept: bool,
}

impl Claim<'_> {
    pub fn rect(&self) -> Rect {
        self.rect
    }

    /// Leaves the cells occupied.
    pub fn keep(mut self) {
        self.kept = true;
    }
}

impl Deref for Claim<'_> {
    type Target = Occupancy;

    fn deref(&self) -> &Self::Target {
        self.occupancy
    }
}

impl DerefMut for Claim<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.occupancy
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.kept {
            self.occupancy.set(self.rect, true);
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum SearchOutcome {
    Solved,
    Exhausted,
    OutOfBudget,
}

/// Depth-first assignment of items to free rectangles, in item order.
///
/// With an rng the candidates of each item are shuffled, without one they are tried in scan order. The attempt
/// counter is bumped once per candidate tried, across the whole search.
pub(crate) struct Search<'r> {
    rng: Option<&'r mut dyn RngCore>,
    budget: Option<u64>,
    attempts: u64,
}

impl<'r> Search<'r> {
    pub fn new(rng: Option<&'r mut dyn RngCore>, budget: Option<u64>) -> Self {
        Self {
            rng,
            budget,
            attempts: 0,
        }
    }

    pub fn attempts(&self) -> u64 {
        self.attempts
    }

    pub fn run(
        &mut self,
        occupancy: &mut Occupancy,
        items: &[PackItem],
        placements: &mut Vec<Placement>,
    ) -> SearchOutcome {
        let area = total_area(items);
        self.place(occupancy, items, area, placements)
    }

    fn place(
        &mut self,
        occupancy: &mut Occupancy,
        items: &[PackItem],
        area: CellCount,
        placements: &mut Vec<Placement>,
    ) -> SearchOutcome {
        use SearchOutcome::*;

        let Some((&item, rest)) = items.split_first() else {
            return Solved;
        };
        if area > occupancy.free_count() {
            return Exhausted;
        }

        let mut origins = occupancy.candidates(item.footprint);
        if let Some(rng) = self.rng.as_deref_mut() {
            origins.shuffle(rng);
        }

        for origin in origins {
            if self.budget.is_some_and(|budget| self.attempts >= budget) {
                return OutOfBudget;
            }
            self.attempts += 1;

            let placement = Placement::new(item, origin);
            let mut claim = occupancy.claim(placement.rect);
            placements.push(placement);
            match self.place(&mut claim, rest, area.saturating_sub(item.area()), placements) {
                Solved => {
                    claim.keep();
                    return Solved;
                }
                Exhausted => {
                    placements.pop();
                }
                OutOfBudget => {
                    placements.pop();
                    return OutOfBudget;
                }
            }
        }
        Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

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

    fn open(size: Coord2) -> Occupancy {
        Occupancy::from_mask(Array2::from_elem(size.to_nd_index(), true))
    }

    #[test]
    fn claim_releases_on_drop() {
        let mut occupancy = open((3, 3));
        let rect = Rect::new((1, 1), (2, 2));

        {
            let claim = occupancy.claim(rect);
            assert_eq!(claim.free_count(), 5);
            assert!(!claim.is_free((2, 2)));
        }

        assert_eq!(occupancy.free_count(), 9);
        assert!(occupancy.is_free((2, 2)));
    }

    #[test]
    fn kept_claim_stays_occupied() {
        let mut occupancy = open((3, 3));

        occupancy.claim(Rect::new((0, 0), (1, 3))).keep();

        assert_eq!(occupancy.free_count(), 6);
        assert!(occupancy.candidates(item(0, 3, 1).footprint).is_empty());
    }

    #[test]
    fn nested_claims_unwind_in_order() {
        let mut occupancy = open((2, 2));
        {
            let mut outer = occupancy.claim(Rect::new((0, 0), (1, 2)));
            let inner = outer.claim(Rect::new((1, 0), (1, 1)));
            assert_eq!(inner.free_count(), 1);
        }
        assert_eq!(occupancy, open((2, 2)));
    }

    #[test]
    fn covering_candidates_contain_target() {
        let occupancy = open((4, 4));
        let footprint = item(0, 1, 3).footprint;

        let origins = occupancy.candidates_covering(footprint, (2, 1));

        assert_eq!(origins, [(2, 0), (2, 1)]);
        for origin in origins {
            assert!(Rect::new(origin, footprint.size()).contains((2, 1)));
        }
    }

    #[test]
    fn candidates_skip_taken_cells() {
        let mut free = Array2::from_elem([3, 2], true);
        free[[1, 0]] = false;
        let occupancy = Occupancy::from_mask(free);

        assert_eq!(occupancy.candidates(item(0, 2, 1).footprint), [(0, 1), (1, 1)]);
        assert!(occupancy.candidates(item(0, 4, 1).footprint).is_empty());
    }

    #[test]
    fn search_solves_tight_fit_and_leaves_cells_taken() {
        let mut occupancy = open((2, 3));
        let items = [item(0, 2, 2), item(1, 2, 1)];
        let mut placements = Vec::new();

        let outcome = Search::new(None, None).run(&mut occupancy, &items, &mut placements);

        assert_eq!(outcome, SearchOutcome::Solved);
        assert_eq!(placements.len(), 2);
        assert_eq!(occupancy.free_count(), 0);
    }

    #[test]
    fn search_failure_restores_occupancy() {
        let mut occupancy = open((3, 3));
        let items = [item(0, 2, 2), item(1, 2, 2)];
        let mut placements = Vec::new();

        let mut search = Search::new(None, None);
        let outcome = search.run(&mut occupancy, &items, &mut placements);

        assert_eq!(outcome, SearchOutcome::Exhausted);
        assert!(search.attempts() > 0);
        assert!(placements.is_empty());
        assert_eq!(occupancy, open((3, 3)));
    }

    #[test]
    fn search_stops_at_budget() {
        let mut occupancy = open((3, 3));
        let items = vec![item(0, 2, 2), item(1, 2, 2)];
        let mut placements = Vec::new();

        let mut search = Search::new(None, Some(3));
        let outcome = search.run(&mut occupancy, &items, &mut placements);

        assert_eq!(outcome, SearchOutcome::OutOfBudget);
        assert_eq!(search.attempts(), 3);
        assert_eq!(occupancy.free_count(), 9);
    }
}
