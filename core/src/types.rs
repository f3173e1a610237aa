use ndarray::Array2;
use serde::{Deserialize, Serialize};

/// Single coordinate axis used for board width, height, and positions.
pub type Coord = u8;

/// Count type used for areas and cell counts.
pub type CellCount = u32;

/// Two-dimensional coordinates `(x, y)`.
pub type Coord2 = (Coord, Coord);

pub trait ToNdIndex {
    type Output;
    fn to_nd_index(self) -> Self::Output;
}

impl ToNdIndex for Coord2 {
    type Output = [usize; 2];

    fn to_nd_index(self) -> Self::Output {
        [self.0.into(), self.1.into()]
    }
}

pub const fn mult(a: Coord, b: Coord) -> CellCount {
    let a = a as CellCount;
    let b = b as CellCount;
    a.saturating_mul(b)
}

/// Axis-aligned rectangle of cells, `origin` is the top-left corner.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub origin: Coord2,
    pub size: Coord2,
}

impl Rect {
    pub const fn new(origin: Coord2, size: Coord2) -> Self {
        Self { origin, size }
    }

    pub const fn area(&self) -> CellCount {
        mult(self.size.0, self.size.1)
    }

    pub const fn contains(&self, (x, y): Coord2) -> bool {
        let (ox, oy) = self.origin;
        let (w, h) = self.size;
        x >= ox && (x as u16) < ox as u16 + w as u16 && y >= oy && (y as u16) < oy as u16 + h as u16
    }

    /// Whether the rectangle lies entirely inside a board of `bounds`.
    pub const fn fits_within(&self, bounds: Coord2) -> bool {
        self.origin.0 as u16 + self.size.0 as u16 <= bounds.0 as u16
            && self.origin.1 as u16 + self.size.1 as u16 <= bounds.1 as u16
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        let (ax, ay) = (u16::from(self.origin.0), u16::from(self.origin.1));
        let (bx, by) = (u16::from(other.origin.0), u16::from(other.origin.1));
        ax < bx + u16::from(other.size.0)
            && bx < ax + u16::from(self.size.0)
            && ay < by + u16::from(other.size.1)
            && by < ay + u16::from(self.size.1)
    }

    /// Iterates covered cells column by column.
    pub fn cells(self) -> impl Iterator<Item = Coord2> {
        let (ox, oy) = self.origin;
        let (w, h) = self.size;
        (0..w).flat_map(move |dx| (0..h).map(move |dy| (ox + dx, oy + dy)))
    }
}

pub trait NeighborIterExt {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter;
}

impl<T> NeighborIterExt for Array2<T> {
    fn iter_neighbors(&self, index: Coord2) -> NeighborIter {
        let (x, y) = self.dim();
        let size = (
            Coord::try_from(x).unwrap_or(Coord::MAX),
            Coord::try_from(y).unwrap_or(Coord::MAX),
        );
        NeighborIter::new(index, size)
    }
}

const DISPLACEMENTS: [(isize, isize); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Applies `delta` to `coords`, returning a value only when it remains in bounds.
fn apply_delta(coords: Coord2, delta: (isize, isize), bounds: Coord2) -> Option<Coord2> {
    let (x, y) = coords;
    let (dx, dy) = delta;
    let (max_x, max_y) = bounds;

    let next_x = x.checked_add_signed(dx.try_into().ok()?)?;
    if next_x >= max_x {
        return None;
    }

    let next_y = y.checked_add_signed(dy.try_into().ok()?)?;
    if next_y >= max_y {
        return None;
    }

    Some((next_x, next_y))
}

/// The up-to-eight cells around a center, clipped at the board edges.
#[derive(Debug)]
pub struct NeighborIter {
    center: Coord2,
    bounds: Coord2,
    index: u8,
}

impl NeighborIter {
    pub(crate) fn new(center: Coord2, bounds: Coord2) -> Self {
        Self {
            center,
            bounds,
            index: 0,
        }
    }
}

impl Iterator for NeighborIter {
    type Item = Coord2;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&delta) = DISPLACEMENTS.get(usize::from(self.index)) {
            self.index += 1;
            if let Some(next_item) = apply_delta(self.center, delta, self.bounds) {
                return Some(next_item);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;

    #[test]
    fn neighbors_are_clipped_at_corners() {
        let grid: Array2<u8> = Array2::default([3, 3]);

        let corner: Vec<_> = grid.iter_neighbors((0, 0)).collect();
        let center: Vec<_> = grid.iter_neighbors((1, 1)).collect();

        assert_eq!(corner, [(1, 0), (0, 1), (1, 1)]);
        assert_eq!(center.len(), 8);
    }

    #[test]
    fn rect_contains_and_cells_agree() {
        let rect = Rect::new((1, 2), (2, 3));

        let cells: Vec<_> = rect.cells().collect();

        assert_eq!(cells.len(), rect.area() as usize);
        assert!(cells.iter().all(|&c| rect.contains(c)));
        assert!(!rect.contains((0, 2)));
        assert!(!rect.contains((3, 2)));
        assert!(!rect.contains((1, 5)));
    }

    #[test]
    fn rect_fits_and_overlaps() {
        let a = Rect::new((0, 0), (2, 2));
        let b = Rect::new((1, 1), (2, 2));
        let c = Rect::new((2, 0), (1, 2));

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
        assert!(b.fits_within((3, 3)));
        assert!(!b.fits_within((2, 3)));
    }
}
