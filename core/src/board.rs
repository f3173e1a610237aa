use alloc::vec::Vec;
use core::ops::Index;
use ndarray::Array2;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use crate::*;

/// Cell grid of one stage. Holds no placement logic of its own.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
}

impl Board {
    /// Fresh board, every cell covered by one or two layers of stone.
    pub fn new<R: Rng + ?Sized>(size: Coord2, rng: &mut R) -> Result<Self> {
        Self::check_size(size)?;
        let cells = Array2::from_shape_simple_fn(size.to_nd_index(), || {
            Cell::with_layers(rng.random_range(1..=2))
        });
        Ok(Self { cells })
    }

    /// Board with explicit stone layers, `layers[[x, y]]`.
    pub fn from_layers(layers: &Array2<u8>) -> Result<Self> {
        let (x, y) = layers.dim();
        let size = (
            Coord::try_from(x).map_err(|_| GameError::InvalidBoardSize(Coord::MAX, 0))?,
            Coord::try_from(y).map_err(|_| GameError::InvalidBoardSize(0, Coord::MAX))?,
        );
        Self::check_size(size)?;
        Ok(Self {
            cells: layers.map(|&layers| Cell::with_layers(layers)),
        })
    }

    fn check_size((width, height): Coord2) -> Result<()> {
        if width == 0 || height == 0 {
            Err(GameError::InvalidBoardSize(width, height))
        } else {
            Ok(())
        }
    }

    pub fn size(&self) -> Coord2 {
        let (x, y) = self.cells.dim();
        // dimensions come from a Coord2 at construction
        (x as Coord, y as Coord)
    }

    pub fn total_cells(&self) -> CellCount {
        let (width, height) = self.size();
        mult(width, height)
    }

    pub fn validate_coords(&self, coords: Coord2) -> Result<Coord2> {
        let size = self.size();
        if coords.0 < size.0 && coords.1 < size.1 {
            Ok(coords)
        } else {
            Err(GameError::InvalidCoords)
        }
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.cells[coords.to_nd_index()]
    }

    /// Every cell with its coordinates, column by column.
    pub fn iter(&self) -> impl Iterator<Item = (Coord2, Cell)> + '_ {
        self.cells
            .indexed_iter()
            .map(|((x, y), &cell)| ((x as Coord, y as Coord), cell))
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }

    pub fn is_occupiable(&self, coords: Coord2) -> bool {
        self.cell_at(coords).is_occupiable()
    }

    pub fn occupiable_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.is_occupiable()).count() as CellCount
    }

    pub fn revealed_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.revealed).count() as CellCount
    }

    pub fn dynamite_count(&self) -> CellCount {
        self.cells.iter().filter(|cell| cell.dynamite).count() as CellCount
    }

    fn can_host_dynamite(cell: &Cell) -> bool {
        cell.occupant.is_none() && !cell.dynamite && !cell.revealed
    }

    /// Marks one cell as dynamite. Returns `false` when the cell cannot take it.
    pub fn place_dynamite_at(&mut self, coords: Coord2) -> Result<bool> {
        let coords = self.validate_coords(coords)?;
        let cell = &mut self.cells[coords.to_nd_index()];
        if !Self::can_host_dynamite(cell) {
            return Ok(false);
        }
        cell.dynamite = true;
        Ok(true)
    }

    /// Scatters `count` dynamite over cells without gems.
    ///
    /// Each stick probes up to `attempts` random cells, then falls back to a uniform pick among the cells that are
    /// still eligible. Fails only when the board has no eligible cell left.
    pub fn place_dynamite<R: Rng + ?Sized>(
        &mut self,
        count: CellCount,
        attempts: u32,
        rng: &mut R,
    ) -> Result<()> {
        let (width, height) = self.size();
        for placed in 0..count {
            let probed = (0..attempts).any(|_| {
                let coords = (rng.random_range(0..width), rng.random_range(0..height));
                self.place_dynamite_at(coords).unwrap_or(false)
            });
            if probed {
                continue;
            }

            let eligible: Vec<Coord2> = self
                .iter()
                .filter(|(_, cell)| Self::can_host_dynamite(cell))
                .map(|(coords, _)| coords)
                .collect();
            let Some(&coords) = eligible.choose(rng) else {
                log::error!("Board is full, placed {placed} of {count} dynamite");
                return Err(GameError::TooManyDynamite {
                    requested: count,
                    placed,
                });
            };
            log::debug!("Dynamite probing exhausted, picked {coords:?} from {} free cells", eligible.len());
            self.cells[coords.to_nd_index()].dynamite = true;
        }
        Ok(())
    }

    /// Removes the stone from a covered cell and returns the pickaxe cost it had, `None` if already dug.
    pub fn dig(&mut self, coords: Coord2) -> Option<u8> {
        let cell = self.cells.get_mut(coords.to_nd_index())?;
        if cell.revealed {
            return None;
        }
        let cost = cell.stone_layers;
        cell.stone_layers = 0;
        cell.revealed = true;
        Some(cost)
    }

    /// Assigns every cell of `rect` to `gem`, lifting any spawn exclusion.
    pub(crate) fn occupy(&mut self, rect: Rect, gem: GemId) {
        for coords in rect.cells() {
            let cell = &mut self.cells[coords.to_nd_index()];
            debug_assert!(cell.occupant.is_none(), "cell {coords:?} already holds a gem");
            cell.occupant = Some(gem);
            cell.excluded = false;
        }
    }

    pub(crate) fn exclude(&mut self, coords: Coord2) {
        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.occupant.is_none() {
            cell.excluded = true;
        }
    }
}

impl Index<Coord2> for Board {
    type Output = Cell;

    fn index(&self, coords: Coord2) -> &Self::Output {
        &self.cells[coords.to_nd_index()]
    }
}
