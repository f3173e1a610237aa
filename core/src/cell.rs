use serde::{Deserialize, Serialize};

use crate::GemId;

/// One board cell. Dynamite and gem occupancy are overlaid on the stone state.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub(crate) stone_layers: u8,
    pub(crate) dynamite: bool,
    pub(crate) revealed: bool,
    pub(crate) occupant: Option<GemId>,
    pub(crate) excluded: bool,
}

impl Cell {
    pub const fn with_layers(stone_layers: u8) -> Self {
        Self {
            stone_layers,
            dynamite: false,
            revealed: false,
            occupant: None,
            excluded: false,
        }
    }

    /// Pickaxe cost to dig, zero once dug.
    pub const fn stone_layers(self) -> u8 {
        self.stone_layers
    }

    pub const fn is_dynamite(self) -> bool {
        self.dynamite
    }

    pub const fn is_revealed(self) -> bool {
        self.revealed
    }

    pub const fn occupant(self) -> Option<GemId> {
        self.occupant
    }

    pub const fn is_excluded(self) -> bool {
        self.excluded
    }

    /// The predicate shared by every placement search.
    pub const fn is_occupiable(self) -> bool {
        self.occupant.is_none() && !self.excluded && !self.revealed && !self.dynamite
    }

    pub const fn state(self) -> CellState {
        match (self.revealed, self.occupant) {
            (false, _) => CellState::Stone(self.stone_layers),
            (true, Some(gem)) => CellState::Gem(gem),
            (true, None) if self.dynamite => CellState::Exploded,
            (true, None) => CellState::Empty,
        }
    }
}

/// Player-visible state of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Stone(u8),
    Empty,
    Exploded,
    Gem(GemId),
}

impl CellState {
    pub const fn is_covered(self) -> bool {
        matches!(self, Self::Stone(_))
    }
}

impl Default for CellState {
    fn default() -> Self {
        Self::Stone(1)
    }
}
