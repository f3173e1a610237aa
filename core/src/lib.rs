#![no_std]

extern crate alloc;

use alloc::vec::Vec;
use smallvec::SmallVec;

pub use board::*;
pub use catalog::*;
pub use cell::*;
pub use config::*;
pub use dig::*;
pub use error::*;
pub use events::*;
pub use gem::*;
pub use ledger::*;
pub use placement::*;
pub use progress::*;
pub use session::*;
pub use stage::*;
pub use types::*;

mod board;
mod catalog;
mod cell;
mod config;
mod dig;
mod error;
mod events;
mod gem;
mod ledger;
mod placement;
mod progress;
mod session;
mod stage;
mod types;

/// Why a dig was turned down. Nothing changes on the board or the ledger.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DigRejection {
    NoStage,
    InputDisabled,
    OutOfBounds,
    CoolingDown,
    AlreadyRevealed,
    NotEnoughPickaxes { needed: u32, available: u32 },
}

/// What an accepted dig did.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DigReport {
    /// Pickaxes paid.
    pub cost: u32,
    /// The dug cell first, then the blast area in neighbor order.
    pub revealed: SmallVec<[Coord2; 9]>,
    pub spawned: Vec<Placement>,
    pub collected: Vec<GemId>,
    pub exploded: bool,
    pub stage_completed: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub enum DigOutcome {
    Rejected(DigRejection),
    Dug(DigReport),
}

impl DigOutcome {
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Dug(_))
    }

    pub fn report(&self) -> Option<&DigReport> {
        match self {
            Self::Dug(report) => Some(report),
            Self::Rejected(_) => None,
        }
    }

    pub const fn rejection(&self) -> Option<DigRejection> {
        match self {
            Self::Rejected(reason) => Some(*reason),
            Self::Dug(_) => None,
        }
    }
}
