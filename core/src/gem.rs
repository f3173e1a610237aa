use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use crate::*;

/// Handle of one gem instance within its stage.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GemId(pub u16);

impl GemId {
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl core::fmt::Display for GemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemInstance {
    id: GemId,
    shape: GemShape,
    orientation: Orientation,
    placement: Option<Rect>,
    cells: Vec<Coord2>,
    collected: bool,
}

impl GemInstance {
    pub fn new(id: GemId, shape: GemShape, orientation: Orientation) -> Self {
        Self {
            id,
            shape,
            orientation,
            placement: None,
            cells: Vec::new(),
            collected: false,
        }
    }

    pub const fn id(&self) -> GemId {
        self.id
    }

    pub const fn shape(&self) -> GemShape {
        self.shape
    }

    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub const fn footprint(&self) -> Footprint {
        self.shape.footprint(self.orientation)
    }

    pub const fn area(&self) -> CellCount {
        self.shape.area()
    }

    /// Top-left corner once placed.
    pub fn position(&self) -> Option<Coord2> {
        self.placement.map(|rect| rect.origin)
    }

    pub const fn placement(&self) -> Option<Rect> {
        self.placement
    }

    pub fn cells(&self) -> &[Coord2] {
        &self.cells
    }

    pub const fn is_placed(&self) -> bool {
        self.placement.is_some()
    }

    pub const fn is_collected(&self) -> bool {
        self.collected
    }
}

/// The gems of one stage, split into those still in reserve and those on the board.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemPool {
    gems: Vec<GemInstance>,
    unplaced: Vec<GemId>,
    placed: Vec<GemId>,
}

impl GemPool {
    /// One instance per requested unit, in request order.
    pub fn from_stage<C: StageCatalog + ?Sized>(catalog: &C, stage: &StageConfig) -> Result<Self> {
        let mut gems = Vec::with_capacity(stage.total_gem_count());
        for request in &stage.gems {
            let shape = catalog.gem_shape(request.shape)?;
            for _ in 0..request.count {
                let id = GemId(gems.len().try_into().map_err(|_| {
                    GameError::InvalidCatalog(alloc::format!("stage {} has too many gems", stage.id))
                })?);
                gems.push(GemInstance::new(id, shape, request.orientation));
            }
        }
        Ok(Self::new(gems))
    }

    pub fn new(gems: Vec<GemInstance>) -> Self {
        let unplaced = gems.iter().map(GemInstance::id).collect();
        Self {
            gems,
            unplaced,
            placed: Vec::new(),
        }
    }

    pub fn gem(&self, id: GemId) -> &GemInstance {
        &self.gems[id.index()]
    }

    pub fn gems(&self) -> &[GemInstance] {
        &self.gems
    }

    pub fn unplaced(&self) -> &[GemId] {
        &self.unplaced
    }

    pub fn placed(&self) -> &[GemId] {
        &self.placed
    }

    /// `unplaced + placed`, constant for the lifetime of the pool.
    pub fn total(&self) -> usize {
        self.unplaced.len() + self.placed.len()
    }

    pub fn collected_count(&self) -> usize {
        self.placed
            .iter()
            .filter(|&&id| self.gem(id).collected)
            .count()
    }

    /// Saturates at `CellCount::MAX`.
    pub fn unplaced_area(&self) -> CellCount {
        self.unplaced
            .iter()
            .fold(0, |area: CellCount, &id| area.saturating_add(self.gem(id).area()))
    }

    /// Footprints of the reserve, optionally leaving one gem out.
    pub(crate) fn unplaced_items(&self, except: Option<GemId>) -> Vec<PackItem> {
        self.unplaced
            .iter()
            .filter(|&&id| Some(id) != except)
            .map(|&id| PackItem::new(id, self.gem(id).footprint()))
            .collect()
    }

    /// Moves a gem from the reserve onto the board. Each gem makes this move once; returns `false` for a gem that
    /// is not in the reserve.
    pub(crate) fn commit(&mut self, id: GemId, rect: Rect) -> bool {
        let Some(slot) = self.unplaced.iter().position(|&other| other == id) else {
            log::error!("Gem {id} committed twice, ignoring");
            return false;
        };
        self.unplaced.remove(slot);
        self.placed.push(id);

        let gem = &mut self.gems[id.index()];
        gem.placement = Some(rect);
        gem.cells = rect.cells().collect();
        true
    }

    pub(crate) fn collect(&mut self, id: GemId) -> bool {
        let gem = &mut self.gems[id.index()];
        if gem.collected || !gem.is_placed() {
            return false;
        }
        gem.collected = true;
        true
    }
}
