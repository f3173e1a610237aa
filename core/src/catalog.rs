use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec;
use alloc::vec::Vec;
use hashbrown::{HashMap, HashSet};
use serde::{Deserialize, Serialize};

use crate::*;

pub type ShapeId = u32;
pub type StageId = u32;

/// Stage-authored intent for a non-square gem.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Orientation {
    /// Placed wider than tall.
    Horizontal,
    /// Placed taller than wide.
    #[default]
    Vertical,
}

/// Resolved on-board dimensions of a shape for one orientation.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Footprint {
    pub width: Coord,
    pub height: Coord,
    pub rotated: bool,
}

impl Footprint {
    pub const fn size(self) -> Coord2 {
        (self.width, self.height)
    }

    pub const fn area(self) -> CellCount {
        mult(self.width, self.height)
    }
}

/// Unrotated gem definition shared by every instance of a type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GemShape {
    pub id: ShapeId,
    pub width: Coord,
    pub height: Coord,
}

impl GemShape {
    pub const fn new(id: ShapeId, width: Coord, height: Coord) -> Self {
        Self { id, width, height }
    }

    pub const fn is_square(&self) -> bool {
        self.width == self.height
    }

    pub const fn area(&self) -> CellCount {
        mult(self.width, self.height)
    }

    /// Single deterministic rotation per orientation; squares never rotate.
    pub const fn footprint(&self, orientation: Orientation) -> Footprint {
        let rotated = match orientation {
            _ if self.is_square() => false,
            Orientation::Horizontal => self.width < self.height,
            Orientation::Vertical => self.height < self.width,
        };
        if rotated {
            Footprint {
                width: self.height,
                height: self.width,
                rotated,
            }
        } else {
            Footprint {
                width: self.width,
                height: self.height,
                rotated,
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GemRequest {
    pub shape: ShapeId,
    pub count: u16,
    #[serde(default)]
    pub orientation: Orientation,
}

impl GemRequest {
    pub const fn new(shape: ShapeId, count: u16) -> Self {
        Self {
            shape,
            count,
            orientation: Orientation::Vertical,
        }
    }

    pub const fn oriented(self, orientation: Orientation) -> Self {
        Self {
            orientation,
            ..self
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    pub id: StageId,
    pub width: Coord,
    pub height: Coord,
    #[serde(default)]
    pub dynamite: CellCount,
    pub gems: Vec<GemRequest>,
}

impl StageConfig {
    pub const fn size(&self) -> Coord2 {
        (self.width, self.height)
    }

    pub fn total_gem_count(&self) -> usize {
        self.gems.iter().map(|request| usize::from(request.count)).sum()
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RewardKind {
    #[default]
    Pickaxe,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reward {
    pub stage: StageId,
    #[serde(default)]
    pub kind: RewardKind,
    pub amount: u32,
}

/// Lookup of shapes, stages and rewards.
pub trait StageCatalog {
    fn stage_config(&self, id: StageId) -> Result<&StageConfig>;
    fn gem_shape(&self, id: ShapeId) -> Result<GemShape>;
    fn reward(&self, stage: StageId) -> Option<Reward>;
    /// Stage that follows `id`, if any.
    fn next_stage(&self, id: StageId) -> Option<StageId>;
    fn first_stage(&self) -> Option<StageId>;
    fn last_stage(&self) -> Option<StageId>;
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct CatalogData {
    shapes: Vec<GemShape>,
    stages: Vec<StageConfig>,
    #[serde(default)]
    rewards: Vec<Reward>,
}

#[derive(Clone, Debug)]
pub struct Catalog {
    shapes: HashMap<ShapeId, GemShape>,
    stages: Vec<StageConfig>,
    rewards: HashMap<StageId, Reward>,
}

impl Catalog {
    pub fn new(
        shapes: Vec<GemShape>,
        stages: Vec<StageConfig>,
        rewards: Vec<Reward>,
    ) -> Result<Self> {
        Self::from_data(CatalogData {
            shapes,
            stages,
            rewards,
        })
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let data: CatalogData =
            serde_json::from_str(json).map_err(|err| GameError::InvalidCatalog(err.to_string()))?;
        Self::from_data(data)
    }

    pub fn to_json_string(&self) -> Result<String> {
        let mut shapes: Vec<_> = self.shapes.values().copied().collect();
        shapes.sort_by_key(|shape| shape.id);
        let mut rewards: Vec<_> = self.rewards.values().copied().collect();
        rewards.sort_by_key(|reward| reward.stage);
        let data = CatalogData {
            shapes,
            stages: self.stages.clone(),
            rewards,
        };
        serde_json::to_string_pretty(&data).map_err(|err| GameError::InvalidCatalog(err.to_string()))
    }

    /// The shipped data set: nine shapes, five stages, one pickaxe reward per stage.
    pub fn builtin() -> Self {
        let shapes = vec![
            GemShape::new(1, 1, 2),
            GemShape::new(2, 1, 3),
            GemShape::new(3, 1, 4),
            GemShape::new(4, 1, 5),
            GemShape::new(5, 2, 2),
            GemShape::new(6, 2, 3),
            GemShape::new(7, 2, 4),
            GemShape::new(8, 3, 3),
            GemShape::new(9, 4, 4),
        ];
        let stage = |id, size, dynamite, gems: Vec<GemRequest>| StageConfig {
            id,
            width: size,
            height: size,
            dynamite,
            gems,
        };
        let stages = vec![
            stage(
                1,
                4,
                0,
                vec![GemRequest::new(1, 2), GemRequest::new(2, 1), GemRequest::new(5, 1)],
            ),
            stage(
                2,
                5,
                0,
                vec![
                    GemRequest::new(1, 2),
                    GemRequest::new(2, 2),
                    GemRequest::new(6, 1),
                ],
            ),
            stage(
                3,
                6,
                1,
                vec![
                    GemRequest::new(1, 1),
                    GemRequest::new(2, 2),
                    GemRequest::new(5, 1),
                    GemRequest::new(6, 2),
                ],
            ),
            stage(
                4,
                7,
                2,
                vec![
                    GemRequest::new(1, 1),
                    GemRequest::new(3, 2),
                    GemRequest::new(5, 2),
                    GemRequest::new(6, 1),
                    GemRequest::new(8, 1),
                ],
            ),
            stage(
                5,
                8,
                2,
                vec![
                    GemRequest::new(1, 2),
                    GemRequest::new(2, 2),
                    GemRequest::new(4, 2),
                    GemRequest::new(7, 1),
                    GemRequest::new(9, 1),
                ],
            ),
        ];
        let rewards = (1..=5)
            .map(|stage| Reward {
                stage,
                kind: RewardKind::Pickaxe,
                amount: stage * 5,
            })
            .collect();

        match Self::new(shapes, stages, rewards) {
            Ok(catalog) => catalog,
            Err(err) => unreachable!("builtin catalog is valid: {err}"),
        }
    }

    fn from_data(data: CatalogData) -> Result<Self> {
        let mut shapes = HashMap::with_capacity(data.shapes.len());
        for shape in data.shapes {
            if shape.width == 0 || shape.height == 0 {
                return Err(GameError::InvalidCatalog(format!(
                    "shape {} has an empty dimension",
                    shape.id
                )));
            }
            if shapes.insert(shape.id, shape).is_some() {
                return Err(GameError::InvalidCatalog(format!(
                    "duplicate shape id {}",
                    shape.id
                )));
            }
        }

        let mut seen = HashSet::with_capacity(data.stages.len());
        for stage in &data.stages {
            if !seen.insert(stage.id) {
                return Err(GameError::InvalidCatalog(format!(
                    "duplicate stage id {}",
                    stage.id
                )));
            }
            if stage.width == 0 || stage.height == 0 {
                return Err(GameError::InvalidBoardSize(stage.width, stage.height));
            }
            if let Some(request) = stage.gems.iter().find(|request| !shapes.contains_key(&request.shape)) {
                return Err(GameError::UnknownShape(request.shape));
            }
            let gem_area = stage.gems.iter().fold(0, |area: CellCount, request| {
                let shape = shapes[&request.shape];
                area.saturating_add(shape.area().saturating_mul(CellCount::from(request.count)))
            });
            let board_area = mult(stage.width, stage.height);
            if gem_area > board_area {
                return Err(GameError::OverCapacity {
                    gem_area,
                    usable_area: board_area,
                });
            }
        }

        let mut stages = data.stages;
        stages.sort_by_key(|stage| stage.id);

        let rewards = data
            .rewards
            .into_iter()
            .map(|reward| (reward.stage, reward))
            .collect();

        Ok(Self {
            shapes,
            stages,
            rewards,
        })
    }

    pub fn stages(&self) -> &[StageConfig] {
        &self.stages
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    fn stage_index(&self, id: StageId) -> Option<usize> {
        self.stages.binary_search_by_key(&id, |stage| stage.id).ok()
    }
}

impl StageCatalog for Catalog {
    fn stage_config(&self, id: StageId) -> Result<&StageConfig> {
        self.stage_index(id)
            .map(|index| &self.stages[index])
            .ok_or(GameError::UnknownStage(id))
    }

    fn gem_shape(&self, id: ShapeId) -> Result<GemShape> {
        self.shapes.get(&id).copied().ok_or(GameError::UnknownShape(id))
    }

    fn reward(&self, stage: StageId) -> Option<Reward> {
        self.rewards.get(&stage).copied()
    }

    fn next_stage(&self, id: StageId) -> Option<StageId> {
        let index = self.stage_index(id)?;
        self.stages.get(index + 1).map(|stage| stage.id)
    }

    fn first_stage(&self) -> Option<StageId> {
        self.stages.first().map(|stage| stage.id)
    }

    fn last_stage(&self) -> Option<StageId> {
        self.stages.last().map(|stage| stage.id)
    }
}
