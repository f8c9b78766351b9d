//! Obstacle kinds, placements and row solvability
//!
//! A "row" is every obstacle inside one z-cell window. A row is solvable while
//! at least one lane holds no lethal obstacle.

use serde::{Deserialize, Serialize};

use crate::consts::{LANES, Z_CELL_LENGTH};

/// Obstacle types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObstacleKind {
    Jump,
    Avoid,
    /// Passable, but starts a minigame and opens a recovery zone
    Palisade,
    Pylon,
    BroadJump,
}

impl ObstacleKind {
    /// Kinds the player can legally traverse
    pub const PASSABLE: [ObstacleKind; 3] =
        [ObstacleKind::Jump, ObstacleKind::Palisade, ObstacleKind::BroadJump];
    /// Kinds that end the run unless avoided
    pub const LETHAL: [ObstacleKind; 2] = [ObstacleKind::Avoid, ObstacleKind::Pylon];

    pub fn is_passable(self) -> bool {
        matches!(
            self,
            ObstacleKind::Jump | ObstacleKind::Palisade | ObstacleKind::BroadJump
        )
    }

    #[inline]
    pub fn is_lethal(self) -> bool {
        !self.is_passable()
    }

    /// Palisades hand control to a minigame
    pub fn triggers_minigame(self) -> bool {
        self == ObstacleKind::Palisade
    }
}

/// One obstacle inside a pattern, relative to the pattern origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstacleDefinition {
    pub kind: ObstacleKind,
    pub lane: i8,
    pub z_offset: f32,
}

impl ObstacleDefinition {
    pub fn new(kind: ObstacleKind, lane: i8, z_offset: f32) -> Self {
        Self {
            kind,
            lane,
            z_offset,
        }
    }

    /// Translate to an absolute placement
    pub fn place(&self, origin_z: f32) -> ObstaclePlacement {
        ObstaclePlacement {
            kind: self.kind,
            lane: self.lane,
            z: origin_z + self.z_offset,
        }
    }
}

/// An obstacle on the runway, as handed to the world
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePlacement {
    pub kind: ObstacleKind,
    pub lane: i8,
    /// Absolute runway position
    pub z: f32,
}

/// Find the first row (in z order) in which every lane holds a lethal obstacle.
///
/// Returns the indices of that row's members, sorted by z.
pub fn find_blocked_row(obstacles: &[ObstaclePlacement]) -> Option<Vec<usize>> {
    let mut order: Vec<usize> = (0..obstacles.len()).collect();
    order.sort_by(|&a, &b| obstacles[a].z.total_cmp(&obstacles[b].z).then(a.cmp(&b)));

    for (i, &anchor) in order.iter().enumerate() {
        let start = obstacles[anchor].z;
        let row: Vec<usize> = order[i..]
            .iter()
            .copied()
            .take_while(|&j| obstacles[j].z - start < Z_CELL_LENGTH)
            .collect();
        if open_lane(obstacles, &row).is_none() {
            return Some(row);
        }
    }
    None
}

/// First lane (left to right) with no lethal member in `row`
pub fn open_lane(obstacles: &[ObstaclePlacement], row: &[usize]) -> Option<i8> {
    LANES.iter().copied().find(|&lane| {
        !row
            .iter()
            .any(|&j| obstacles[j].lane == lane && obstacles[j].kind.is_lethal())
    })
}
