//! Collectible placement
//!
//! Collectibles are laid behind the obstacle frontier, reading the obstacle
//! stream the scheduler has already produced. They follow a dominant "line"
//! lane, sometimes sit on top of passable obstacles, and never share a cell
//! with a lethal one.

use std::collections::VecDeque;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::obstacle::ObstaclePlacement;
use crate::LevelConfiguration;
use crate::consts::{
    LANES, MAX_COLLECTIBLE_SLOTS_PER_FILL, STANDARD_COLLECTIBLE_POINTS, Z_CELL_LENGTH,
};
use crate::same_cell;

/// A coin on the runway
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollectiblePlacement {
    pub lane: i8,
    pub z: f32,
    pub is_mega: bool,
    pub point_value: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct KnownObstacle {
    placement: ObstaclePlacement,
    /// Already carries a collectible on top
    claimed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectiblePlanner {
    /// Position of the next collectible slot, once drawn
    next_z: Option<f32>,
    last_z: f32,
    line_lane: i8,
    known: VecDeque<KnownObstacle>,
}

impl Default for CollectiblePlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectiblePlanner {
    pub fn new() -> Self {
        Self {
            next_z: None,
            last_z: 0.0,
            line_lane: 0,
            known: VecDeque::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Lane the coin line currently follows
    pub fn line_lane(&self) -> i8 {
        self.line_lane
    }

    /// Feed newly emitted obstacles
    pub fn observe(&mut self, obstacles: &[ObstaclePlacement]) {
        self.known.extend(obstacles.iter().map(|&placement| KnownObstacle {
            placement,
            claimed: false,
        }));
    }

    /// Place collectibles up to the obstacle frontier.
    ///
    /// Obstacles may still appear at or beyond `frontier_z`, so slots within
    /// one z-cell of it wait for a later call. At most
    /// `MAX_COLLECTIBLE_SLOTS_PER_FILL` slots are settled per call.
    pub fn fill<R: Rng + ?Sized>(
        &mut self,
        config: &LevelConfiguration,
        frontier_z: f32,
        rng: &mut R,
    ) -> Vec<CollectiblePlacement> {
        let settled_z = frontier_z - Z_CELL_LENGTH;
        let mut placed = Vec::new();

        for _ in 0..MAX_COLLECTIBLE_SLOTS_PER_FILL {
            let slot_z = match self.next_z {
                Some(z) => z,
                None => {
                    let z = self.last_z + draw_spacing(config, rng);
                    self.next_z = Some(z);
                    z
                }
            };
            if slot_z > settled_z {
                break;
            }

            let collectible = self.place_slot(config, slot_z, settled_z, rng);
            let anchor_z = collectible.map_or(slot_z, |c| c.z);
            self.last_z = anchor_z;
            self.next_z = Some(anchor_z + draw_spacing(config, rng));
            placed.extend(collectible);
        }

        let keep_from = self.last_z - Z_CELL_LENGTH;
        self.known.retain(|k| k.placement.z >= keep_from);
        placed
    }

    fn place_slot<R: Rng + ?Sized>(
        &mut self,
        config: &LevelConfiguration,
        slot_z: f32,
        settled_z: f32,
        rng: &mut R,
    ) -> Option<CollectiblePlacement> {
        let (lane, z) = if rng.random_bool(config.collectible_above_obstacle_chance as f64) {
            match self.claim_passable(slot_z, settled_z) {
                Some(spot) => spot,
                None => (self.biased_lane(config, slot_z, rng)?, slot_z),
            }
        } else {
            (self.biased_lane(config, slot_z, rng)?, slot_z)
        };

        let is_mega = rng.random_bool(config.mega_collectible_spawn_ratio as f64);
        Some(CollectiblePlacement {
            lane,
            z,
            is_mega,
            point_value: if is_mega {
                config.mega_collectible_point_value
            } else {
                STANDARD_COLLECTIBLE_POINTS
            },
        })
    }

    /// Nearest unclaimed passable obstacle in `[last_z, settled_z]` whose cell is
    /// free of lethal obstacles
    fn claim_passable(&mut self, slot_z: f32, settled_z: f32) -> Option<(i8, f32)> {
        let last_z = self.last_z;
        let index = self
            .known
            .iter()
            .enumerate()
            .filter(|(_, k)| {
                !k.claimed
                    && k.placement.kind.is_passable()
                    && k.placement.z >= last_z
                    && k.placement.z <= settled_z
                    && !self.is_lethal_cell(k.placement.lane, k.placement.z)
            })
            .min_by(|(_, a), (_, b)| {
                (a.placement.z - slot_z)
                    .abs()
                    .total_cmp(&(b.placement.z - slot_z).abs())
            })
            .map(|(i, _)| i)?;

        let known = &mut self.known[index];
        known.claimed = true;
        Some((known.placement.lane, known.placement.z))
    }

    /// Line lane with probability `collectible_line_bias`, else one of the
    /// other two. A lethal cell sends the choice to a free lane, and the line
    /// follows it there. `None` when every lane is lethal at `z`.
    fn biased_lane<R: Rng + ?Sized>(
        &mut self,
        config: &LevelConfiguration,
        z: f32,
        rng: &mut R,
    ) -> Option<i8> {
        let others: Vec<i8> = LANES.iter().copied().filter(|&l| l != self.line_lane).collect();
        let on_line = rng.random_bool(config.collectible_line_bias as f64);
        let lane = if on_line {
            self.line_lane
        } else {
            others[rng.random_range(0..others.len())]
        };

        if !self.is_lethal_cell(lane, z) {
            return Some(lane);
        }

        let free: Vec<i8> = LANES
            .iter()
            .copied()
            .filter(|&l| l != lane && !self.is_lethal_cell(l, z))
            .collect();
        if free.is_empty() {
            log::debug!("No free lane for a collectible at z={}", z);
            return None;
        }
        let resampled = free[rng.random_range(0..free.len())];
        if on_line {
            self.line_lane = resampled;
        }
        Some(resampled)
    }

    fn is_lethal_cell(&self, lane: i8, z: f32) -> bool {
        self.known.iter().any(|k| {
            k.placement.lane == lane && k.placement.kind.is_lethal() && same_cell(k.placement.z, z)
        })
    }
}

fn draw_spacing<R: Rng + ?Sized>(config: &LevelConfiguration, rng: &mut R) -> f32 {
    rng.random_range(config.min_collectible_spacing..=config.max_collectible_spacing)
}
