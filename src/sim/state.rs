//! Scheduler-owned generation state
//!
//! Everything here is mutated only inside a scheduler tick.

use std::collections::VecDeque;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::obstacle::ObstaclePlacement;
use crate::consts::MAX_TRACKED_RECORDS;

/// Where a placement came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementOrigin {
    Pattern,
    Random,
}

/// An emitted obstacle remembered for clearance checks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlacedObstacleRecord {
    pub placement: ObstaclePlacement,
    pub origin: PlacementOrigin,
}

impl PlacedObstacleRecord {
    #[inline]
    pub fn lane(&self) -> i8 {
        self.placement.lane
    }

    #[inline]
    pub fn z(&self) -> f32 {
        self.placement.z
    }
}

/// Bounded window of placed obstacles, ordered by z.
///
/// The cap evicts the lowest z first, so records nearest the cursor survive
/// however a pattern lists its members.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordWindow {
    records: VecDeque<PlacedObstacleRecord>,
}

impl RecordWindow {
    pub fn new() -> Self {
        Self {
            records: VecDeque::with_capacity(MAX_TRACKED_RECORDS),
        }
    }

    pub fn push(&mut self, placement: ObstaclePlacement, origin: PlacementOrigin) {
        let at = self.records.partition_point(|r| r.z() <= placement.z);
        self.records.insert(at, PlacedObstacleRecord { placement, origin });
        while self.records.len() > MAX_TRACKED_RECORDS {
            self.records.pop_front();
        }
    }

    /// Drop every record behind `horizon_z`
    pub fn prune_behind(&mut self, horizon_z: f32) {
        self.records.retain(|r| r.z() >= horizon_z);
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlacedObstacleRecord> {
        self.records.iter()
    }

    pub fn in_lane(&self, lane: i8) -> impl Iterator<Item = &PlacedObstacleRecord> {
        self.records.iter().filter(move |r| r.lane() == lane)
    }

    /// Furthest-ahead record in `lane`
    pub fn last_in_lane(&self, lane: i8) -> Option<&PlacedObstacleRecord> {
        self.records.iter().rev().find(|r| r.lane() == lane)
    }

    /// Records whose z lies in `[from, to]`
    pub fn between(&self, from: f32, to: f32) -> impl Iterator<Item = &PlacedObstacleRecord> {
        self.records.iter().filter(move |r| r.z() >= from && r.z() <= to)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Why a tick fell back to random generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    EmptyCandidatePool,
    ClearanceFailed,
}

/// Diagnostics for the observability collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GenerationEvent {
    PatternSpawned { name: String, z: f32 },
    PatternClearanceFailed { name: String, z: f32 },
    FallbackToRandom { reason: FallbackReason, z: f32 },
    PatternRejectedUnsolvable { name: String },
    /// A lethal obstacle was swapped for a Jump to keep a row open
    PassableSubstituted { lane: i8, z: f32 },
    /// No safe lane found for a lethal random obstacle; it was made passable
    LaneResampleExhausted { z: f32 },
    ReactionTimeBelowFloor { level: u32, reaction_secs: f32 },
}

impl GenerationEvent {
    /// Stable event name for log sinks
    pub fn name(&self) -> &'static str {
        match self {
            GenerationEvent::PatternSpawned { .. } => "pattern-spawned",
            GenerationEvent::PatternClearanceFailed { .. } => "pattern-clearance-failed",
            GenerationEvent::FallbackToRandom { .. } => "fallback-to-random",
            GenerationEvent::PatternRejectedUnsolvable { .. } => "pattern-rejected-unsolvable",
            GenerationEvent::PassableSubstituted { .. } => "passable-substituted",
            GenerationEvent::LaneResampleExhausted { .. } => "lane-resample-exhausted",
            GenerationEvent::ReactionTimeBelowFloor { .. } => "reaction-time-below-floor",
        }
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}
