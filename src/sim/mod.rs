//! Deterministic generation module
//!
//! All placement logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only, threaded through every call
//! - Stable iteration order (registry insertion order, emission order)
//! - Bounded work per tick
//! - No rendering, input or platform dependencies

pub mod collectible;
pub mod difficulty;
pub mod obstacle;
pub mod pattern;
pub mod recovery;
pub mod runway;
pub mod scheduler;
pub mod state;

pub use collectible::{CollectiblePlacement, CollectiblePlanner};
pub use difficulty::{
    SpacingEnvelope, check_reaction_time, reaction_time, resolve_effective_speed,
    resolve_spacing_envelope,
};
pub use obstacle::{ObstacleDefinition, ObstacleKind, ObstaclePlacement, find_blocked_row};
pub use pattern::{ObstaclePattern, PatternLibrary, builtin_patterns};
pub use recovery::RecoveryZone;
pub use runway::{Runway, TickInput, TickOutput};
pub use scheduler::{ObstacleScheduler, Spawn, SpawnMode, choose_mode, pick_weighted};
pub use state::{
    FallbackReason, GenerationEvent, PlacedObstacleRecord, PlacementOrigin, RecordWindow,
    RngState,
};
