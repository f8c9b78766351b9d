//! Lane Runway - obstacle and collectible generation for a three-lane runner
//!
//! Core modules:
//! - `level`: Per-level tunables and the built-in difficulty ladder
//! - `sim`: Deterministic generation (patterns, scheduling, recovery zones, collectibles)
//! - `error`: Load-time errors for levels and patterns

pub mod error;
pub mod level;
pub mod sim;

pub use error::{ConfigurationError, InvalidPatternError};
pub use level::LevelConfiguration;

/// Generation constants shared by every level
pub mod consts {
    /// The three lanes, left to right
    pub const LANES: [i8; 3] = [-1, 0, 1];

    /// Absolute upper bound on effective speed (units/s), whatever the multipliers
    pub const FAIRNESS_SPEED_CAP: f32 = 40.0;
    /// Worst-case time the player gets between same-lane obstacles (seconds)
    pub const MIN_REACTION_TIME_SECS: f32 = 0.35;
    /// Running speed before level and sprint multipliers (units/s)
    pub const BASE_RUN_SPEED: f32 = 18.0;
    /// Speed multiplier while sprint is held
    pub const SPRINT_MULTIPLIER: f32 = 1.5;

    /// How far ahead of the player the runway is generated
    pub const SPAWN_LOOKAHEAD: f32 = 120.0;

    /// Widest obstacle or collectible spacing a level may ask for (units)
    pub const MAX_SPACING: f32 = 1000.0;

    /// Collectible slots settled per planner call; the rest wait for the next tick
    pub const MAX_COLLECTIBLE_SLOTS_PER_FILL: usize = 256;

    /// Obstacle-free buffer after a Palisade (minigame) obstacle
    pub const RECOVERY_ZONE_LENGTH: f32 = 15.0;

    /// Depth of one z-cell; obstacles closer than this share a row
    pub const Z_CELL_LENGTH: f32 = 1.0;

    /// Lane redraws before a lethal random obstacle is forced passable
    pub const LANE_RESAMPLE_LIMIT: u32 = 8;

    /// Records kept behind the cursor at minimum (units)
    pub const MIN_TRACKING_HORIZON: f32 = 30.0;
    /// Hard cap on tracked placement records
    pub const MAX_TRACKED_RECORDS: usize = 64;

    /// Points for a standard collectible
    pub const STANDARD_COLLECTIBLE_POINTS: u32 = 1;

    /// Pattern difficulty rating bounds
    pub const MIN_PATTERN_DIFFICULTY: u8 = 1;
    pub const MAX_PATTERN_DIFFICULTY: u8 = 10;
}

/// True when two z positions fall in the same z-cell
#[inline]
pub fn same_cell(a: f32, b: f32) -> bool {
    (a - b).abs() < consts::Z_CELL_LENGTH
}

/// True when `lane` is one of the three runway lanes
#[inline]
pub fn is_valid_lane(lane: i8) -> bool {
    consts::LANES.contains(&lane)
}
