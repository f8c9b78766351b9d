//! Load-time errors
//!
//! Generation itself never fails: every runtime fallback resolves inside the
//! scheduler tick. Only malformed level or pattern data is reported here.

use thiserror::Error;

/// A level configuration that must not be played.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigurationError {
    #[error("level number must be at least 1")]
    ZeroLevel,
    #[error("level duration {0} must be positive and finite")]
    NonPositiveDuration(f32),
    #[error("obstacle spacing [{min}, {max}] is inverted, non-positive or too wide")]
    InvalidObstacleSpacing { min: f32, max: f32 },
    #[error("collectible spacing [{min}, {max}] is inverted, non-positive or too wide")]
    InvalidCollectibleSpacing { min: f32, max: f32 },
    #[error("{name} = {value} must be between 0.0 and 1.0")]
    RatioOutOfRange { name: &'static str, value: f32 },
    #[error("speed multiplier {0} must be positive and finite")]
    InvalidSpeedMultiplier(f32),
    #[error("max effective speed {speed} must be in (0, {cap}]")]
    SpeedAboveFairnessCap { speed: f32, cap: f32 },
    #[error("pattern difficulty [{min}, {max}] is inverted or outside 1..=10")]
    InvalidDifficultyRange { min: u8, max: u8 },
    #[error("mega collectible point value must be non-zero")]
    ZeroMegaPointValue,
    #[error("malformed level data: {0}")]
    Malformed(String),
}

/// Why a pattern was refused a place in the library.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InvalidPatternError {
    #[error("pattern '{name}': length {length} must be positive and finite")]
    NonPositiveLength { name: String, length: f32 },
    #[error("pattern '{name}' has no obstacles")]
    Empty { name: String },
    #[error("pattern '{name}': difficulty {rating} outside 1..=10")]
    DifficultyOutOfRange { name: String, rating: u8 },
    #[error("pattern '{name}': level range [{min}, {max}] is inverted")]
    InvalidLevelRange { name: String, min: u32, max: u32 },
    #[error("pattern '{name}': obstacle {index} offset {offset} outside [0, {length}]")]
    OffsetOutOfBounds {
        name: String,
        index: usize,
        offset: f32,
        length: f32,
    },
    #[error("pattern '{name}': obstacle {index} lane {lane} is not -1, 0 or 1")]
    InvalidLane { name: String, index: usize, lane: i8 },
    #[error("pattern '{name}': row at offset {offset} blocks all three lanes")]
    Unsolvable { name: String, offset: f32 },
    #[error("pattern '{name}': obstacle {index} sits inside the recovery zone of a palisade")]
    InsideRecoveryZone { name: String, index: usize },
    #[error("pattern '{name}' is already registered")]
    DuplicateName { name: String },
    #[error("malformed pattern data: {0}")]
    Malformed(String),
}

impl InvalidPatternError {
    /// True for rejections caused by an all-lethal row
    pub fn is_unsolvable(&self) -> bool {
        matches!(self, InvalidPatternError::Unsolvable { .. })
    }
}
