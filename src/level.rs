//! Per-level generation tunables
//!
//! A `LevelConfiguration` is loaded once when a level starts and is read-only
//! for the level's lifetime. The built-in ladder covers levels 1 through 10.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::ConfigurationError;

/// Number of levels in the built-in difficulty ladder
pub const LADDER_LEVELS: u32 = 10;

/// Immutable tunables for one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelConfiguration {
    /// 1-based level number
    pub level: u32,
    /// Level length in seconds
    pub duration_secs: f32,

    // === Obstacles ===
    pub min_obstacle_spacing: f32,
    pub max_obstacle_spacing: f32,
    /// Chance a random obstacle is lethal (Avoid/Pylon)
    pub avoid_obstacle_probability: f32,

    // === Collectibles ===
    pub min_collectible_spacing: f32,
    pub max_collectible_spacing: f32,
    /// Weight of the dominant line lane when picking a collectible lane
    pub collectible_line_bias: f32,
    pub collectible_above_obstacle_chance: f32,
    pub mega_collectible_spawn_ratio: f32,
    pub mega_collectible_point_value: u32,

    // === Speed ===
    pub speed_multiplier: f32,
    /// Per-level fairness cap, never above `FAIRNESS_SPEED_CAP`
    pub max_effective_speed: f32,

    // === Patterns ===
    pub min_pattern_difficulty: u8,
    pub max_pattern_difficulty: u8,
    /// Share of spawn decisions that try a curated pattern first
    pub pattern_usage_ratio: f32,
}

impl Default for LevelConfiguration {
    fn default() -> Self {
        Self::ladder_entry(1)
    }
}

impl LevelConfiguration {
    /// Built-in configuration for `level`, clamped onto the ladder
    pub fn for_level(level: u32) -> Self {
        Self::ladder_entry(level.clamp(1, LADDER_LEVELS))
    }

    /// The whole built-in ladder, easiest first
    pub fn ladder() -> Vec<Self> {
        (1..=LADDER_LEVELS).map(Self::ladder_entry).collect()
    }

    fn ladder_entry(level: u32) -> Self {
        // 0.0 at level 1, 1.0 at the top of the ladder
        let t = (level - 1) as f32 / (LADDER_LEVELS - 1) as f32;
        let lerp = |a: f32, b: f32| a + (b - a) * t;

        Self {
            level,
            duration_secs: 60.0 + 6.0 * (level - 1) as f32,

            min_obstacle_spacing: lerp(20.0, 14.0),
            max_obstacle_spacing: lerp(32.0, 22.0),
            avoid_obstacle_probability: lerp(0.1, 0.45),

            min_collectible_spacing: 4.0,
            max_collectible_spacing: lerp(8.0, 6.0),
            collectible_line_bias: 0.7,
            collectible_above_obstacle_chance: lerp(0.3, 0.5),
            mega_collectible_spawn_ratio: 0.05,
            mega_collectible_point_value: 10,

            speed_multiplier: lerp(1.0, 1.6),
            max_effective_speed: lerp(20.0, 36.0),

            min_pattern_difficulty: (1 + (level - 1) / 2) as u8,
            max_pattern_difficulty: (2 + level).min(MAX_PATTERN_DIFFICULTY as u32) as u8,
            pattern_usage_ratio: lerp(0.2, 0.6),
        }
    }

    /// Parse and validate a level handed over by a loading collaborator
    pub fn from_json(json: &str) -> Result<Self, ConfigurationError> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant a playable level must hold
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.level == 0 {
            return Err(ConfigurationError::ZeroLevel);
        }
        if !(self.duration_secs > 0.0 && self.duration_secs.is_finite()) {
            return Err(ConfigurationError::NonPositiveDuration(self.duration_secs));
        }
        if !spacing_is_valid(self.min_obstacle_spacing, self.max_obstacle_spacing) {
            return Err(ConfigurationError::InvalidObstacleSpacing {
                min: self.min_obstacle_spacing,
                max: self.max_obstacle_spacing,
            });
        }
        if !spacing_is_valid(self.min_collectible_spacing, self.max_collectible_spacing) {
            return Err(ConfigurationError::InvalidCollectibleSpacing {
                min: self.min_collectible_spacing,
                max: self.max_collectible_spacing,
            });
        }

        let ratios = [
            ("avoid_obstacle_probability", self.avoid_obstacle_probability),
            ("collectible_line_bias", self.collectible_line_bias),
            (
                "collectible_above_obstacle_chance",
                self.collectible_above_obstacle_chance,
            ),
            ("mega_collectible_spawn_ratio", self.mega_collectible_spawn_ratio),
            ("pattern_usage_ratio", self.pattern_usage_ratio),
        ];
        for (name, value) in ratios {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigurationError::RatioOutOfRange { name, value });
            }
        }

        if !(self.speed_multiplier > 0.0 && self.speed_multiplier.is_finite()) {
            return Err(ConfigurationError::InvalidSpeedMultiplier(self.speed_multiplier));
        }
        if !(self.max_effective_speed > 0.0 && self.max_effective_speed <= FAIRNESS_SPEED_CAP) {
            return Err(ConfigurationError::SpeedAboveFairnessCap {
                speed: self.max_effective_speed,
                cap: FAIRNESS_SPEED_CAP,
            });
        }

        let (min_d, max_d) = (self.min_pattern_difficulty, self.max_pattern_difficulty);
        if min_d > max_d || min_d < MIN_PATTERN_DIFFICULTY || max_d > MAX_PATTERN_DIFFICULTY {
            return Err(ConfigurationError::InvalidDifficultyRange { min: min_d, max: max_d });
        }
        if self.mega_collectible_point_value == 0 {
            return Err(ConfigurationError::ZeroMegaPointValue);
        }

        Ok(())
    }

    /// Midpoint of the level's pattern difficulty band
    pub fn difficulty_midpoint(&self) -> f32 {
        (self.min_pattern_difficulty as f32 + self.max_pattern_difficulty as f32) / 2.0
    }
}

/// Positive, ordered, and no wider than `MAX_SPACING` (rejects NaN and infinity)
fn spacing_is_valid(min: f32, max: f32) -> bool {
    min > 0.0 && min <= max && max <= MAX_SPACING
}
