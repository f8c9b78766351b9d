//! Difficulty curve resolution
//!
//! Levels get harder only through their configuration table. At runtime the
//! resolver's one job is the hard speed cap.

use serde::{Deserialize, Serialize};

use super::state::GenerationEvent;
use crate::LevelConfiguration;
use crate::consts::{FAIRNESS_SPEED_CAP, MIN_REACTION_TIME_SECS};

/// Obstacle spacing bounds for a level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpacingEnvelope {
    pub min: f32,
    pub max: f32,
}

impl SpacingEnvelope {
    pub fn contains(&self, spacing: f32) -> bool {
        (self.min..=self.max).contains(&spacing)
    }
}

/// Speed after all multipliers, never above the level's cap.
///
/// Negative or NaN products resolve to a standstill.
pub fn resolve_effective_speed(
    config: &LevelConfiguration,
    base_speed: f32,
    sprint_multiplier: f32,
) -> f32 {
    let raw = base_speed * sprint_multiplier * config.speed_multiplier;
    let cap = config.max_effective_speed.min(FAIRNESS_SPEED_CAP).max(0.0);
    if raw.is_nan() { 0.0 } else { raw.clamp(0.0, cap) }
}

pub fn resolve_spacing_envelope(config: &LevelConfiguration) -> SpacingEnvelope {
    SpacingEnvelope {
        min: config.min_obstacle_spacing,
        max: config.max_obstacle_spacing,
    }
}

/// Worst-case seconds between two same-lane obstacles at full speed
pub fn reaction_time(config: &LevelConfiguration) -> f32 {
    config.min_obstacle_spacing / config.max_effective_speed
}

/// Non-fatal check of the level against the reaction-time floor
pub fn check_reaction_time(config: &LevelConfiguration) -> Option<GenerationEvent> {
    let reaction_secs = reaction_time(config);
    if reaction_secs >= MIN_REACTION_TIME_SECS {
        return None;
    }
    log::warn!(
        "Level {}: worst-case reaction time {:.3}s is below the {:.2}s floor",
        config.level,
        reaction_secs,
        MIN_REACTION_TIME_SECS
    );
    Some(GenerationEvent::ReactionTimeBelowFloor {
        level: config.level,
        reaction_secs,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::{BASE_RUN_SPEED, SPRINT_MULTIPLIER};
    use proptest::prelude::*;

    #[test]
    fn test_speed_below_cap_passes_through() {
        let config = LevelConfiguration::for_level(1);
        let speed = resolve_effective_speed(&config, 10.0, 1.0);
        assert!((speed - 10.0 * config.speed_multiplier).abs() < 1e-5);
    }

    #[test]
    fn test_sprint_is_clamped() {
        let config = LevelConfiguration::for_level(10);
        let speed = resolve_effective_speed(&config, BASE_RUN_SPEED, SPRINT_MULTIPLIER * 10.0);
        assert_eq!(speed, config.max_effective_speed);
    }

    #[test]
    fn test_nan_and_negative_resolve_to_zero() {
        let config = LevelConfiguration::default();
        assert_eq!(resolve_effective_speed(&config, f32::NAN, 1.0), 0.0);
        assert_eq!(resolve_effective_speed(&config, 10.0, -1.0), 0.0);
    }

    #[test]
    fn test_spacing_envelope_matches_config() {
        let config = LevelConfiguration::for_level(3);
        let envelope = resolve_spacing_envelope(&config);
        assert_eq!(envelope.min, config.min_obstacle_spacing);
        assert_eq!(envelope.max, config.max_obstacle_spacing);
        assert!(envelope.contains(config.min_obstacle_spacing));
        assert!(!envelope.contains(config.max_obstacle_spacing + 1.0));
    }

    #[test]
    fn test_reaction_floor_diagnostic() {
        let config = LevelConfiguration::default();
        assert!(check_reaction_time(&config).is_none());

        let mut fast = LevelConfiguration::default();
        fast.min_obstacle_spacing = 5.0;
        fast.max_effective_speed = FAIRNESS_SPEED_CAP;
        assert!(matches!(
            check_reaction_time(&fast),
            Some(GenerationEvent::ReactionTimeBelowFloor { level: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn effective_speed_never_exceeds_cap(
            level in 1u32..=10,
            base in 0.0f32..1_000.0,
            sprint in 0.0f32..100.0,
        ) {
            let config = LevelConfiguration::for_level(level);
            let speed = resolve_effective_speed(&config, base, sprint);
            prop_assert!(speed <= config.max_effective_speed);
            prop_assert!(speed >= 0.0);
        }
    }
}
