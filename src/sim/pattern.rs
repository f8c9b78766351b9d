//! Curated obstacle patterns and the registry they are loaded into
//!
//! Patterns are validated once at load time. A rejected pattern is reported
//! and left out; the rest of the set still loads.

use serde::{Deserialize, Serialize};

use super::obstacle::{ObstacleDefinition, ObstacleKind, ObstaclePlacement, find_blocked_row};
use crate::consts::*;
use crate::error::InvalidPatternError;
use crate::is_valid_lane;

/// A pre-authored group of obstacles spawned as a unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstaclePattern {
    pub name: String,
    /// Difficulty rating, 1 (gentle) to 10 (brutal)
    pub difficulty: u8,
    pub min_level: u32,
    pub max_level: u32,
    /// Cursor advance after spawning the pattern
    pub length: f32,
    pub obstacles: Vec<ObstacleDefinition>,
}

impl ObstaclePattern {
    /// Structural and solvability checks
    pub fn validate(&self) -> Result<(), InvalidPatternError> {
        let name = || self.name.clone();

        if !(self.length > 0.0 && self.length.is_finite()) {
            return Err(InvalidPatternError::NonPositiveLength {
                name: name(),
                length: self.length,
            });
        }
        if self.obstacles.is_empty() {
            return Err(InvalidPatternError::Empty { name: name() });
        }
        if !(MIN_PATTERN_DIFFICULTY..=MAX_PATTERN_DIFFICULTY).contains(&self.difficulty) {
            return Err(InvalidPatternError::DifficultyOutOfRange {
                name: name(),
                rating: self.difficulty,
            });
        }
        if self.min_level > self.max_level {
            return Err(InvalidPatternError::InvalidLevelRange {
                name: name(),
                min: self.min_level,
                max: self.max_level,
            });
        }

        for (index, def) in self.obstacles.iter().enumerate() {
            if !is_valid_lane(def.lane) {
                return Err(InvalidPatternError::InvalidLane {
                    name: name(),
                    index,
                    lane: def.lane,
                });
            }
            if !(0.0..=self.length).contains(&def.z_offset) {
                return Err(InvalidPatternError::OffsetOutOfBounds {
                    name: name(),
                    index,
                    offset: def.z_offset,
                    length: self.length,
                });
            }
        }

        let local = self.place_at(0.0);
        if let Some(row) = find_blocked_row(&local) {
            return Err(InvalidPatternError::Unsolvable {
                name: name(),
                offset: local[row[0]].z,
            });
        }

        // Spawned atomically, so nothing may land inside its own palisade's recovery zone
        for palisade in self.obstacles.iter().filter(|d| d.kind.triggers_minigame()) {
            let zone_end = palisade.z_offset + RECOVERY_ZONE_LENGTH;
            if let Some(index) = self
                .obstacles
                .iter()
                .position(|d| d.z_offset > palisade.z_offset && d.z_offset <= zone_end)
            {
                return Err(InvalidPatternError::InsideRecoveryZone { name: name(), index });
            }
        }

        Ok(())
    }

    /// True when the pattern may be used at `level` within the difficulty band
    pub fn is_eligible(&self, level: u32, difficulty_min: u8, difficulty_max: u8) -> bool {
        (self.min_level..=self.max_level).contains(&level)
            && (difficulty_min..=difficulty_max).contains(&self.difficulty)
    }

    /// Absolute placements with the pattern origin at `origin_z`
    pub fn place_at(&self, origin_z: f32) -> Vec<ObstaclePlacement> {
        self.obstacles.iter().map(|d| d.place(origin_z)).collect()
    }

    /// Smallest z offset in the pattern
    pub fn first_offset(&self) -> f32 {
        self.obstacles
            .iter()
            .map(|d| d.z_offset)
            .fold(f32::INFINITY, f32::min)
    }
}

/// Immutable registry of validated patterns, in insertion order
#[derive(Debug, Clone, Default)]
pub struct PatternLibrary {
    patterns: Vec<ObstaclePattern>,
    rejected: Vec<InvalidPatternError>,
}

impl PatternLibrary {
    /// Validate and register every pattern, keeping the ones that pass
    pub fn load(patterns: impl IntoIterator<Item = ObstaclePattern>) -> Self {
        let mut library = Self::default();

        for pattern in patterns {
            let result = if library.get(&pattern.name).is_some() {
                Err(InvalidPatternError::DuplicateName {
                    name: pattern.name.clone(),
                })
            } else {
                pattern.validate()
            };

            match result {
                Ok(()) => library.patterns.push(pattern),
                Err(err) => {
                    log::warn!("Rejected pattern: {}", err);
                    library.rejected.push(err);
                }
            }
        }

        log::info!(
            "Pattern library loaded: {} accepted, {} rejected",
            library.patterns.len(),
            library.rejected.len()
        );
        library
    }

    /// Parse a JSON array of patterns from a loading collaborator
    pub fn from_json(json: &str) -> Result<Self, InvalidPatternError> {
        let patterns: Vec<ObstaclePattern> = serde_json::from_str(json)
            .map_err(|e| InvalidPatternError::Malformed(e.to_string()))?;
        Ok(Self::load(patterns))
    }

    /// All registered patterns usable at `level` within `[difficulty_min, difficulty_max]`.
    /// Empty is a normal outcome.
    pub fn select_candidates(
        &self,
        level: u32,
        difficulty_min: u8,
        difficulty_max: u8,
    ) -> Vec<&ObstaclePattern> {
        self.patterns
            .iter()
            .filter(|p| p.is_eligible(level, difficulty_min, difficulty_max))
            .collect()
    }

    pub fn get(&self, name: &str) -> Option<&ObstaclePattern> {
        self.patterns.iter().find(|p| p.name == name)
    }

    pub fn patterns(&self) -> &[ObstaclePattern] {
        &self.patterns
    }

    /// Load-time rejections, in submission order
    pub fn rejected(&self) -> &[InvalidPatternError] {
        &self.rejected
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// The curated set shipped with the game
    pub fn builtin() -> Self {
        Self::load(builtin_patterns())
    }
}

fn pattern(
    name: &str,
    difficulty: u8,
    levels: (u32, u32),
    length: f32,
    obstacles: &[(ObstacleKind, i8, f32)],
) -> ObstaclePattern {
    ObstaclePattern {
        name: name.to_string(),
        difficulty,
        min_level: levels.0,
        max_level: levels.1,
        length,
        obstacles: obstacles
            .iter()
            .map(|&(kind, lane, z)| ObstacleDefinition::new(kind, lane, z))
            .collect(),
    }
}

/// Hand-authored patterns, easiest first
pub fn builtin_patterns() -> Vec<ObstaclePattern> {
    use crate::sim::obstacle::ObstacleKind::*;

    vec![
        pattern(
            "jump-ladder",
            1,
            (1, 10),
            20.0,
            &[(Jump, -1, 0.0), (Jump, 0, 8.0), (Jump, 1, 16.0)],
        ),
        pattern(
            "centre-block",
            2,
            (1, 10),
            16.0,
            &[(Avoid, 0, 0.0), (Jump, -1, 0.0), (BroadJump, 1, 10.0)],
        ),
        pattern(
            "jump-wall",
            3,
            (1, 10),
            12.0,
            &[(Jump, -1, 0.0), (Jump, 0, 0.0), (Jump, 1, 0.0)],
        ),
        pattern(
            "pylon-slalom",
            4,
            (2, 10),
            36.0,
            &[(Pylon, -1, 0.0), (Pylon, 1, 12.0), (Pylon, 0, 24.0)],
        ),
        pattern(
            "palisade-gate",
            5,
            (3, 10),
            20.0,
            &[(Avoid, -1, 0.0), (Palisade, 0, 0.0), (Avoid, 1, 0.0)],
        ),
        pattern(
            "squeeze",
            6,
            (4, 10),
            30.0,
            &[
                (Avoid, -1, 0.0),
                (BroadJump, 0, 0.0),
                (Pylon, 1, 0.0),
                (Avoid, 0, 20.0),
            ],
        ),
        pattern(
            "broad-run",
            7,
            (5, 10),
            40.0,
            &[
                (BroadJump, -1, 0.0),
                (BroadJump, 0, 0.0),
                (Avoid, 1, 0.0),
                (Pylon, -1, 20.0),
                (Jump, 0, 20.0),
                (BroadJump, 1, 20.0),
            ],
        ),
        pattern(
            "gauntlet",
            8,
            (6, 10),
            48.0,
            &[
                (Pylon, -1, 0.0),
                (Avoid, 0, 0.0),
                (Jump, 1, 0.0),
                (Jump, -1, 20.0),
                (Pylon, 1, 20.0),
                (Avoid, 0, 40.0),
            ],
        ),
        pattern(
            "zigzag",
            10,
            (8, 10),
            54.0,
            &[
                (Avoid, -1, 0.0),
                (Pylon, 0, 0.0),
                (Avoid, 0, 18.0),
                (Pylon, 1, 18.0),
                (Pylon, -1, 36.0),
                (Avoid, 1, 36.0),
            ],
        ),
    ]
}
