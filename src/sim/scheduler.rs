//! Obstacle scheduler
//!
//! Once per tick the scheduler decides between a curated pattern and a single
//! random obstacle, checks clearance, keeps every row open, and moves the
//! runway cursor forward. All randomness comes from the caller's seeded RNG.

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::obstacle::{ObstacleKind, ObstaclePlacement, find_blocked_row};
use super::pattern::{ObstaclePattern, PatternLibrary};
use super::recovery::RecoveryZone;
use super::state::{FallbackReason, GenerationEvent, PlacementOrigin, RecordWindow};
use crate::LevelConfiguration;
use crate::consts::*;

/// Which generator a tick uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnMode {
    Pattern,
    Random,
}

/// Pattern when the draw falls under the usage ratio and something is eligible
pub fn choose_mode(draw: f32, pattern_usage_ratio: f32, has_candidates: bool) -> SpawnMode {
    if draw < pattern_usage_ratio && has_candidates {
        SpawnMode::Pattern
    } else {
        SpawnMode::Random
    }
}

/// Weight of a pattern: inverse distance of its rating to the band midpoint
pub fn pattern_weight(difficulty: u8, midpoint: f32) -> f32 {
    1.0 / (1.0 + (difficulty as f32 - midpoint).abs())
}

/// Pick a candidate index from a unit draw.
///
/// Candidates are walked in registry order, so equal weights resolve to the
/// earlier-registered pattern for the same draw.
pub fn pick_weighted(candidates: &[&ObstaclePattern], midpoint: f32, draw: f32) -> usize {
    let total: f32 = candidates
        .iter()
        .map(|p| pattern_weight(p.difficulty, midpoint))
        .sum();
    let target = draw.clamp(0.0, 1.0) * total;

    let mut cumulative = 0.0;
    for (i, p) in candidates.iter().enumerate() {
        cumulative += pattern_weight(p.difficulty, midpoint);
        if target < cumulative {
            return i;
        }
    }
    candidates.len().saturating_sub(1)
}

/// One tick's emission: a whole pattern or a single random obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spawn {
    pub origin: PlacementOrigin,
    /// Pattern name for pattern spawns
    pub pattern: Option<String>,
    pub obstacles: Vec<ObstaclePlacement>,
}

/// The generation control loop
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObstacleScheduler {
    /// Runway cursor, never decreases
    cursor: f32,
    records: RecordWindow,
    recovery: RecoveryZone,
    #[serde(skip)]
    events: Vec<GenerationEvent>,
}

impl ObstacleScheduler {
    pub fn new() -> Self {
        Self {
            cursor: 0.0,
            records: RecordWindow::new(),
            recovery: RecoveryZone::new(),
            events: Vec::new(),
        }
    }

    pub fn cursor(&self) -> f32 {
        self.cursor
    }

    pub fn records(&self) -> &RecordWindow {
        &self.records
    }

    pub fn recovery(&self) -> &RecoveryZone {
        &self.recovery
    }

    /// Level restart: forget everything and return the cursor to zero
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Diagnostics gathered since the last drain
    pub fn drain_events(&mut self) -> Vec<GenerationEvent> {
        std::mem::take(&mut self.events)
    }

    /// Run one scheduling decision with the generation head at `cursor_z`.
    ///
    /// Returns `None` only while a recovery zone holds emission back.
    pub fn advance<R: Rng + ?Sized>(
        &mut self,
        config: &LevelConfiguration,
        library: &PatternLibrary,
        cursor_z: f32,
        rng: &mut R,
    ) -> Option<Spawn> {
        self.cursor = self.cursor.max(cursor_z);

        if self.recovery.suppresses(self.cursor) {
            log::debug!(
                "Recovery zone: holding emission at z={} (clear until {:?})",
                self.cursor,
                self.recovery.clear_until_z()
            );
            return None;
        }

        let draw: f32 = rng.random();
        let candidates = library.select_candidates(
            config.level,
            config.min_pattern_difficulty,
            config.max_pattern_difficulty,
        );

        let mode = choose_mode(draw, config.pattern_usage_ratio, !candidates.is_empty());
        let pattern_spawn = match mode {
            SpawnMode::Pattern => self.try_pattern(config, &candidates, rng),
            SpawnMode::Random => {
                if draw < config.pattern_usage_ratio {
                    log::debug!("No eligible patterns for level {}", config.level);
                    self.events.push(GenerationEvent::FallbackToRandom {
                        reason: FallbackReason::EmptyCandidatePool,
                        z: self.cursor,
                    });
                }
                None
            }
        };
        let (mut spawn, advance_by) = match pattern_spawn {
            Some(found) => found,
            None => self.random_spawn(config, rng),
        };

        self.keep_rows_open(&mut spawn.obstacles);

        for placement in &spawn.obstacles {
            self.records.push(*placement, spawn.origin);
        }
        self.recovery.observe(&spawn.obstacles);
        self.cursor += advance_by;

        // Only after this tick's checks are done
        let horizon = config.max_obstacle_spacing.max(MIN_TRACKING_HORIZON);
        self.records.prune_behind(self.cursor - horizon);

        Some(spawn)
    }

    fn try_pattern<R: Rng + ?Sized>(
        &mut self,
        config: &LevelConfiguration,
        candidates: &[&ObstaclePattern],
        rng: &mut R,
    ) -> Option<(Spawn, f32)> {
        let index = pick_weighted(candidates, config.difficulty_midpoint(), rng.random());
        let pattern = candidates[index];
        let placements = pattern.place_at(self.cursor);

        if !self.has_clearance(config, &placements) {
            log::debug!(
                "Pattern '{}' failed clearance at z={}, falling back to random",
                pattern.name,
                self.cursor + pattern.first_offset()
            );
            self.events.push(GenerationEvent::PatternClearanceFailed {
                name: pattern.name.clone(),
                z: self.cursor,
            });
            self.events.push(GenerationEvent::FallbackToRandom {
                reason: FallbackReason::ClearanceFailed,
                z: self.cursor,
            });
            return None;
        }

        log::info!("Pattern '{}' spawned at z={}", pattern.name, self.cursor);
        self.events.push(GenerationEvent::PatternSpawned {
            name: pattern.name.clone(),
            z: self.cursor,
        });

        let spawn = Spawn {
            origin: PlacementOrigin::Pattern,
            pattern: Some(pattern.name.clone()),
            obstacles: placements,
        };
        Some((spawn, pattern.length))
    }

    /// Every placement keeps `min_obstacle_spacing` from tracked records and
    /// from the rest of the pattern in its lane
    fn has_clearance(&self, config: &LevelConfiguration, placements: &[ObstaclePlacement]) -> bool {
        let min = config.min_obstacle_spacing;
        placements.iter().enumerate().all(|(i, p)| {
            let clear_of_records = self
                .records
                .in_lane(p.lane)
                .all(|r| (p.z - r.z()).abs() >= min);
            let clear_of_pattern = placements[i + 1..]
                .iter()
                .filter(|q| q.lane == p.lane)
                .all(|q| (p.z - q.z).abs() >= min);
            clear_of_records && clear_of_pattern
        })
    }

    fn random_spawn<R: Rng + ?Sized>(
        &mut self,
        config: &LevelConfiguration,
        rng: &mut R,
    ) -> (Spawn, f32) {
        let spacing = rng.random_range(config.min_obstacle_spacing..=config.max_obstacle_spacing);
        let lethal = rng.random_bool(config.avoid_obstacle_probability as f64);
        let mut kind = if lethal {
            ObstacleKind::LETHAL[rng.random_range(0..ObstacleKind::LETHAL.len())]
        } else {
            ObstacleKind::PASSABLE[rng.random_range(0..ObstacleKind::PASSABLE.len())]
        };
        let mut lane = LANES[rng.random_range(0..LANES.len())];
        let z = self.cursor + spacing;

        if kind.is_lethal() {
            let too_close = 0.5 * config.min_obstacle_spacing;
            let mut attempts = 0;
            while self.lethal_too_close(lane, z, too_close) && attempts < LANE_RESAMPLE_LIMIT {
                lane = LANES[rng.random_range(0..LANES.len())];
                attempts += 1;
            }
            if self.lethal_too_close(lane, z, too_close) {
                log::debug!("No safe lane for {:?} at z={}, forcing Jump", kind, z);
                self.events.push(GenerationEvent::LaneResampleExhausted { z });
                kind = ObstacleKind::Jump;
            }
        }

        let spawn = Spawn {
            origin: PlacementOrigin::Random,
            pattern: None,
            obstacles: vec![ObstaclePlacement { kind, lane, z }],
        };
        (spawn, spacing)
    }

    fn lethal_too_close(&self, lane: i8, z: f32, distance: f32) -> bool {
        self.records
            .last_in_lane(lane)
            .is_some_and(|prior| (z - prior.z()).abs() < distance)
    }

    /// Swap lethal members of this tick's obstacles for Jumps until every row
    /// (including rows shared with tracked records) has an open lane.
    fn keep_rows_open(&mut self, new: &mut [ObstaclePlacement]) {
        if new.is_empty() {
            return;
        }
        let low = new.iter().map(|p| p.z).fold(f32::INFINITY, f32::min) - Z_CELL_LENGTH;
        let high = new.iter().map(|p| p.z).fold(f32::NEG_INFINITY, f32::max) + Z_CELL_LENGTH;

        let mut combined: Vec<ObstaclePlacement> =
            self.records.between(low, high).map(|r| r.placement).collect();
        let first_new = combined.len();
        combined.extend_from_slice(new);

        while let Some(row) = find_blocked_row(&combined) {
            let fixable = |lane: i8| {
                let lethal: Vec<usize> = row
                    .iter()
                    .copied()
                    .filter(|&j| combined[j].lane == lane && combined[j].kind.is_lethal())
                    .collect();
                (!lethal.is_empty() && lethal.iter().all(|&j| j >= first_new)).then_some(lethal)
            };
            let Some(targets) = LANES.iter().find_map(|&lane| fixable(lane)) else {
                log::error!("Blocked row at z={} has no substitutable lane", combined[row[0]].z);
                break;
            };

            for j in targets {
                log::error!(
                    "Row at z={} blocked every lane; {:?} in lane {} forced to Jump",
                    combined[j].z,
                    combined[j].kind,
                    combined[j].lane
                );
                self.events.push(GenerationEvent::PassableSubstituted {
                    lane: combined[j].lane,
                    z: combined[j].z,
                });
                combined[j].kind = ObstacleKind::Jump;
            }
        }

        new.copy_from_slice(&combined[first_new..]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::obstacle::ObstacleDefinition;
    use crate::sim::state::RngState;
    use crate::sim::obstacle::ObstacleKind::*;

    fn scenario_config() -> LevelConfiguration {
        LevelConfiguration {
            min_obstacle_spacing: 12.0,
            max_obstacle_spacing: 20.0,
            avoid_obstacle_probability: 0.2,
            max_effective_speed: 20.0,
            pattern_usage_ratio: 0.5,
            min_pattern_difficulty: 1,
            max_pattern_difficulty: 3,
            ..LevelConfiguration::default()
        }
    }

    fn ladder_pattern() -> ObstaclePattern {
        ObstaclePattern {
            name: "ladder".to_string(),
            difficulty: 2,
            min_level: 1,
            max_level: 10,
            length: 20.0,
            obstacles: vec![
                ObstacleDefinition::new(Jump, -1, 0.0),
                ObstacleDefinition::new(Jump, 0, 8.0),
                ObstacleDefinition::new(Jump, 1, 16.0),
            ],
        }
    }

    fn place(kind: ObstacleKind, lane: i8, z: f32) -> ObstaclePlacement {
        ObstaclePlacement { kind, lane, z }
    }

    #[test]
    fn test_choose_mode() {
        assert_eq!(choose_mode(0.3, 0.5, true), SpawnMode::Pattern);
        assert_eq!(choose_mode(0.8, 0.5, true), SpawnMode::Random);
        assert_eq!(choose_mode(0.3, 0.5, false), SpawnMode::Random);
    }

    #[test]
    fn test_pick_weighted_prefers_midpoint() {
        let mut near = ladder_pattern();
        near.difficulty = 5;
        let mut far = ladder_pattern();
        far.difficulty = 10;
        let candidates = [&far, &near];
        // far weighs 1/6, near weighs 1: most of the unit interval maps to near
        assert_eq!(pick_weighted(&candidates, 5.0, 0.1), 0);
        assert_eq!(pick_weighted(&candidates, 5.0, 0.5), 1);
        assert_eq!(pick_weighted(&candidates, 5.0, 0.999), 1);
        assert_eq!(pick_weighted(&candidates, 5.0, 1.0), 1);
    }

    #[test]
    fn test_pick_weighted_ties_follow_registry_order() {
        let a = ladder_pattern();
        let b = ladder_pattern();
        let candidates = [&a, &b];
        assert_eq!(pick_weighted(&candidates, 2.0, 0.49), 0);
        assert_eq!(pick_weighted(&candidates, 2.0, 0.51), 1);
    }

    #[test]
    fn test_pattern_tick_emits_whole_pattern() {
        let config = LevelConfiguration {
            pattern_usage_ratio: 1.0,
            ..scenario_config()
        };
        let library = PatternLibrary::load(vec![ladder_pattern()]);
        let mut scheduler = ObstacleScheduler::new();
        let mut rng = RngState::new(7).to_rng();

        let spawn = scheduler.advance(&config, &library, 0.0, &mut rng).unwrap();
        assert_eq!(spawn.origin, PlacementOrigin::Pattern);
        assert_eq!(spawn.pattern.as_deref(), Some("ladder"));
        let zs: Vec<f32> = spawn.obstacles.iter().map(|o| o.z).collect();
        assert_eq!(zs, vec![0.0, 8.0, 16.0]);
        assert_eq!(scheduler.cursor(), 20.0);
        assert_eq!(scheduler.records().len(), 3);

        let events = scheduler.drain_events();
        assert!(matches!(events[0], GenerationEvent::PatternSpawned { .. }));
    }

    #[test]
    fn test_random_tick_emits_one_obstacle() {
        let config = LevelConfiguration {
            pattern_usage_ratio: 0.0,
            ..scenario_config()
        };
        let library = PatternLibrary::load(vec![ladder_pattern()]);
        let mut scheduler = ObstacleScheduler::new();
        let mut rng = RngState::new(11).to_rng();

        let spawn = scheduler.advance(&config, &library, 50.0, &mut rng).unwrap();
        assert_eq!(spawn.origin, PlacementOrigin::Random);
        assert_eq!(spawn.obstacles.len(), 1);
        let obstacle = spawn.obstacles[0];
        assert!((62.0..=70.0).contains(&obstacle.z));
        assert!(LANES.contains(&obstacle.lane));
        assert_eq!(scheduler.cursor(), obstacle.z);
    }

    #[test]
    fn test_empty_pool_falls_back_to_random() {
        let config = LevelConfiguration {
            pattern_usage_ratio: 1.0,
            ..scenario_config()
        };
        let library = PatternLibrary::load(Vec::new());
        let mut scheduler = ObstacleScheduler::new();
        let mut rng = RngState::new(3).to_rng();

        let spawn = scheduler.advance(&config, &library, 0.0, &mut rng).unwrap();
        assert_eq!(spawn.origin, PlacementOrigin::Random);
        assert!(scheduler.drain_events().contains(&GenerationEvent::FallbackToRandom {
            reason: FallbackReason::EmptyCandidatePool,
            z: 0.0
        }));
    }

    #[test]
    fn test_clearance_failure_falls_back_to_random() {
        let config = LevelConfiguration {
            pattern_usage_ratio: 1.0,
            ..scenario_config()
        };
        let library = PatternLibrary::load(vec![ladder_pattern()]);
        let mut scheduler = ObstacleScheduler::new();
        scheduler.cursor = 100.0;
        // The ladder's first obstacle would land 5 units from this one
        scheduler
            .records
            .push(place(Avoid, -1, 95.0), PlacementOrigin::Random);
        let mut rng = RngState::new(5).to_rng();

        let spawn = scheduler.advance(&config, &library, 100.0, &mut rng).unwrap();
        assert_eq!(spawn.origin, PlacementOrigin::Random);
        assert!(spawn.obstacles[0].z >= 112.0);

        let names: Vec<&str> = scheduler.drain_events().iter().map(|e| e.name()).collect();
        assert_eq!(names, vec!["pattern-clearance-failed", "fallback-to-random"]);
    }

    #[test]
    fn test_clearance_ignores_other_lanes() {
        let config = scenario_config();
        let mut scheduler = ObstacleScheduler::new();
        scheduler.cursor = 100.0;
        scheduler
            .records
            .push(place(Avoid, 1, 100.0), PlacementOrigin::Random);
        let placements = ladder_pattern().place_at(100.0);
        assert!(scheduler.has_clearance(&config, &placements));
    }

    #[test]
    fn test_clearance_rejects_tight_same_lane_pattern() {
        let config = scenario_config();
        let scheduler = ObstacleScheduler::new();
        let placements = [place(Jump, 0, 0.0), place(Jump, 0, 6.0)];
        assert!(!scheduler.has_clearance(&config, &placements));
    }

    #[test]
    fn test_recovery_zone_holds_emission() {
        let config = scenario_config();
        let library = PatternLibrary::load(vec![ladder_pattern()]);
        let mut scheduler = ObstacleScheduler::new();
        scheduler.recovery.observe(&[place(Palisade, 0, 100.0)]);
        scheduler.cursor = 100.0;
        let mut rng = RngState::new(1).to_rng();

        for z in [100.5, 104.0, 110.0, 115.0] {
            assert!(scheduler.advance(&config, &library, z, &mut rng).is_none());
        }
        let spawn = scheduler.advance(&config, &library, 115.5, &mut rng).unwrap();
        assert!(spawn.obstacles.iter().all(|o| o.z > 115.0));
    }

    #[test]
    fn test_lane_resample_avoids_close_prior() {
        let config = LevelConfiguration {
            avoid_obstacle_probability: 1.0,
            min_obstacle_spacing: 12.0,
            max_obstacle_spacing: 12.0,
            ..scenario_config()
        };
        let mut scheduler = ObstacleScheduler::new();
        // Priors sit ahead of the cursor, right where the next obstacle lands
        scheduler
            .records
            .push(place(Jump, -1, 12.0), PlacementOrigin::Random);
        scheduler
            .records
            .push(place(Jump, 0, 12.0), PlacementOrigin::Random);
        let mut rng = RngState::new(9).to_rng();

        let (spawn, _) = scheduler.random_spawn(&config, &mut rng);
        let obstacle = spawn.obstacles[0];
        // Either found the free lane, or gave up and went passable
        assert!(obstacle.lane == 1 || obstacle.kind.is_passable());
    }

    #[test]
    fn test_lane_resample_exhaustion_forces_passable() {
        let config = LevelConfiguration {
            avoid_obstacle_probability: 1.0,
            min_obstacle_spacing: 12.0,
            max_obstacle_spacing: 12.0,
            ..scenario_config()
        };
        let mut scheduler = ObstacleScheduler::new();
        for lane in LANES {
            scheduler
                .records
                .push(place(Jump, lane, 12.0), PlacementOrigin::Random);
        }
        let mut rng = RngState::new(9).to_rng();

        let (spawn, _) = scheduler.random_spawn(&config, &mut rng);
        assert_eq!(spawn.obstacles[0].kind, Jump);
        assert!(matches!(
            scheduler.drain_events()[..],
            [GenerationEvent::LaneResampleExhausted { .. }]
        ));
    }

    #[test]
    fn test_blocked_row_gets_passable_substitute() {
        let mut scheduler = ObstacleScheduler::new();
        scheduler
            .records
            .push(place(Avoid, -1, 40.0), PlacementOrigin::Random);
        let mut new = [place(Pylon, 0, 40.0), place(Avoid, 1, 40.5)];

        scheduler.keep_rows_open(&mut new);

        assert_eq!(new[0].kind, Jump);
        assert_eq!(new[1].kind, Avoid);
        assert!(matches!(
            scheduler.drain_events()[..],
            [GenerationEvent::PassableSubstituted { lane: 0, .. }]
        ));
    }

    #[test]
    fn test_long_pattern_keeps_record_nearest_cursor() {
        let config = LevelConfiguration {
            pattern_usage_ratio: 1.0,
            ..scenario_config()
        };
        // Furthest member listed first, then more members than the record cap holds
        let mut obstacles = vec![ObstacleDefinition::new(Pylon, 0, 400.0)];
        for i in 0..32 {
            let offset = i as f32 * 12.0;
            obstacles.push(ObstacleDefinition::new(Jump, -1, offset));
            obstacles.push(ObstacleDefinition::new(Jump, 1, offset));
        }
        assert!(obstacles.len() > MAX_TRACKED_RECORDS);
        let long = ObstaclePattern {
            name: "long".to_string(),
            difficulty: 2,
            min_level: 1,
            max_level: 10,
            length: 400.0,
            obstacles,
        };
        let spike = ObstaclePattern {
            name: "spike".to_string(),
            difficulty: 2,
            min_level: 1,
            max_level: 10,
            length: 4.0,
            obstacles: vec![ObstacleDefinition::new(Avoid, 0, 0.0)],
        };
        let mut scheduler = ObstacleScheduler::new();
        let mut rng = RngState::new(6).to_rng();

        let first = scheduler
            .advance(&config, &PatternLibrary::load(vec![long]), 0.0, &mut rng)
            .unwrap();
        assert_eq!(first.pattern.as_deref(), Some("long"));
        assert_eq!(scheduler.cursor(), 400.0);
        assert_eq!(scheduler.records().last_in_lane(0).map(|r| r.z()), Some(400.0));

        let second = scheduler
            .advance(&config, &PatternLibrary::load(vec![spike]), 400.0, &mut rng)
            .unwrap();
        assert_eq!(second.origin, PlacementOrigin::Random);
        for obstacle in second.obstacles.iter().filter(|o| o.lane == 0) {
            assert!(obstacle.z - 400.0 >= config.min_obstacle_spacing);
        }
    }

    #[test]
    fn test_records_pruned_behind_horizon() {
        let config = LevelConfiguration {
            pattern_usage_ratio: 0.0,
            ..scenario_config()
        };
        let library = PatternLibrary::load(Vec::new());
        let mut scheduler = ObstacleScheduler::new();
        let mut rng = RngState::new(2).to_rng();

        for _ in 0..200 {
            let head = scheduler.cursor() + 1.0;
            scheduler.advance(&config, &library, head, &mut rng);
        }
        let horizon = scheduler.cursor() - MIN_TRACKING_HORIZON;
        assert!(scheduler.records().iter().all(|r| r.z() >= horizon));
    }

    #[test]
    fn test_reset() {
        let config = scenario_config();
        let library = PatternLibrary::load(vec![ladder_pattern()]);
        let mut scheduler = ObstacleScheduler::new();
        let mut rng = RngState::new(4).to_rng();
        scheduler.advance(&config, &library, 30.0, &mut rng);
        scheduler.reset();
        assert_eq!(scheduler.cursor(), 0.0);
        assert!(scheduler.records().is_empty());
        assert_eq!(scheduler.recovery().clear_until_z(), None);
    }
}
