//! Per-level generation driver
//!
//! `Runway` is what the game loop talks to: one `tick` per simulated frame,
//! one `restart` per level retry.

use rand_pcg::Pcg32;

use super::collectible::{CollectiblePlacement, CollectiblePlanner};
use super::difficulty::{check_reaction_time, resolve_effective_speed};
use super::pattern::PatternLibrary;
use super::scheduler::{ObstacleScheduler, Spawn};
use super::state::{GenerationEvent, RngState};
use crate::LevelConfiguration;
use crate::consts::*;
use crate::error::{ConfigurationError, InvalidPatternError};

/// Input for a single tick, from the game loop and input handling
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Player distance along the runway
    pub distance: f32,
    /// Seconds since the previous tick
    pub dt: f32,
    /// Sprint held (affects speed only)
    pub sprint: bool,
}

/// What one tick produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickOutput {
    pub spawn: Option<Spawn>,
    pub collectibles: Vec<CollectiblePlacement>,
    /// Speed the player should run at this tick
    pub effective_speed: f32,
}

pub struct Runway {
    config: LevelConfiguration,
    library: PatternLibrary,
    rng_state: RngState,
    rng: Pcg32,
    scheduler: ObstacleScheduler,
    planner: CollectiblePlanner,
    elapsed_secs: f32,
    events: Vec<GenerationEvent>,
}

impl Runway {
    /// Start a level. Fails when the configuration is malformed.
    pub fn new(
        config: LevelConfiguration,
        library: PatternLibrary,
        seed: u64,
    ) -> Result<Self, ConfigurationError> {
        config.validate()?;

        let rng_state = RngState::new(seed);
        let mut runway = Self {
            rng: rng_state.to_rng(),
            rng_state,
            config,
            library,
            scheduler: ObstacleScheduler::new(),
            planner: CollectiblePlanner::new(),
            elapsed_secs: 0.0,
            events: Vec::new(),
        };
        runway.queue_startup_events();

        log::info!(
            "Level {} started with seed {} ({} patterns)",
            runway.config.level,
            seed,
            runway.library.len()
        );
        Ok(runway)
    }

    fn queue_startup_events(&mut self) {
        self.events.extend(check_reaction_time(&self.config));
        self.events.extend(self.library.rejected().iter().filter_map(|err| match err {
            InvalidPatternError::Unsolvable { name, .. } => {
                Some(GenerationEvent::PatternRejectedUnsolvable { name: name.clone() })
            }
            _ => None,
        }));
    }

    /// Advance generation by one tick
    pub fn tick(&mut self, input: &TickInput) -> TickOutput {
        self.elapsed_secs += input.dt.max(0.0);

        let sprint = if input.sprint { SPRINT_MULTIPLIER } else { 1.0 };
        let effective_speed = resolve_effective_speed(&self.config, BASE_RUN_SPEED, sprint);

        let head = input.distance + SPAWN_LOOKAHEAD;
        let spawn = if self.scheduler.cursor() <= head {
            self.scheduler
                .advance(&self.config, &self.library, head, &mut self.rng)
        } else {
            None
        };
        if let Some(spawn) = &spawn {
            self.planner.observe(&spawn.obstacles);
        }
        let collectibles = self
            .planner
            .fill(&self.config, self.scheduler.cursor(), &mut self.rng);

        self.events.extend(self.scheduler.drain_events());

        TickOutput {
            spawn,
            collectibles,
            effective_speed,
        }
    }

    /// Level retry: same seed, fresh state, cursor back at zero
    pub fn restart(&mut self) {
        log::info!("Level {} restarted", self.config.level);
        self.rng = self.rng_state.to_rng();
        self.scheduler.reset();
        self.planner.reset();
        self.elapsed_secs = 0.0;
        self.events.clear();
        self.queue_startup_events();
    }

    /// True once the level's duration has elapsed
    pub fn is_complete(&self) -> bool {
        self.elapsed_secs >= self.config.duration_secs
    }

    pub fn drain_events(&mut self) -> Vec<GenerationEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn config(&self) -> &LevelConfiguration {
        &self.config
    }

    pub fn cursor(&self) -> f32 {
        self.scheduler.cursor()
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed_secs
    }

    pub fn seed(&self) -> u64 {
        self.rng_state.seed
    }
}
