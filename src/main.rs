//! Lane Runway demo entry point
//!
//! Runs one level headless and prints every placement as a JSON line.
//!
//! Usage: `lane-runway [level] [seed] [ticks] [patterns.json]`

use lane_runway::LevelConfiguration;
use lane_runway::sim::{PatternLibrary, Runway, TickInput};

/// Simulated frame rate of the headless loop
const TICK_HZ: f32 = 60.0;

fn main() {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let level = args.first().and_then(|s| s.parse().ok()).unwrap_or(1);
    let seed = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(0xC0FFEE);
    let ticks: u32 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(600);

    let library = match args.get(3) {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(json) => match PatternLibrary::from_json(&json) {
                Ok(library) => library,
                Err(e) => {
                    log::error!("Could not load patterns from {}: {}", path, e);
                    std::process::exit(1);
                }
            },
            Err(e) => {
                log::error!("Could not read {}: {}", path, e);
                std::process::exit(1);
            }
        },
        None => PatternLibrary::builtin(),
    };

    let config = LevelConfiguration::for_level(level);
    let mut runway = match Runway::new(config, library, seed) {
        Ok(runway) => runway,
        Err(e) => {
            log::error!("Level {} cannot start: {}", level, e);
            std::process::exit(1);
        }
    };

    log::info!(
        "Lane Runway: level {}, seed {}, {} ticks, {:.0}s",
        runway.config().level,
        runway.seed(),
        ticks,
        runway.config().duration_secs
    );

    let dt = 1.0 / TICK_HZ;
    let mut distance = 0.0;
    for _ in 0..ticks {
        let output = runway.tick(&TickInput {
            distance,
            dt,
            sprint: false,
        });
        distance += output.effective_speed * dt;

        if let Some(spawn) = &output.spawn {
            for obstacle in &spawn.obstacles {
                print_json("obstacle", obstacle);
            }
        }
        for collectible in &output.collectibles {
            print_json("collectible", collectible);
        }
        for event in runway.drain_events() {
            log::debug!("{}: {:?}", event.name(), event);
        }

        if runway.is_complete() {
            log::info!(
                "Level {} complete at distance {:.1}",
                runway.config().level,
                distance
            );
            break;
        }
    }
}

fn print_json<T: serde::Serialize>(tag: &str, value: &T) {
    match serde_json::to_string(value) {
        Ok(json) => println!("{{\"{}\":{}}}", tag, json),
        Err(e) => log::warn!("Could not serialize {}: {}", tag, e),
    }
}
