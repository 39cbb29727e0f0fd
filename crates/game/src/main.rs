//! Voxel Strike headless runner.
//!
//! Loads (or generates) a map and a mission, flies it with a simple autopilot
//! for a fixed number of ticks, prints the debrief, and optionally writes the
//! final view to a PNG.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use engine_core::{angle_difference, bearing_wrapped, distance_2d_wrapped};
use procgen::{generate_heightmap, Heightmap, TerrainConfig};

use game::entity::Unit;
use game::generation::FileGenerator;
use game::player::Controls;
use game::stats::{debrief, DebriefTelemetry, OfflineAdvisor, StatsLedger};
use game::view::GameView;
use game::weapons::best_weapon;
use game::{
    default_mission, generate_mission, normalize_difficulty, GameConfig, GenerationRequest,
    Mission, MissionPhase, Simulation,
};

#[derive(Debug, Parser)]
#[command(name = "voxelstrike", about = "Fly a Voxel Strike mission headless and print the debrief")]
struct Args {
    /// Mission JSON file; without one a mission is generated or the default is used
    mission: Option<PathBuf>,

    /// Map index to fly on, overriding the mission's own
    #[arg(long)]
    map: Option<u32>,

    /// Simulation ticks to run before giving up
    #[arg(long, default_value_t = 3000)]
    ticks: u32,

    /// Write the final view to this PNG
    #[arg(long)]
    frame: Option<PathBuf>,

    /// Pre-generated mission draft to sanitise and fly
    #[arg(long)]
    draft: Option<PathBuf>,

    /// Difficulty for generated and default missions (easy, medium, hard, extreme)
    #[arg(long)]
    difficulty: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = GameConfig::load();
    config.world.validate().context("invalid world configuration")?;

    let mut mission = load_mission(&args, &config)?;
    if let Some(map) = args.map {
        mission.map_index = map;
    }
    let map = Arc::new(load_map(&config, mission.map_index)?);

    let mut sim = Simulation::new(mission, map, config.world.clone(), config.damage_table(), config.seed)
        .with_callsign(config.callsign.clone());
    sim.set_fixed_rate(config.fixed_rate_hz);
    sim.start();

    let dt = (1.0 / config.fixed_rate_hz.max(1.0)) as f32;
    let mut ledger = StatsLedger::new();
    for _ in 0..args.ticks {
        let controls = autopilot(&sim);
        let report = sim.tick(&controls, dt, &mut ledger);
        if let Some(callout) = report.callout {
            log::info!("{}", callout);
        }
        if report.ended.is_some() {
            break;
        }
    }

    report(&sim, &ledger);

    if let Some(path) = &args.frame {
        let mut view = GameView::new(config.screen_width, config.screen_height);
        let stats = view.draw(&sim);
        view.frame().save_png(path)?;
        log::info!("Wrote {} ({} markers, {} radar contacts)", path.display(), stats.markers, stats.blips);
    }
    Ok(())
}

/// Mission file, then generator draft, then the built-in default.
fn load_mission(args: &Args, config: &GameConfig) -> Result<Mission> {
    if let Some(path) = &args.mission {
        return Mission::load(path).with_context(|| format!("loading mission {}", path.display()));
    }

    let difficulty = normalize_difficulty(args.difficulty.as_deref());
    let request = GenerationRequest::new(1, args.map.unwrap_or(1), difficulty);
    match &args.draft {
        Some(path) => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .context("starting generation runtime")?;
            let generator = FileGenerator { path: path.clone() };
            Ok(runtime.block_on(generate_mission(
                &generator,
                &request,
                &config.world,
                config.generation_timeout(),
            )))
        }
        None => Ok(default_mission(&request, &config.world)),
    }
}

/// Raster assets if present, otherwise a procedural map seeded by the index.
fn load_map(config: &GameConfig, map_index: u32) -> Result<Heightmap> {
    match Heightmap::load(&config.asset_dir, map_index, &config.world) {
        Ok(map) => Ok(map),
        Err(e) => {
            log::warn!("{}; generating map {} procedurally", e, map_index);
            let terrain = TerrainConfig {
                map_shift: config.world.map_shift,
                seed: config.seed ^ u64::from(map_index),
                ..Default::default()
            };
            generate_heightmap(&terrain).context("generating procedural map")
        }
    }
}

/// Fly at the nearest hostile (or the next waypoint) and shoot when in range,
/// picking whichever loaded weapon the damage table favours.
fn autopilot(sim: &Simulation) -> Controls {
    let size = sim.config().map_size_f32();
    let me = sim.player.position;
    let (target, weapon) = match sim.nearest_hostile() {
        Some((entity, position)) => {
            let target_type = sim.world.get::<&Unit>(entity).map(|u| u.kind.target_type()).ok();
            let weapon = target_type.and_then(|t| best_weapon(sim.player.weapons(), t, sim.damage_table()));
            (position.xy(), weapon)
        }
        None => match sim.waypoints().first() {
            Some(waypoint) => (*waypoint, None),
            None => return Controls::default(),
        },
    };

    let distance = distance_2d_wrapped(me.xy(), target, size);
    let turn = angle_difference(me.heading, bearing_wrapped(me.xy(), target, size));
    let range = weapon.map_or_else(|| sim.player.current_weapon().range(), |w| w.range());
    Controls {
        throttle: if distance > range * 0.5 { 1.0 } else { 0.2 },
        turn: (turn * 2.0).clamp(-1.0, 1.0),
        fire: distance < range && turn.abs() < 0.5,
        select_weapon: weapon,
        ..Default::default()
    }
}

fn report(sim: &Simulation, ledger: &StatsLedger) {
    let run = sim.run();
    println!("Mission {} '{}'", sim.mission().mission_id, sim.mission().name);
    for line in run.objective_text() {
        println!("  {}", line);
    }

    let telemetry = match sim.result() {
        Some(result) => {
            let outcome = match result.summary.phase {
                MissionPhase::Victory => "VICTORY".to_string(),
                _ => match result.summary.defeat_reason {
                    Some(reason) => format!("DEFEAT ({})", reason),
                    None => "DEFEAT".to_string(),
                },
            };
            println!("{} - score {}", outcome, result.score);
            result.telemetry.clone()
        }
        None => {
            println!("Still in progress after {:.1}s", run.elapsed());
            DebriefTelemetry::from_summary(&run.summary(), sim.combat().accuracy())
        }
    };
    println!("{}", debrief(&OfflineAdvisor, &telemetry));

    let totals = ledger.totals();
    println!("Kills {}  Deaths {}  Accuracy {:.0}%", totals.kills, totals.deaths, telemetry.accuracy * 100.0);
    for (rank, entry) in ledger.leaderboard().iter().enumerate() {
        println!("  {:>2}. {:<12} {}", rank + 1, entry.callsign, entry.score);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("voxelstrike").chain(list.iter().copied()))
    }

    #[test]
    fn parses_flags_and_mission_path() {
        let parsed = args(&["m.json", "--map", "4", "--ticks", "10", "--frame", "out.png"]).expect("args");
        assert_eq!(parsed.mission, Some(PathBuf::from("m.json")));
        assert_eq!(parsed.map, Some(4));
        assert_eq!(parsed.ticks, 10);
        assert_eq!(parsed.frame, Some(PathBuf::from("out.png")));
        assert_eq!(args(&[]).expect("empty").ticks, 3000);
    }

    #[test]
    fn rejects_bad_flags() {
        assert!(args(&["--map"]).is_err());
        assert!(args(&["--map", "north"]).is_err());
        assert!(args(&["--warp"]).is_err());
    }

    #[test]
    fn command_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
