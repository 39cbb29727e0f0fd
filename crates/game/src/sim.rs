//! The mission simulation: one entity world, one player, one mission run.
//!
//! A tick runs controls, then AI and flight, then combat resolution, then
//! objective evaluation. All entity and mission writes happen inside
//! [`Simulation::tick`]. Restarting or switching maps means building a new
//! `Simulation`.

use std::sync::Arc;

use engine_core::{find_nearest_target, Faction, Position, Time, Vec2, WorldConfig};
use hecs::{Entity, World};
use procgen::Heightmap;
use rand::prelude::*;

use crate::ai::AiSystem;
use crate::combat::{resolve_area_hit, resolve_hit, CombatSystem, DamageTable, KillEvent};
use crate::entity::{Census, Unit};
use crate::mission::{Mission, Objective};
use crate::objectives::{MissionPhase, MissionRun, MissionSummary, Situation};
use crate::player::{Controls, PlayerCraft};
use crate::radar::{Contact, Radar};
use crate::spawner::{MissionSpawner, SpawnReport};
use crate::stats::{mission_score, DebriefTelemetry, KillStreak, StatsEvent, StatsSink};

/// What happened during one tick.
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub shots_fired: u32,
    pub kills: Vec<KillEvent>,
    pub damage_taken: f32,
    /// Set on the tick the mission ended.
    pub ended: Option<MissionPhase>,
    pub callout: Option<&'static str>,
}

/// Final numbers, available once the mission is over.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionResult {
    pub summary: MissionSummary,
    pub telemetry: DebriefTelemetry,
    pub score: u32,
}

pub struct Simulation {
    config: WorldConfig,
    map: Arc<Heightmap>,
    damage_table: DamageTable,
    mission: Mission,
    pub world: World,
    pub player: PlayerCraft,
    run: MissionRun,
    combat: CombatSystem,
    ai: AiSystem,
    radar: Radar,
    streak: KillStreak,
    time: Time,
    spawn_report: SpawnReport,
    kill_value: u32,
    callsign: String,
    result: Option<MissionResult>,
}

impl Simulation {
    /// Build the world for `mission`. Everything random derives from `seed`.
    pub fn new(
        mission: Mission,
        map: Arc<Heightmap>,
        config: WorldConfig,
        damage_table: DamageTable,
        seed: u64,
    ) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let mut world = World::new();
        let spawn_report = MissionSpawner::new(rng.gen()).populate(&mut world, &mission, &map, &config);
        let player = PlayerCraft::new(&mission.player_start, &map, &config);
        let run = MissionRun::new(&mission);
        let ai = AiSystem::new(rng.gen(), mission.difficulty.enemy_damage_scale());
        let radar = Radar::new(&config);

        log::info!(
            "Mission {} '{}' on map {} ({}, {:?})",
            mission.mission_id,
            mission.name,
            mission.map_index,
            mission.difficulty,
            mission.weather
        );

        Self {
            config,
            map,
            damage_table,
            mission,
            world,
            player,
            run,
            combat: CombatSystem::new(),
            ai,
            radar,
            streak: KillStreak::default(),
            time: Time::new(),
            spawn_report,
            kill_value: 0,
            callsign: "VIPER".into(),
            result: None,
        }
    }

    pub fn with_callsign(mut self, callsign: impl Into<String>) -> Self {
        self.callsign = callsign.into();
        self
    }

    pub fn set_fixed_rate(&mut self, hz: f64) {
        self.time.set_fixed_rate(hz);
    }

    /// End the briefing.
    pub fn start(&mut self) {
        self.run.start();
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn map(&self) -> &Arc<Heightmap> {
        &self.map
    }

    pub fn mission(&self) -> &Mission {
        &self.mission
    }

    pub fn run(&self) -> &MissionRun {
        &self.run
    }

    pub fn phase(&self) -> MissionPhase {
        self.run.phase()
    }

    pub fn spawn_report(&self) -> SpawnReport {
        self.spawn_report
    }

    pub fn damage_table(&self) -> &DamageTable {
        &self.damage_table
    }

    pub fn combat(&self) -> &CombatSystem {
        &self.combat
    }

    pub fn result(&self) -> Option<&MissionResult> {
        self.result.as_ref()
    }

    /// Feed a variable frame delta; runs as many fixed ticks as it covers.
    pub fn advance(&mut self, frame_dt: f32, controls: &Controls, sink: &mut dyn StatsSink) -> Vec<TickReport> {
        self.time.advance(frame_dt);
        let step = self.time.fixed_timestep_seconds();
        let mut reports = Vec::new();
        while self.time.should_fixed_update() {
            reports.push(self.tick(controls, step, sink));
        }
        reports
    }

    /// One fixed step. Does nothing once the mission is over.
    pub fn tick(&mut self, controls: &Controls, dt: f32, sink: &mut dyn StatsSink) -> TickReport {
        let mut report = TickReport::default();
        if self.run.phase().is_over() {
            return report;
        }

        self.player.update(controls, dt, &self.map, &self.config);

        let ai = self.ai.update(&mut self.world, &self.player, &self.map, &self.config, dt);
        let was_alive = self.player.is_alive();
        report.damage_taken = ai.damage_to_player();
        if report.damage_taken > 0.0 {
            self.player.take_damage(report.damage_taken);
        }
        for lost in &ai.structures_lost {
            self.run.record_structure_lost(lost.kind, lost.label.as_deref());
        }
        if was_alive && !self.player.is_alive() {
            log::info!("Player destroyed");
            sink.record(StatsEvent::Death {
                mission_id: self.mission.mission_id,
            });
        }

        if controls.fire && self.player.is_alive() {
            if let Some(kills) = self.fire_player_weapon() {
                report.shots_fired += 1;
                for kill in kills {
                    self.register_kill(&kill, sink, &mut report);
                    report.kills.push(kill);
                }
            }
        }
        self.streak.update(dt);

        let census = Census::gather(&self.world);
        let situation = Situation {
            census: &census,
            player_position: self.player.position.xy(),
            player_alive: self.player.is_alive(),
            map_size: self.config.map_size_f32(),
        };
        if let Some(phase) = self.run.update(dt, &situation) {
            report.ended = Some(phase);
            self.finish(sink);
        }
        report
    }

    /// Fire the current weapon at the nearest eligible hostile. `None` when the
    /// weapon could not fire; `Some(kills)` otherwise (possibly a miss).
    fn fire_player_weapon(&mut self) -> Option<Vec<KillEvent>> {
        let origin = self.player.position.xy();
        let map_size = self.config.map_size_f32();
        let weapon = self.player.current_weapon_mut();
        if !weapon.fire() {
            return None;
        }
        let weapon_type = weapon.weapon_type;
        let range = weapon.range();
        let splash = weapon.splash_radius();
        self.combat.record_shot();

        let air_only = weapon_type.air_only();
        let candidates: Vec<(Entity, Vec2)> = self
            .world
            .query::<(&Position, &Unit)>()
            .iter()
            .filter(|(_, (_, u))| u.alive && u.faction == Faction::Hostile && (!air_only || u.kind.is_air()))
            .map(|(e, (p, _))| (e, p.xy()))
            .collect();
        let Some(target) = find_nearest_target(candidates, origin, Some(range), |_| true, map_size) else {
            log::debug!("{} fired with no target in range", weapon_type);
            return Some(Vec::new());
        };

        let hits = if splash > 0.0 {
            let center = self
                .world
                .get::<&Position>(target.key)
                .map(|p| p.xy())
                .unwrap_or(origin);
            resolve_area_hit(&mut self.world, center, splash, weapon_type, &self.damage_table, map_size)
        } else {
            resolve_hit(&mut self.world, target.key, weapon_type, &self.damage_table, 1.0)
                .into_iter()
                .collect()
        };
        Some(self.combat.record_hits(&hits))
    }

    fn register_kill(&mut self, kill: &KillEvent, sink: &mut dyn StatsSink, report: &mut TickReport) {
        self.run.record_kill(kill);
        if kill.faction != Faction::Hostile {
            log::warn!("Friendly {} destroyed by player fire", kill.kind);
            return;
        }
        self.kill_value += kill.kind.score_value();
        sink.record(StatsEvent::Kill {
            kind: kill.kind,
            weapon: kill.weapon,
        });
        if let Some(callout) = self.streak.register_kill() {
            report.callout = Some(callout);
        }
    }

    fn finish(&mut self, sink: &mut dyn StatsSink) {
        let summary = self.run.summary();
        let telemetry = DebriefTelemetry::from_summary(&summary, self.combat.accuracy());
        let score = mission_score(self.kill_value, &telemetry);
        sink.record(StatsEvent::MissionComplete {
            mission_id: summary.mission_id,
            victory: telemetry.victory,
            score,
            time_seconds: summary.elapsed,
        });
        sink.record(StatsEvent::HighScore {
            callsign: self.callsign.clone(),
            score,
        });
        log::info!("Mission {} score {}", summary.mission_id, score);
        self.result = Some(MissionResult {
            summary,
            telemetry,
            score,
        });
    }

    /// Waypoints of open reach-location objectives.
    pub fn waypoints(&self) -> Vec<Vec2> {
        self.run
            .objectives()
            .iter()
            .filter(|t| !t.status.is_terminal())
            .filter_map(|t| match t.objective {
                Objective::ReachLocation { x, y, .. } => Some(Vec2::new(x, y)),
                _ => None,
            })
            .collect()
    }

    pub fn radar_contacts(&self) -> Vec<Contact> {
        self.radar.scan(&self.world, &self.player.position, &self.waypoints())
    }

    /// Nearest live hostile, for autopilots and HUD lock indicators.
    pub fn nearest_hostile(&self) -> Option<(Entity, Position)> {
        let candidates: Vec<(Entity, Vec2)> = self
            .world
            .query::<(&Position, &Unit)>()
            .iter()
            .filter(|(_, (_, u))| u.alive && u.faction == Faction::Hostile)
            .map(|(e, (p, _))| (e, p.xy()))
            .collect();
        let nearest = find_nearest_target(
            candidates,
            self.player.position.xy(),
            None,
            |_| true,
            self.config.map_size_f32(),
        )?;
        let position = *self.world.get::<&Position>(nearest.key).ok()?;
        Some((nearest.key, position))
    }
}
