//! Hostile AI: target selection, aircraft steering and cooldown fire.
//!
//! Targets are picked with the same wrapped nearest-target scan the player's
//! lock-on uses, so "in range" means the same thing on both sides.

use engine_core::{
    angle_difference, bearing_wrapped, distance_3d_wrapped, find_nearest_target, normalize_angle, Faction,
    Health, Position, Vec2, WorldConfig,
};
use hecs::{Entity, World};
use procgen::Heightmap;
use rand::prelude::*;

use crate::entity::{Attack, EntityKind, Flight, Unit};
use crate::player::PlayerCraft;

/// Aircraft start closing on the player from this multiple of weapon range.
const PURSUIT_RANGE_FACTOR: f32 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AiTarget {
    Player,
    Structure(Entity),
}

/// A shot that landed on the player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncomingFire {
    pub source: EntityKind,
    pub damage: f32,
}

/// A friendly structure destroyed by hostile fire.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureLost {
    pub entity: Entity,
    pub kind: EntityKind,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AiReport {
    pub incoming: Vec<IncomingFire>,
    pub structures_lost: Vec<StructureLost>,
}

impl AiReport {
    pub fn damage_to_player(&self) -> f32 {
        self.incoming.iter().map(|f| f.damage).sum()
    }
}

/// Drives every armed hostile unit.
pub struct AiSystem {
    rng: StdRng,
    /// Scales damage dealt by hostiles (difficulty).
    pub damage_scale: f32,
}

impl AiSystem {
    pub fn new(seed: u64, damage_scale: f32) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            damage_scale,
        }
    }

    pub fn update(
        &mut self,
        world: &mut World,
        player: &PlayerCraft,
        map: &Heightmap,
        config: &WorldConfig,
        dt: f32,
    ) -> AiReport {
        let size = config.map_size_f32();
        let player_pos = player.position;
        let player_air = player.mode.is_airborne();
        let player_alive = player.is_alive();

        let structures: Vec<(Entity, Position)> = world
            .query::<(&Position, &Unit)>()
            .iter()
            .filter(|(_, (_, u))| u.alive && u.faction == Faction::Friendly && u.kind.is_structure())
            .map(|(e, (p, _))| (e, *p))
            .collect();

        let mut report = AiReport::default();
        let mut structure_hits: Vec<(Entity, f32)> = Vec::new();

        for (_, (pos, attack, unit, flight)) in
            world.query_mut::<(&mut Position, &mut Attack, &Unit, Option<&Flight>)>()
        {
            if !unit.alive || unit.faction != Faction::Hostile {
                continue;
            }
            attack.update_cooldown(dt);

            if let (Some(flight), true) = (flight, player_alive) {
                steer_aircraft(pos, flight, player_pos.xy(), attack.profile.range, map, size, dt);
            }

            let profile = attack.profile;
            let mut candidates: Vec<(AiTarget, Vec2)> = Vec::with_capacity(structures.len() + 1);
            let player_targetable = if player_air { profile.hits_air } else { profile.hits_ground };
            if player_alive && player_targetable {
                candidates.push((AiTarget::Player, player_pos.xy()));
            }
            if profile.hits_ground {
                candidates.extend(structures.iter().map(|(e, p)| (AiTarget::Structure(*e), p.xy())));
            }
            let Some(nearest) =
                find_nearest_target(candidates, pos.xy(), Some(profile.range), |_| true, size)
            else {
                continue;
            };

            if !attack.can_fire() {
                continue;
            }
            // Altitude matters for the actual shot.
            let target_xyz = match nearest.key {
                AiTarget::Player => Some(player_pos.xyz()),
                AiTarget::Structure(e) => structures.iter().find(|(s, _)| *s == e).map(|(_, p)| p.xyz()),
            };
            match target_xyz {
                Some(t) if distance_3d_wrapped(pos.xyz(), t, size) <= profile.range => {}
                _ => continue,
            }
            attack.trigger();
            if self.rng.gen::<f32>() >= profile.hit_chance {
                continue;
            }
            let damage = profile.damage * self.damage_scale;
            match nearest.key {
                AiTarget::Player => report.incoming.push(IncomingFire {
                    source: unit.kind,
                    damage,
                }),
                AiTarget::Structure(e) => structure_hits.push((e, damage)),
            }
        }

        for (e, damage) in structure_hits {
            if let Ok((health, unit)) = world.query_one_mut::<(&mut Health, &mut Unit)>(e) {
                if !unit.alive {
                    continue;
                }
                health.take_damage(damage);
                if health.is_dead() {
                    unit.alive = false;
                    log::info!("Friendly {} lost", unit.label.as_deref().unwrap_or(unit.kind.name()));
                    report.structures_lost.push(StructureLost {
                        entity: e,
                        kind: unit.kind,
                        label: unit.label.clone(),
                    });
                }
            }
        }

        report
    }
}

/// Turn toward the player at the craft's turn rate, fly on, and hold cruise
/// height over the terrain below.
fn steer_aircraft(
    pos: &mut Position,
    flight: &Flight,
    player: Vec2,
    weapon_range: f32,
    map: &Heightmap,
    map_size: f32,
    dt: f32,
) {
    let here = pos.xy();
    let to_player = engine_core::distance_2d_wrapped(here, player, map_size);
    if to_player > weapon_range * PURSUIT_RANGE_FACTOR {
        return;
    }
    let desired = bearing_wrapped(here, player, map_size);
    let turn = angle_difference(pos.heading, desired);
    let max_turn = flight.turn_rate * dt;
    pos.heading = normalize_angle(pos.heading + turn.clamp(-max_turn, max_turn));

    // Hold off just inside weapon range instead of ramming.
    if to_player > weapon_range * 0.5 {
        let step = pos.forward() * flight.speed * dt;
        pos.x += step.x;
        pos.y += step.y;
    }
    let ground = map.sample_height(pos.x, pos.y);
    let target_z = ground + flight.cruise_height;
    pos.z += (target_z - pos.z) * (dt * 2.0).min(1.0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::UnitBundle;
    use crate::mission::PlayerStart;

    fn flat_map() -> Heightmap {
        let shift = 8;
        let n = 1usize << (shift * 2);
        Heightmap::from_rasters(shift, vec![0; n], vec![[80, 130, 60]; n]).expect("rasters")
    }

    fn player_at(x: f32, y: f32, map: &Heightmap, config: &WorldConfig) -> PlayerCraft {
        PlayerCraft::new(
            &PlayerStart {
                x,
                y,
                z: Some(60.0),
                heading: 0.0,
            },
            map,
            config,
        )
    }

    #[test]
    fn sam_site_fires_at_helicopter_across_the_seam() {
        let map = flat_map();
        let config = WorldConfig::with_shift(8);
        let player = player_at(250.0, 10.0, &map, &config);
        let mut world = World::new();
        UnitBundle::new(EntityKind::SamSite, Faction::Hostile, Position::new(10.0, 10.0, 0.0)).spawn(&mut world);

        // Guaranteed hit.
        for (_, attack) in world.query_mut::<&mut Attack>() {
            attack.profile.hit_chance = 1.0;
        }
        let mut ai = AiSystem::new(1, 1.0);
        let report = ai.update(&mut world, &player, &map, &config, 0.1);
        assert_eq!(report.incoming.len(), 1);
        assert_eq!(report.incoming[0].source, EntityKind::SamSite);
        assert_eq!(report.damage_to_player(), 35.0);

        // Cooling down.
        let report = ai.update(&mut world, &player, &map, &config, 0.1);
        assert!(report.incoming.is_empty());
    }

    #[test]
    fn tank_cannot_hit_air_but_shells_friendly_base() {
        let map = flat_map();
        let config = WorldConfig::with_shift(8);
        let player = player_at(30.0, 30.0, &map, &config);
        let mut world = World::new();
        UnitBundle::new(EntityKind::Tank, Faction::Hostile, Position::new(20.0, 20.0, 0.0)).spawn(&mut world);
        let base = UnitBundle::new(EntityKind::Base, Faction::Friendly, Position::new(60.0, 20.0, 0.0))
            .with_label("fob")
            .spawn(&mut world);
        for (_, attack) in world.query_mut::<&mut Attack>() {
            attack.profile.hit_chance = 1.0;
            attack.profile.damage = 1000.0;
        }
        let mut ai = AiSystem::new(2, 1.0);
        let report = ai.update(&mut world, &player, &map, &config, 0.1);
        assert!(report.incoming.is_empty());
        assert_eq!(report.structures_lost.len(), 1);
        assert_eq!(report.structures_lost[0].label.as_deref(), Some("fob"));
        assert!(!world.get::<&Unit>(base).expect("base").alive);
    }

    #[test]
    fn aircraft_turn_toward_the_player() {
        let map = flat_map();
        let config = WorldConfig::with_shift(8);
        let player = player_at(100.0, 200.0, &map, &config);
        let mut world = World::new();
        let heli = UnitBundle::new(
            EntityKind::AirAttackHeli,
            Faction::Hostile,
            Position::new(100.0, 10.0, 70.0).with_heading(0.0),
        )
        .spawn(&mut world);
        let mut ai = AiSystem::new(3, 1.0);
        for _ in 0..30 {
            ai.update(&mut world, &player, &map, &config, 0.1);
        }
        let pos = *world.get::<&Position>(heli).expect("heli");
        let size = config.map_size_f32();
        let bearing = bearing_wrapped(pos.xy(), player.position.xy(), size);
        assert!(angle_difference(pos.heading, bearing).abs() < 0.05);
        let closing = engine_core::distance_2d_wrapped(pos.xy(), player.position.xy(), size);
        assert!(closing < 190.0);
    }
}
