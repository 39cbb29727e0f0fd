//! Mission population: places friendly sites and hostile units from the
//! mission's spawn zones.
//!
//! Ground units are only placed on dry, gentle terrain (the same landing check
//! the player's helicopter uses). Aircraft spawn at cruise height above the
//! ground under them.

use engine_core::{distance_2d_wrapped, Faction, Position, Vec2, WorldConfig};
use hecs::World;
use procgen::Heightmap;
use rand::prelude::*;
use renderer::{landing_check, DEFAULT_MAX_LANDING_SLOPE};

use crate::entity::{EntityKind, UnitBundle};
use crate::mission::{Difficulty, Mission, Site, MAX_ZONE_COUNT};

/// Ground units tolerate rougher ground than a landing helicopter.
const GROUND_UNIT_MAX_SLOPE: f32 = DEFAULT_MAX_LANDING_SLOPE * 2.0;
/// Random-scatter fallback keeps hostiles at least this far from the player.
const MIN_SCATTER_DISTANCE: f32 = 200.0;

/// What a populate pass produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpawnReport {
    pub hostiles: u32,
    pub friendlies: u32,
    /// Units dropped because no acceptable ground was found.
    pub rejected: u32,
}

/// Seeded unit placement.
pub struct MissionSpawner {
    rng: StdRng,
    /// Placement tries per unit before giving up on it.
    pub max_attempts: u32,
}

impl MissionSpawner {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            max_attempts: 12,
        }
    }

    /// Spawn everything the mission asks for into `world`.
    pub fn populate(
        &mut self,
        world: &mut World,
        mission: &Mission,
        map: &Heightmap,
        config: &WorldConfig,
    ) -> SpawnReport {
        let mut report = SpawnReport::default();

        for (sites, kind) in [(&mission.bases, EntityKind::Base), (&mission.airports, EntityKind::Airport)] {
            for site in sites {
                self.spawn_site(world, site, kind, map);
                report.friendlies += 1;
            }
        }

        if mission.spawn_zones.is_empty() {
            log::warn!(
                "Mission {} has no spawn zones; scattering {} hostiles",
                mission.mission_id,
                config.target_count
            );
            self.scatter(world, mission, map, config, &mut report);
        } else {
            for zone in &mission.spawn_zones {
                for _ in 0..zone.count.min(MAX_ZONE_COUNT) {
                    let kind = zone.kind.unwrap_or_else(|| self.pick_kind(mission.difficulty));
                    let center = Vec2::new(zone.x, zone.y);
                    match self.place(kind, center, zone.radius, map) {
                        Some(position) => {
                            UnitBundle::new(kind, Faction::Hostile, position).spawn(world);
                            report.hostiles += 1;
                        }
                        None => report.rejected += 1,
                    }
                }
            }
        }

        log::info!(
            "Spawned {} hostiles and {} friendly sites ({} rejected)",
            report.hostiles,
            report.friendlies,
            report.rejected
        );
        report
    }

    fn spawn_site(&mut self, world: &mut World, site: &Site, kind: EntityKind, map: &Heightmap) {
        let z = map.sample_height(site.x, site.y);
        let mut bundle = UnitBundle::new(kind, Faction::Friendly, Position::new(site.x, site.y, z));
        if let Some(id) = &site.id {
            bundle = bundle.with_label(id.clone());
        }
        bundle.spawn(world);
    }

    fn scatter(
        &mut self,
        world: &mut World,
        mission: &Mission,
        map: &Heightmap,
        config: &WorldConfig,
        report: &mut SpawnReport,
    ) {
        let size = config.map_size_f32();
        let start = Vec2::new(mission.player_start.x, mission.player_start.y);
        for _ in 0..config.target_count {
            let kind = self.pick_kind(mission.difficulty);
            let mut placed = None;
            for _ in 0..self.max_attempts {
                let center = Vec2::new(self.rng.gen_range(0.0..size), self.rng.gen_range(0.0..size));
                if distance_2d_wrapped(center, start, size) < MIN_SCATTER_DISTANCE {
                    continue;
                }
                placed = self.place(kind, center, 0.0, map);
                if placed.is_some() {
                    break;
                }
            }
            match placed {
                Some(position) => {
                    UnitBundle::new(kind, Faction::Hostile, position).spawn(world);
                    report.hostiles += 1;
                }
                None => report.rejected += 1,
            }
        }
    }

    /// Find a spot for `kind` within `radius` of `center`.
    fn place(&mut self, kind: EntityKind, center: Vec2, radius: f32, map: &Heightmap) -> Option<Position> {
        let heading = self.rng.gen_range(0.0..std::f32::consts::TAU);
        if let Some(flight) = kind.flight() {
            let p = self.point_in_disc(center, radius);
            let z = map.sample_height(p.x, p.y) + flight.cruise_height;
            return Some(Position::new(p.x, p.y, z).with_heading(heading));
        }

        let max_slope = if kind.is_structure() {
            DEFAULT_MAX_LANDING_SLOPE
        } else {
            GROUND_UNIT_MAX_SLOPE
        };
        for _ in 0..self.max_attempts {
            let p = self.point_in_disc(center, radius);
            if landing_check(map, p.x, p.y, max_slope).is_clear() {
                let z = map.sample_height(p.x, p.y);
                return Some(Position::new(p.x, p.y, z).with_heading(heading));
            }
        }
        log::debug!("No ground for {} near ({:.0}, {:.0})", kind, center.x, center.y);
        None
    }

    fn point_in_disc(&mut self, center: Vec2, radius: f32) -> Vec2 {
        if radius <= 0.0 {
            return center;
        }
        // sqrt keeps the scatter uniform over the disc.
        let r = radius * self.rng.gen::<f32>().sqrt();
        let a = self.rng.gen_range(0.0..std::f32::consts::TAU);
        center + Vec2::new(a.cos(), a.sin()) * r
    }

    /// Difficulty-weighted unit mix for zones without a fixed kind.
    fn pick_kind(&mut self, difficulty: Difficulty) -> EntityKind {
        use EntityKind::*;
        let table: &[(EntityKind, u32)] = match difficulty {
            Difficulty::Easy => &[(Soldier, 5), (Tank, 3), (Building, 2)],
            Difficulty::Medium => &[(Soldier, 5), (Tank, 4), (Building, 2), (SamSite, 1), (AirAttackHeli, 1)],
            Difficulty::Hard => &[
                (Soldier, 4),
                (Tank, 4),
                (Building, 2),
                (SamSite, 2),
                (AirAttackHeli, 2),
                (AirFighter, 1),
            ],
            Difficulty::Extreme => &[
                (Soldier, 3),
                (Tank, 4),
                (Building, 1),
                (SamSite, 3),
                (AirAttackHeli, 3),
                (AirFighter, 2),
            ],
        };
        table
            .choose_weighted(&mut self.rng, |(_, w)| *w)
            .map(|(k, _)| *k)
            .unwrap_or(Tank)
    }
}
