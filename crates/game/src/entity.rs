//! Mission entities: ground units, aircraft and structures.
//!
//! Every entity in the mission world carries a [`Position`], a [`Health`] and a
//! [`Unit`]. Armed units add an [`Attack`]; aircraft add a [`Flight`]. Dead
//! units stay in the world with `alive == false` so kill counts and protected
//! structures can still be looked up.

use std::collections::{HashMap, HashSet};
use std::fmt;

use engine_core::{Faction, Health, Position};
use hecs::World;
use serde::{Deserialize, Serialize};

use crate::combat::TargetType;

/// Every kind of entity a mission can place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Tank,
    Soldier,
    Building,
    SamSite,
    AirFighter,
    AirAttackHeli,
    Base,
    Airport,
}

impl EntityKind {
    pub const ALL: [EntityKind; 8] = [
        EntityKind::Tank,
        EntityKind::Soldier,
        EntityKind::Building,
        EntityKind::SamSite,
        EntityKind::AirFighter,
        EntityKind::AirAttackHeli,
        EntityKind::Base,
        EntityKind::Airport,
    ];

    /// Mission-data name (e.g. `SAM_SITE`).
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Tank => "TANK",
            EntityKind::Soldier => "SOLDIER",
            EntityKind::Building => "BUILDING",
            EntityKind::SamSite => "SAM_SITE",
            EntityKind::AirFighter => "AIR_FIGHTER",
            EntityKind::AirAttackHeli => "AIR_ATTACK_HELI",
            EntityKind::Base => "BASE",
            EntityKind::Airport => "AIRPORT",
        }
    }

    /// Case-insensitive lookup of a mission-data name.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|k| k.name() == upper)
    }

    /// Row of the damage table this kind is hit through.
    pub fn target_type(&self) -> TargetType {
        match self {
            EntityKind::Tank => TargetType::Tank,
            EntityKind::Soldier => TargetType::Soldier,
            EntityKind::Building | EntityKind::Base | EntityKind::Airport => TargetType::Building,
            EntityKind::SamSite => TargetType::SamSite,
            EntityKind::AirFighter | EntityKind::AirAttackHeli => TargetType::Aircraft,
        }
    }

    pub fn is_air(&self) -> bool {
        matches!(self, EntityKind::AirFighter | EntityKind::AirAttackHeli)
    }

    pub fn is_structure(&self) -> bool {
        matches!(self, EntityKind::Building | EntityKind::Base | EntityKind::Airport)
    }

    pub fn max_health(&self) -> f32 {
        match self {
            EntityKind::Tank => 300.0,
            EntityKind::Soldier => 40.0,
            EntityKind::Building => 250.0,
            EntityKind::SamSite => 200.0,
            EntityKind::AirFighter => 150.0,
            EntityKind::AirAttackHeli => 180.0,
            EntityKind::Base => 600.0,
            EntityKind::Airport => 800.0,
        }
    }

    /// Weapon carried by this kind, if any.
    pub fn attack_profile(&self) -> Option<AttackProfile> {
        let p = |range, damage, cooldown, hit_chance, air, ground| AttackProfile {
            range,
            damage,
            cooldown,
            hit_chance,
            hits_air: air,
            hits_ground: ground,
        };
        match self {
            EntityKind::Tank => Some(p(250.0, 12.0, 3.0, 0.5, false, true)),
            EntityKind::Soldier => Some(p(120.0, 2.0, 1.0, 0.3, true, true)),
            EntityKind::SamSite => Some(p(500.0, 35.0, 6.0, 0.6, true, false)),
            EntityKind::AirFighter => Some(p(350.0, 20.0, 4.0, 0.5, true, true)),
            EntityKind::AirAttackHeli => Some(p(300.0, 15.0, 2.5, 0.5, true, true)),
            EntityKind::Building | EntityKind::Base | EntityKind::Airport => None,
        }
    }

    /// Cruise parameters for aircraft.
    pub fn flight(&self) -> Option<Flight> {
        match self {
            EntityKind::AirFighter => Some(Flight {
                speed: 140.0,
                turn_rate: 0.9,
                cruise_height: 160.0,
            }),
            EntityKind::AirAttackHeli => Some(Flight {
                speed: 80.0,
                turn_rate: 1.4,
                cruise_height: 70.0,
            }),
            _ => None,
        }
    }

    /// Score for destroying one of these.
    pub fn score_value(&self) -> u32 {
        match self {
            EntityKind::Soldier => 10,
            EntityKind::Tank => 100,
            EntityKind::Building => 50,
            EntityKind::SamSite => 150,
            EntityKind::AirFighter => 200,
            EntityKind::AirAttackHeli => 175,
            EntityKind::Base | EntityKind::Airport => 0,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Identity and liveness of a mission entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub kind: EntityKind,
    pub faction: Faction,
    /// Mission-data id for bases/airports, used by protect objectives.
    pub label: Option<String>,
    pub alive: bool,
}

/// Stats of a unit's weapon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AttackProfile {
    pub range: f32,
    pub damage: f32,
    /// Seconds between shots.
    pub cooldown: f32,
    /// Probability a shot lands.
    pub hit_chance: f32,
    pub hits_air: bool,
    pub hits_ground: bool,
}

/// Weapon state of an armed unit.
#[derive(Debug, Clone, Copy)]
pub struct Attack {
    pub profile: AttackProfile,
    pub cooldown_timer: f32,
}

impl Attack {
    pub fn new(profile: AttackProfile) -> Self {
        Self {
            profile,
            cooldown_timer: 0.0,
        }
    }

    pub fn can_fire(&self) -> bool {
        self.cooldown_timer <= 0.0
    }

    pub fn trigger(&mut self) {
        self.cooldown_timer = self.profile.cooldown;
    }

    pub fn update_cooldown(&mut self, dt: f32) {
        self.cooldown_timer = (self.cooldown_timer - dt).max(0.0);
    }
}

/// Arcade flight parameters for AI aircraft.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Flight {
    pub speed: f32,
    /// Radians per second.
    pub turn_rate: f32,
    /// Preferred height above terrain.
    pub cruise_height: f32,
}

/// Everything needed to place one unit.
pub struct UnitBundle {
    pub position: Position,
    pub health: Health,
    pub unit: Unit,
    pub attack: Option<Attack>,
    pub flight: Option<Flight>,
}

impl UnitBundle {
    pub fn new(kind: EntityKind, faction: Faction, position: Position) -> Self {
        Self {
            position,
            health: Health::new(kind.max_health()),
            unit: Unit {
                kind,
                faction,
                label: None,
                alive: true,
            },
            attack: kind.attack_profile().map(Attack::new),
            flight: kind.flight(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.unit.label = Some(label.into());
        self
    }

    /// Spawn into the ECS world.
    pub fn spawn(self, world: &mut World) -> hecs::Entity {
        let mut builder = hecs::EntityBuilder::new();
        builder.add(self.position).add(self.health).add(self.unit);
        if let Some(attack) = self.attack {
            builder.add(attack);
        }
        if let Some(flight) = self.flight {
            builder.add(flight);
        }
        world.spawn(builder.build())
    }
}

/// Which entities an objective's `targetType` refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TargetSelector {
    Kind(EntityKind),
    /// Either aircraft kind.
    Air,
}

impl TargetSelector {
    pub fn matches(&self, kind: EntityKind) -> bool {
        match self {
            TargetSelector::Kind(k) => *k == kind,
            TargetSelector::Air => kind.is_air(),
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_uppercase().as_str() {
            "AIR" | "AIRCRAFT" => Some(TargetSelector::Air),
            other => EntityKind::from_name(other).map(TargetSelector::Kind),
        }
    }
}

impl TryFrom<String> for TargetSelector {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("unknown target type '{value}'"))
    }
}

impl From<TargetSelector> for String {
    fn from(value: TargetSelector) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TargetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetSelector::Kind(k) => f.write_str(k.name()),
            TargetSelector::Air => f.write_str("AIR"),
        }
    }
}

/// Snapshot of who is still standing, taken once per tick.
#[derive(Debug, Clone, Default)]
pub struct Census {
    pub hostiles_alive: u32,
    pub hostiles_by_kind: HashMap<EntityKind, u32>,
    /// Labels of every labelled entity ever spawned.
    pub labels_seen: HashSet<String>,
    pub labels_alive: HashSet<String>,
}

impl Census {
    pub fn gather(world: &World) -> Self {
        let mut census = Census::default();
        for (_, unit) in world.query::<&Unit>().iter() {
            if let Some(label) = &unit.label {
                census.labels_seen.insert(label.clone());
                if unit.alive {
                    census.labels_alive.insert(label.clone());
                }
            }
            if unit.alive && unit.faction == Faction::Hostile {
                census.hostiles_alive += 1;
                *census.hostiles_by_kind.entry(unit.kind).or_insert(0) += 1;
            }
        }
        census
    }

    /// Live hostiles matching `selector`.
    pub fn hostiles_matching(&self, selector: TargetSelector) -> u32 {
        self.hostiles_by_kind
            .iter()
            .filter(|(k, _)| selector.matches(**k))
            .map(|(_, n)| *n)
            .sum()
    }

    /// `Some(false)` once a labelled entity has died; `None` if it never existed.
    pub fn label_alive(&self, label: &str) -> Option<bool> {
        if self.labels_seen.contains(label) {
            Some(self.labels_alive.contains(label))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_names_round_trip() {
        for kind in EntityKind::ALL {
            assert_eq!(EntityKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EntityKind::from_name("sam_site"), Some(EntityKind::SamSite));
        assert_eq!(EntityKind::from_name("BATTLESHIP"), None);
        let json = serde_json::to_string(&EntityKind::AirAttackHeli).expect("serialize");
        assert_eq!(json, "\"AIR_ATTACK_HELI\"");
    }

    #[test]
    fn selector_parses_kinds_and_air() {
        assert_eq!(TargetSelector::parse("tank"), Some(TargetSelector::Kind(EntityKind::Tank)));
        assert_eq!(TargetSelector::parse("AIRCRAFT"), Some(TargetSelector::Air));
        assert!(TargetSelector::Air.matches(EntityKind::AirFighter));
        assert!(!TargetSelector::Air.matches(EntityKind::Tank));
        let parsed: TargetSelector = serde_json::from_str("\"SOLDIER\"").expect("parse");
        assert_eq!(parsed, TargetSelector::Kind(EntityKind::Soldier));
        assert!(serde_json::from_str::<TargetSelector>("\"DRAGON\"").is_err());
    }

    #[test]
    fn census_counts_live_hostiles_and_labels() {
        let mut world = World::new();
        UnitBundle::new(EntityKind::Tank, Faction::Hostile, Position::default()).spawn(&mut world);
        UnitBundle::new(EntityKind::AirFighter, Faction::Hostile, Position::default()).spawn(&mut world);
        let base = UnitBundle::new(EntityKind::Base, Faction::Friendly, Position::default())
            .with_label("alpha")
            .spawn(&mut world);

        let census = Census::gather(&world);
        assert_eq!(census.hostiles_alive, 2);
        assert_eq!(census.hostiles_matching(TargetSelector::Air), 1);
        assert_eq!(census.label_alive("alpha"), Some(true));
        assert_eq!(census.label_alive("bravo"), None);

        world.get::<&mut Unit>(base).expect("base exists").alive = false;
        let census = Census::gather(&world);
        assert_eq!(census.label_alive("alpha"), Some(false));
    }
}
