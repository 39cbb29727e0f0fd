//! Weapon-vs-target damage resolution.
//!
//! Damage dealt is `base weapon damage × multiplier(weapon, target type)`. The
//! multiplier table is balance data built once at startup and passed around by
//! shared reference; any pair it does not list multiplies by exactly 1.0.

use std::collections::BTreeMap;
use std::fmt;

use engine_core::{distance_2d_wrapped, Faction, Health, Position, Vec2, Vec3};
use hecs::{Entity, World};
use serde::{Deserialize, Serialize};

use crate::entity::{EntityKind, Unit};
use crate::weapons::WeaponType;

/// Damage-table column. Several entity kinds share one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TargetType {
    Tank,
    Soldier,
    Building,
    SamSite,
    Aircraft,
}

impl TargetType {
    pub const ALL: [TargetType; 5] = [
        TargetType::Tank,
        TargetType::Soldier,
        TargetType::Building,
        TargetType::SamSite,
        TargetType::Aircraft,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            TargetType::Tank => "TANK",
            TargetType::Soldier => "SOLDIER",
            TargetType::Building => "BUILDING",
            TargetType::SamSite => "SAM_SITE",
            TargetType::Aircraft => "AIRCRAFT",
        }
    }

    /// Accepts the column names and any entity kind name.
    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.name() == upper)
            .or_else(|| EntityKind::from_name(&upper).map(|k| k.target_type()))
    }

    pub fn category(&self) -> DamageCategory {
        match self {
            TargetType::Tank | TargetType::SamSite => DamageCategory::Armored,
            TargetType::Soldier => DamageCategory::Infantry,
            TargetType::Building => DamageCategory::Structure,
            TargetType::Aircraft => DamageCategory::Air,
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Broad class a target type belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DamageCategory {
    Armored,
    Infantry,
    Structure,
    Air,
}

/// One flag per category; at most one is set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryFlags {
    pub armored: bool,
    pub infantry: bool,
    pub structure: bool,
    pub air: bool,
}

impl From<DamageCategory> for CategoryFlags {
    fn from(category: DamageCategory) -> Self {
        let mut flags = CategoryFlags::default();
        match category {
            DamageCategory::Armored => flags.armored = true,
            DamageCategory::Infantry => flags.infantry = true,
            DamageCategory::Structure => flags.structure = true,
            DamageCategory::Air => flags.air = true,
        }
        flags
    }
}

/// Category flags for a target type name. Unknown names get no flags.
pub fn category_flags(target_name: &str) -> CategoryFlags {
    TargetType::from_name(target_name)
        .map(|t| t.category().into())
        .unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DamageEntry {
    pub weapon: WeaponType,
    pub target: TargetType,
    pub multiplier: f32,
}

/// (weapon, target type) → damage multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<DamageEntry>", into = "Vec<DamageEntry>")]
pub struct DamageTable {
    entries: BTreeMap<(WeaponType, TargetType), f32>,
}

impl DamageTable {
    /// Table with no entries; every lookup is 1.0.
    pub fn empty() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Shipping balance.
    pub fn standard() -> Self {
        use TargetType::*;
        use WeaponType::*;
        //                      Tank  Soldier Building SamSite Aircraft
        let rows: [(WeaponType, [f32; 5]); 7] = [
            (Cannon, [0.5, 1.5, 0.6, 0.8, 1.2]),
            (Rocket, [1.2, 1.0, 1.5, 1.3, 0.3]),
            (Missile, [1.5, 0.5, 1.2, 1.5, 0.5]),
            (AirToAir, [0.2, 0.1, 0.1, 0.2, 2.0]),
            (Rifle, [0.1, 1.0, 0.2, 0.2, 0.3]),
            (Sniper, [0.1, 3.0, 0.1, 0.3, 0.2]),
            (Grenade, [0.8, 1.5, 1.0, 1.0, 0.1]),
        ];
        let columns = [Tank, Soldier, Building, SamSite, Aircraft];
        let entries = rows
            .iter()
            .flat_map(|(weapon, values)| {
                columns
                    .iter()
                    .zip(values.iter())
                    .map(move |(target, m)| ((*weapon, *target), *m))
            })
            .collect();
        Self { entries }
    }

    pub fn from_entries(entries: impl IntoIterator<Item = DamageEntry>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|e| ((e.weapon, e.target), e.multiplier))
                .collect(),
        }
    }

    /// Override or add entries on top of this table.
    pub fn with_overrides(mut self, overrides: impl IntoIterator<Item = DamageEntry>) -> Self {
        for e in overrides {
            self.entries.insert((e.weapon, e.target), e.multiplier);
        }
        self
    }

    pub fn multiplier(&self, weapon: WeaponType, target: TargetType) -> f32 {
        self.entries.get(&(weapon, target)).copied().unwrap_or(1.0)
    }

    /// Lookup by name. Unknown weapon or target names give 1.0.
    pub fn multiplier_by_name(&self, weapon: &str, target: &str) -> f32 {
        match (WeaponType::from_name(weapon), TargetType::from_name(target)) {
            (Some(w), Some(t)) => self.multiplier(w, t),
            _ => 1.0,
        }
    }

    pub fn damage(&self, weapon: WeaponType, target: TargetType) -> f32 {
        weapon.base_damage() * self.multiplier(weapon, target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DamageTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl From<Vec<DamageEntry>> for DamageTable {
    fn from(entries: Vec<DamageEntry>) -> Self {
        Self::from_entries(entries)
    }
}

impl From<DamageTable> for Vec<DamageEntry> {
    fn from(table: DamageTable) -> Self {
        table
            .entries
            .into_iter()
            .map(|((weapon, target), multiplier)| DamageEntry {
                weapon,
                target,
                multiplier,
            })
            .collect()
    }
}

/// A target that reached zero health.
#[derive(Debug, Clone, PartialEq)]
pub struct KillEvent {
    pub entity: Entity,
    pub kind: EntityKind,
    pub faction: Faction,
    pub label: Option<String>,
    pub position: Vec3,
    pub weapon: WeaponType,
}

impl KillEvent {
    pub fn target_type(&self) -> TargetType {
        self.kind.target_type()
    }
}

/// Outcome of one resolved hit.
#[derive(Debug, Clone)]
pub struct HitResult {
    pub entity: Entity,
    pub damage_dealt: f32,
    pub kill: Option<KillEvent>,
}

impl HitResult {
    pub fn was_kill(&self) -> bool {
        self.kill.is_some()
    }
}

/// Apply one weapon hit to `target`. `None` if the entity is missing, not a
/// unit, or already dead.
pub fn resolve_hit(
    world: &mut World,
    target: Entity,
    weapon: WeaponType,
    table: &DamageTable,
    damage_scale: f32,
) -> Option<HitResult> {
    let mut query = world
        .query_one::<(&Position, &mut Health, &mut Unit)>(target)
        .ok()?;
    let (position, health, unit) = query.get()?;
    if !unit.alive {
        return None;
    }

    let damage = table.damage(weapon, unit.kind.target_type()) * damage_scale;
    health.take_damage(damage);

    let kill = if health.is_dead() {
        unit.alive = false;
        log::debug!("{} destroyed by {}", unit.kind, weapon);
        Some(KillEvent {
            entity: target,
            kind: unit.kind,
            faction: unit.faction,
            label: unit.label.clone(),
            position: position.xyz(),
            weapon,
        })
    } else {
        None
    };

    Some(HitResult {
        entity: target,
        damage_dealt: damage,
        kill,
    })
}

/// Splash hit: every live unit within `radius` (wrapped) of `center` takes
/// damage falling off linearly to zero at the edge.
pub fn resolve_area_hit(
    world: &mut World,
    center: Vec2,
    radius: f32,
    weapon: WeaponType,
    table: &DamageTable,
    map_size: f32,
) -> Vec<HitResult> {
    if radius <= 0.0 {
        return Vec::new();
    }
    let in_blast: Vec<(Entity, f32)> = world
        .query::<(&Position, &Unit)>()
        .iter()
        .filter(|(_, (_, unit))| unit.alive)
        .filter_map(|(e, (pos, _))| {
            let d = distance_2d_wrapped(center, pos.xy(), map_size);
            (d < radius).then_some((e, 1.0 - d / radius))
        })
        .collect();

    in_blast
        .into_iter()
        .filter_map(|(e, falloff)| resolve_hit(world, e, weapon, table, falloff))
        .collect()
}

/// Player combat bookkeeping for accuracy and damage totals.
#[derive(Debug, Clone, Default)]
pub struct CombatSystem {
    pub shots_fired: u32,
    pub shots_hit: u32,
    pub damage_dealt: f32,
}

impl CombatSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_shot(&mut self) {
        self.shots_fired += 1;
    }

    /// Track the hits one shot produced; returns the kills among them.
    pub fn record_hits(&mut self, hits: &[HitResult]) -> Vec<KillEvent> {
        if !hits.is_empty() {
            self.shots_hit += 1;
        }
        let mut kills = Vec::new();
        for hit in hits {
            self.damage_dealt += hit.damage_dealt;
            if let Some(kill) = &hit.kill {
                kills.push(kill.clone());
            }
        }
        kills
    }

    /// Hits per shot, 0 when nothing was fired.
    pub fn accuracy(&self) -> f32 {
        if self.shots_fired == 0 {
            0.0
        } else {
            (self.shots_hit as f32 / self.shots_fired as f32).min(1.0)
        }
    }
}
