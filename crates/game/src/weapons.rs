//! Player weapons: helicopter armament and on-foot small arms.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::combat::{DamageTable, TargetType};

/// Weapon types available to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WeaponType {
    /// Chin-mounted autocannon - fast, light, good against soft targets.
    Cannon,
    /// Unguided rocket pods - splash damage.
    Rocket,
    /// Guided anti-armor missile.
    Missile,
    /// Heat-seeker, air targets only.
    AirToAir,
    /// Standard rifle carried on foot.
    Rifle,
    /// Slow, long range, lethal against infantry.
    Sniper,
    /// Thrown grenade with splash.
    Grenade,
}

impl WeaponType {
    pub const ALL: [WeaponType; 7] = [
        WeaponType::Cannon,
        WeaponType::Rocket,
        WeaponType::Missile,
        WeaponType::AirToAir,
        WeaponType::Rifle,
        WeaponType::Sniper,
        WeaponType::Grenade,
    ];

    /// Helicopter weapon slots, in cycle order.
    pub const HELICOPTER: [WeaponType; 4] = [
        WeaponType::Cannon,
        WeaponType::Rocket,
        WeaponType::Missile,
        WeaponType::AirToAir,
    ];

    /// On-foot weapon slots, in cycle order.
    pub const ON_FOOT: [WeaponType; 3] = [WeaponType::Rifle, WeaponType::Sniper, WeaponType::Grenade];

    pub fn name(&self) -> &'static str {
        match self {
            WeaponType::Cannon => "CANNON",
            WeaponType::Rocket => "ROCKET",
            WeaponType::Missile => "MISSILE",
            WeaponType::AirToAir => "AIR_TO_AIR",
            WeaponType::Rifle => "RIFLE",
            WeaponType::Sniper => "SNIPER",
            WeaponType::Grenade => "GRENADE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        let upper = name.trim().to_ascii_uppercase();
        Self::ALL.into_iter().find(|w| w.name() == upper)
    }

    /// Damage before the target multiplier.
    pub fn base_damage(&self) -> f32 {
        match self {
            WeaponType::Cannon => 20.0,
            WeaponType::Rocket => 90.0,
            WeaponType::Missile => 220.0,
            WeaponType::AirToAir => 160.0,
            WeaponType::Rifle => 12.0,
            WeaponType::Sniper => 45.0,
            WeaponType::Grenade => 60.0,
        }
    }

    /// Only locks onto aircraft.
    pub fn air_only(&self) -> bool {
        matches!(self, WeaponType::AirToAir)
    }

    /// Seconds between shots.
    pub fn cooldown(&self) -> f32 {
        match self {
            WeaponType::Cannon => 0.125,
            WeaponType::Rocket => 0.5,
            WeaponType::Missile => 2.0,
            WeaponType::AirToAir => 2.0,
            WeaponType::Rifle => 0.15,
            WeaponType::Sniper => 1.25,
            WeaponType::Grenade => 1.5,
        }
    }

    /// Lock-on range in world units.
    pub fn range(&self) -> f32 {
        match self {
            WeaponType::Cannon => 400.0,
            WeaponType::Rocket => 450.0,
            WeaponType::Missile => 600.0,
            WeaponType::AirToAir => 700.0,
            WeaponType::Rifle => 200.0,
            WeaponType::Sniper => 450.0,
            WeaponType::Grenade => 60.0,
        }
    }

    /// Zero for direct-hit weapons.
    pub fn splash_radius(&self) -> f32 {
        match self {
            WeaponType::Rocket => 25.0,
            WeaponType::Missile => 12.0,
            WeaponType::Grenade => 15.0,
            _ => 0.0,
        }
    }

    /// Rounds carried per sortie. Heavier ordnance carries fewer.
    pub fn rounds(&self) -> u32 {
        match self {
            WeaponType::Cannon => 720,
            WeaponType::Rocket => 38,
            WeaponType::Missile => 8,
            WeaponType::AirToAir => 4,
            WeaponType::Rifle => 210,
            WeaponType::Sniper => 30,
            WeaponType::Grenade => 6,
        }
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One loadout slot: a weapon type, its remaining rounds and its cooldown.
#[derive(Debug, Clone, PartialEq)]
pub struct Weapon {
    pub weapon_type: WeaponType,
    pub rounds: u32,
    cooldown: f32,
}

impl Weapon {
    /// Fully stocked.
    pub fn new(weapon_type: WeaponType) -> Self {
        Self {
            weapon_type,
            rounds: weapon_type.rounds(),
            cooldown: 0.0,
        }
    }

    pub fn range(&self) -> f32 {
        self.weapon_type.range()
    }

    pub fn splash_radius(&self) -> f32 {
        self.weapon_type.splash_radius()
    }

    pub fn update(&mut self, dt: f32) {
        self.cooldown = (self.cooldown - dt).max(0.0);
    }

    pub fn ready(&self) -> bool {
        self.cooldown <= 0.0 && self.rounds > 0
    }

    /// Spend a round and start the cooldown. `false` when not ready.
    pub fn fire(&mut self) -> bool {
        if !self.ready() {
            return false;
        }
        self.rounds -= 1;
        self.cooldown = self.weapon_type.cooldown();
        true
    }
}

/// The loaded weapon that hits `target` hardest, by the damage table.
pub fn best_weapon(
    loadout: &[Weapon],
    target: TargetType,
    table: &DamageTable,
) -> Option<WeaponType> {
    loadout
        .iter()
        .filter(|w| w.rounds > 0)
        .filter(|w| !w.weapon_type.air_only() || target == TargetType::Aircraft)
        .map(|w| (w.weapon_type, table.damage(w.weapon_type, target)))
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(weapon, _)| weapon)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for w in WeaponType::ALL {
            assert_eq!(WeaponType::from_name(w.name()), Some(w));
        }
        assert_eq!(WeaponType::from_name("air_to_air"), Some(WeaponType::AirToAir));
        assert_eq!(WeaponType::from_name("LASER"), None);
    }

    #[test]
    fn rounds_run_out() {
        let mut w = Weapon::new(WeaponType::AirToAir);
        for _ in 0..WeaponType::AirToAir.rounds() {
            assert!(w.fire());
            w.update(WeaponType::AirToAir.cooldown());
        }
        assert_eq!(w.rounds, 0);
        assert!(!w.ready());
        assert!(!w.fire());
        w.update(10.0);
        assert!(!w.ready());
    }

    #[test]
    fn cooldown_follows_weapon_type() {
        let mut w = Weapon::new(WeaponType::Sniper);
        assert!(w.fire());
        assert!(!w.fire());
        w.update(1.0);
        assert!(!w.ready());
        w.update(0.25);
        assert!(w.fire());
        assert_eq!(w.rounds, 28);
    }

    #[test]
    fn best_weapon_follows_the_damage_table() {
        let table = DamageTable::standard();
        let mut loadout: Vec<Weapon> = WeaponType::HELICOPTER.into_iter().map(Weapon::new).collect();
        assert_eq!(best_weapon(&loadout, TargetType::Tank, &table), Some(WeaponType::Missile));
        assert_eq!(best_weapon(&loadout, TargetType::Aircraft, &table), Some(WeaponType::AirToAir));

        // Out of missiles: rockets are next best against armor.
        loadout[2].rounds = 0;
        assert_eq!(best_weapon(&loadout, TargetType::Tank, &table), Some(WeaponType::Rocket));

        let on_foot: Vec<Weapon> = WeaponType::ON_FOOT.into_iter().map(Weapon::new).collect();
        assert_eq!(best_weapon(&on_foot, TargetType::Soldier, &table), Some(WeaponType::Sniper));
        assert_eq!(best_weapon(&[], TargetType::Soldier, &table), None);
    }
}
