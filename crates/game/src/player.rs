//! Player craft: arcade helicopter flight and on-foot movement.

use engine_core::{normalize_angle, Health, Position, WorldConfig};
use procgen::Heightmap;
use renderer::{landing_check, water_at, LandingSurface, DEFAULT_MAX_LANDING_SLOPE};

use crate::mission::PlayerStart;
use crate::weapons::{Weapon, WeaponType};

/// Eye height above terrain when on foot.
const EYE_HEIGHT: f32 = 2.0;
/// Walking speed as a fraction of the flight speed.
const WALK_FRACTION: f32 = 0.08;
/// Highest the helicopter may hover above ground and still set down.
const LANDING_CLEARANCE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerMode {
    Helicopter,
    OnFoot,
}

impl PlayerMode {
    pub fn loadout(&self) -> Vec<Weapon> {
        let slots: &[WeaponType] = match self {
            PlayerMode::Helicopter => &WeaponType::HELICOPTER,
            PlayerMode::OnFoot => &WeaponType::ON_FOOT,
        };
        slots.iter().copied().map(Weapon::new).collect()
    }

    pub fn is_airborne(&self) -> bool {
        matches!(self, PlayerMode::Helicopter)
    }
}

/// One tick of player intent. Axes are in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Controls {
    pub throttle: f32,
    /// Positive turns counter-clockwise.
    pub turn: f32,
    pub climb: f32,
    pub fire: bool,
    /// Select a weapon slot directly.
    pub select_weapon: Option<WeaponType>,
    pub cycle_weapon: bool,
    /// Land and step out, or board again.
    pub toggle_mode: bool,
}

/// Player state shared by both modes.
#[derive(Debug, Clone)]
pub struct PlayerCraft {
    pub position: Position,
    pub health: Health,
    pub mode: PlayerMode,
    weapons: Vec<Weapon>,
    current: usize,
    /// Last commanded ground speed.
    pub speed: f32,
}

impl PlayerCraft {
    /// Spawn at the mission start, above the terrain.
    pub fn new(start: &PlayerStart, map: &Heightmap, config: &WorldConfig) -> Self {
        let floor = map.sample_height(start.x, start.y) + config.min_altitude;
        let z = start.z.unwrap_or(floor + 40.0).max(floor).min(config.max_altitude.max(floor));
        Self {
            position: Position::new(start.x, start.y, z).with_heading(normalize_angle(start.heading)),
            health: Health::new(200.0),
            mode: PlayerMode::Helicopter,
            weapons: PlayerMode::Helicopter.loadout(),
            current: 0,
            speed: 0.0,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.health.is_dead()
    }

    pub fn current_weapon(&self) -> &Weapon {
        &self.weapons[self.current]
    }

    pub fn current_weapon_mut(&mut self) -> &mut Weapon {
        &mut self.weapons[self.current]
    }

    pub fn weapons(&self) -> &[Weapon] {
        &self.weapons
    }

    pub fn cycle_weapon(&mut self) {
        self.current = (self.current + 1) % self.weapons.len();
    }

    /// Switch to `weapon` if this mode carries it.
    pub fn select_weapon(&mut self, weapon: WeaponType) -> bool {
        match self.weapons.iter().position(|w| w.weapon_type == weapon) {
            Some(i) => {
                self.current = i;
                true
            }
            None => false,
        }
    }

    pub fn take_damage(&mut self, amount: f32) {
        self.health.take_damage(amount);
    }

    /// Apply controls for one tick.
    pub fn update(&mut self, controls: &Controls, dt: f32, map: &Heightmap, config: &WorldConfig) {
        if !self.is_alive() {
            return;
        }
        if let Some(w) = controls.select_weapon {
            self.select_weapon(w);
        } else if controls.cycle_weapon {
            self.cycle_weapon();
        }
        if controls.toggle_mode {
            if let Err(surface) = self.toggle_mode(map, config) {
                log::debug!("Cannot land here: {:?}", surface);
            }
        }

        let turn = controls.turn.clamp(-1.0, 1.0);
        let throttle = controls.throttle.clamp(-1.0, 1.0);
        self.position.heading = normalize_angle(self.position.heading + turn * config.turn_speed * dt);

        match self.mode {
            PlayerMode::Helicopter => {
                self.speed = throttle * config.move_speed;
                let step = self.position.forward() * self.speed * dt;
                self.position.x += step.x;
                self.position.y += step.y;
                self.position.z += controls.climb.clamp(-1.0, 1.0) * config.climb_speed * dt;
                self.clamp_altitude(map, config);
            }
            PlayerMode::OnFoot => {
                self.speed = throttle * config.move_speed * WALK_FRACTION;
                let step = self.position.forward() * self.speed * dt;
                let (nx, ny) = (self.position.x + step.x, self.position.y + step.y);
                // No wading.
                if !water_at(map, nx, ny) {
                    self.position.x = nx;
                    self.position.y = ny;
                }
                self.position.z = map.sample_height(self.position.x, self.position.y) + EYE_HEIGHT;
            }
        }

        for weapon in &mut self.weapons {
            weapon.update(dt);
        }
    }

    /// Keep the helicopter between terrain + min altitude and the ceiling.
    fn clamp_altitude(&mut self, map: &Heightmap, config: &WorldConfig) {
        let floor = map.sample_height(self.position.x, self.position.y) + config.min_altitude;
        let ceiling = config.max_altitude.max(floor);
        self.position.z = self.position.z.max(floor).min(ceiling);
    }

    /// Land and step out (needs clear, low ground) or board and lift off.
    pub fn toggle_mode(&mut self, map: &Heightmap, config: &WorldConfig) -> Result<PlayerMode, LandingSurface> {
        let ground = map.sample_height(self.position.x, self.position.y);
        match self.mode {
            PlayerMode::Helicopter => {
                match landing_check(map, self.position.x, self.position.y, DEFAULT_MAX_LANDING_SLOPE) {
                    LandingSurface::Clear => {}
                    surface => return Err(surface),
                }
                if self.position.z - ground > config.min_altitude + LANDING_CLEARANCE {
                    // Too high to step out: settle at the minimum altitude and stay aboard.
                    self.position.z = ground + config.min_altitude;
                    return Ok(self.mode);
                }
                self.mode = PlayerMode::OnFoot;
                self.position.z = ground + EYE_HEIGHT;
            }
            PlayerMode::OnFoot => {
                self.mode = PlayerMode::Helicopter;
                self.position.z = ground + config.min_altitude;
            }
        }
        self.weapons = self.mode.loadout();
        self.current = 0;
        self.speed = 0.0;
        log::info!("Player now {:?}", self.mode);
        Ok(self.mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GRASS: [u8; 3] = [80, 130, 60];
    const WATER: [u8; 3] = [30, 72, 168];

    fn map(color: [u8; 3], h: u8) -> Heightmap {
        let shift = 6;
        let n = 1usize << (shift * 2);
        Heightmap::from_rasters(shift, vec![h; n], vec![color; n]).expect("rasters")
    }

    fn start() -> PlayerStart {
        PlayerStart {
            x: 10.0,
            y: 10.0,
            z: None,
            heading: 0.0,
        }
    }

    #[test]
    fn altitude_stays_inside_the_envelope() {
        let config = WorldConfig::with_shift(6);
        let map = map(GRASS, 100);
        let mut p = PlayerCraft::new(&start(), &map, &config);
        let dive = Controls {
            climb: -1.0,
            ..Default::default()
        };
        for _ in 0..200 {
            p.update(&dive, 0.1, &map, &config);
        }
        assert_eq!(p.position.z, 100.0 + config.min_altitude);

        let climb = Controls {
            climb: 1.0,
            ..Default::default()
        };
        for _ in 0..400 {
            p.update(&climb, 0.1, &map, &config);
        }
        assert_eq!(p.position.z, config.max_altitude);
    }

    #[test]
    fn flight_moves_along_heading_without_bounding_coordinates() {
        let config = WorldConfig::with_shift(6);
        let map = map(GRASS, 0);
        let mut p = PlayerCraft::new(&start(), &map, &config);
        let full = Controls {
            throttle: 1.0,
            ..Default::default()
        };
        for _ in 0..10 {
            p.update(&full, 0.1, &map, &config);
        }
        assert!((p.position.x - (10.0 + config.move_speed)).abs() < 1e-2);
        // Past the 64-cell map edge; stored unwrapped.
        assert!(p.position.x > 64.0);
    }

    #[test]
    fn landing_needs_dry_ground_and_low_altitude() {
        let config = WorldConfig::with_shift(6);
        let wet = map(WATER, 0);
        let mut p = PlayerCraft::new(&start(), &wet, &config);
        assert_eq!(p.toggle_mode(&wet, &config), Err(LandingSurface::Water));
        assert_eq!(p.mode, PlayerMode::Helicopter);

        let dry = map(GRASS, 20);
        let mut p = PlayerCraft::new(&start(), &dry, &config);
        // Spawned 40 above the floor: first toggle only descends.
        assert_eq!(p.toggle_mode(&dry, &config), Ok(PlayerMode::Helicopter));
        assert_eq!(p.toggle_mode(&dry, &config), Ok(PlayerMode::OnFoot));
        assert_eq!(p.position.z, 22.0);
        assert_eq!(p.current_weapon().weapon_type, WeaponType::Rifle);

        assert_eq!(p.toggle_mode(&dry, &config), Ok(PlayerMode::Helicopter));
        assert_eq!(p.current_weapon().weapon_type, WeaponType::Cannon);
    }

    #[test]
    fn weapon_selection_is_limited_to_the_loadout() {
        let config = WorldConfig::with_shift(6);
        let map = map(GRASS, 0);
        let mut p = PlayerCraft::new(&start(), &map, &config);
        assert!(p.select_weapon(WeaponType::AirToAir));
        assert!(!p.select_weapon(WeaponType::Sniper));
        assert_eq!(p.current_weapon().weapon_type, WeaponType::AirToAir);
        p.cycle_weapon();
        assert_eq!(p.current_weapon().weapon_type, WeaponType::Cannon);
    }
}
