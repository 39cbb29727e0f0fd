//! Game configuration (world, view, assets, generation). Loaded from config.ron at startup.

use engine_core::WorldConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::combat::{DamageEntry, DamageTable};

/// Persistent game settings. Loaded from `config.ron` in the current directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    /// World parameters; any field left out keeps its default.
    #[serde(default)]
    pub world: WorldConfig,
    /// Rendered frame width in pixels.
    #[serde(default = "default_screen_width")]
    pub screen_width: u32,
    /// Rendered frame height in pixels.
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    /// Directory holding `color{N}.png` / `height{N}.png`.
    #[serde(default = "default_asset_dir")]
    pub asset_dir: PathBuf,
    /// Seed for spawning, AI and procedural maps.
    #[serde(default)]
    pub seed: u64,
    /// Deadline for the external mission generator.
    #[serde(default = "default_generation_timeout")]
    pub generation_timeout_secs: f32,
    /// Simulation rate.
    #[serde(default = "default_fixed_rate")]
    pub fixed_rate_hz: f64,
    #[serde(default = "default_callsign")]
    pub callsign: String,
    /// Balance tweaks applied over the standard damage table.
    #[serde(default)]
    pub damage_overrides: Vec<DamageEntry>,
}

fn default_screen_width() -> u32 {
    320
}
fn default_screen_height() -> u32 {
    200
}
fn default_asset_dir() -> PathBuf {
    PathBuf::from("maps")
}
fn default_generation_timeout() -> f32 {
    15.0
}
fn default_fixed_rate() -> f64 {
    30.0
}
fn default_callsign() -> String {
    "VIPER".to_string()
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            world: WorldConfig::default(),
            screen_width: default_screen_width(),
            screen_height: default_screen_height(),
            asset_dir: default_asset_dir(),
            seed: 0,
            generation_timeout_secs: default_generation_timeout(),
            fixed_rate_hz: default_fixed_rate(),
            callsign: default_callsign(),
            damage_overrides: Vec::new(),
        }
    }
}

impl GameConfig {
    /// Load config from `config.ron`. If the file is missing or invalid, returns default config.
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if let Ok(data) = std::fs::read_to_string(path) {
            match Self::from_ron_str(&data) {
                Ok(c) => return c,
                Err(e) => log::warn!("Invalid config at {:?}: {}, using defaults", path, e),
            }
        }
        Self::default()
    }

    pub fn from_ron_str(data: &str) -> Result<Self, ron::error::SpannedError> {
        let mut config: Self = ron::from_str(data)?;
        // Keep the derived size in step with the shift.
        config.world.map_size = 1 << config.world.map_shift.min(31);
        Ok(config)
    }

    /// Clamped to 0.1..=300 seconds; the default when not a finite number.
    pub fn generation_timeout(&self) -> Duration {
        let secs = if self.generation_timeout_secs.is_finite() {
            self.generation_timeout_secs.clamp(0.1, 300.0)
        } else {
            default_generation_timeout()
        };
        Duration::from_secs_f32(secs)
    }

    pub fn damage_table(&self) -> DamageTable {
        DamageTable::standard().with_overrides(self.damage_overrides.iter().copied())
    }
}

fn config_path() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join("config.ron")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::TargetType;
    use crate::weapons::WeaponType;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = GameConfig::from_ron_str("(world: (map_shift: 9, radar_range: 400.0), seed: 42)").expect("parse");
        assert_eq!(config.seed, 42);
        assert_eq!(config.world.map_shift, 9);
        assert_eq!(config.world.map_size, 512);
        assert_eq!(config.world.radar_range, 400.0);
        assert_eq!(config.world.render_distance, 800.0);
        assert_eq!(config.screen_width, 320);
        assert!(config.world.validate().is_ok());
    }

    #[test]
    fn overrides_patch_the_standard_table() {
        let config = GameConfig::from_ron_str(
            "(damage_overrides: [(weapon: CANNON, target: TANK, multiplier: 2.0)])",
        )
        .expect("parse");
        let table = config.damage_table();
        assert_eq!(table.multiplier(WeaponType::Cannon, TargetType::Tank), 2.0);
        assert_eq!(table.multiplier(WeaponType::Sniper, TargetType::Soldier), 3.0);
    }

    #[test]
    fn bad_file_falls_back_to_defaults() {
        let path = std::env::temp_dir().join(format!("voxelstrike-config-{}.ron", std::process::id()));
        std::fs::write(&path, "(screen_width: \"wide\")").expect("write");
        assert_eq!(GameConfig::load_from(&path), GameConfig::default());
        let _ = std::fs::remove_file(&path);

        assert_eq!(GameConfig::load_from(Path::new("/nonexistent/config.ron")), GameConfig::default());
    }

    #[test]
    fn generation_timeout_is_always_usable() {
        let with = |secs: f32| GameConfig {
            generation_timeout_secs: secs,
            ..Default::default()
        };
        assert_eq!(with(f32::NAN).generation_timeout(), Duration::from_secs(15));
        assert_eq!(with(f32::INFINITY).generation_timeout(), Duration::from_secs(15));
        assert_eq!(with(-3.0).generation_timeout(), Duration::from_secs_f32(0.1));
        assert_eq!(with(1e9).generation_timeout(), Duration::from_secs(300));
    }

    #[test]
    fn round_trips_through_ron() {
        let config = GameConfig {
            seed: 9,
            ..Default::default()
        };
        let text = ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::default()).expect("serialise");
        assert_eq!(GameConfig::from_ron_str(&text).expect("parse"), config);
    }
}
