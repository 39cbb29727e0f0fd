//! Process-wide world configuration.
//!
//! Built once at startup (defaults, optionally overridden from `config.ron` by the
//! game crate) and handed around by shared reference. Nothing mutates it after
//! [`WorldConfig::validate`] succeeds.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors for a world configuration that breaks its invariants.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("map size {map_size} does not equal 1 << map shift {map_shift}")]
    MapSizeMismatch { map_size: u32, map_shift: u32 },
    #[error("map shift {0} out of range (4..=14)")]
    MapShiftOutOfRange(u32),
    #[error("altitude bounds inverted: min {min} >= max {max}")]
    AltitudeBounds { min: f32, max: f32 },
    #[error("fog start {fog_start} must lie in [0, render distance {render_distance})")]
    FogStart { fog_start: f32, render_distance: f32 },
}

/// Immutable world parameters shared by renderer and gameplay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Edge length of the (square, toroidal) map in cells. Always a power of two.
    pub map_size: u32,
    /// log2 of `map_size`; `x & (map_size - 1)` replaces modulo.
    pub map_shift: u32,
    /// Farthest distance the raycaster marches and entities stay visible.
    pub render_distance: f32,
    /// Distance at which terrain starts blending toward the fog color.
    pub fog_start: f32,
    /// Minimum height above terrain for the helicopter.
    pub min_altitude: f32,
    /// Absolute ceiling.
    pub max_altitude: f32,
    /// Forward speed at full throttle (world units per second).
    pub move_speed: f32,
    /// Turn rate (radians per second).
    pub turn_speed: f32,
    /// Climb rate (world units per second).
    pub climb_speed: f32,
    /// Hostile units requested when a mission does not say otherwise.
    pub target_count: u32,
    /// Radar display radius in pixels.
    pub radar_size: f32,
    /// World distance covered by the radar radius.
    pub radar_range: f32,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self::with_shift(10)
    }
}

impl WorldConfig {
    /// Default configuration for a map of `1 << map_shift` cells per side.
    pub fn with_shift(map_shift: u32) -> Self {
        Self {
            map_size: 1 << map_shift,
            map_shift,
            render_distance: 800.0,
            fog_start: 500.0,
            min_altitude: 20.0,
            max_altitude: 600.0,
            move_speed: 120.0,
            turn_speed: 1.6,
            climb_speed: 60.0,
            target_count: 12,
            radar_size: 60.0,
            radar_range: 600.0,
        }
    }

    /// Check the invariants every consumer relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(4..=14).contains(&self.map_shift) {
            return Err(ConfigError::MapShiftOutOfRange(self.map_shift));
        }
        if self.map_size != 1 << self.map_shift {
            return Err(ConfigError::MapSizeMismatch {
                map_size: self.map_size,
                map_shift: self.map_shift,
            });
        }
        if self.min_altitude >= self.max_altitude {
            return Err(ConfigError::AltitudeBounds {
                min: self.min_altitude,
                max: self.max_altitude,
            });
        }
        if self.fog_start < 0.0 || self.fog_start >= self.render_distance {
            return Err(ConfigError::FogStart {
                fog_start: self.fog_start,
                render_distance: self.render_distance,
            });
        }
        Ok(())
    }

    /// Bit mask that maps any integer cell coordinate onto the map.
    #[inline]
    pub fn map_mask(&self) -> u32 {
        self.map_size - 1
    }

    /// Map size as a float, for the wrapped distance helpers.
    #[inline]
    pub fn map_size_f32(&self) -> f32 {
        self.map_size as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = WorldConfig::default();
        assert_eq!(config.map_size, 1024);
        assert_eq!(config.map_mask(), 1023);
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn mismatched_size_is_rejected() {
        let config = WorldConfig {
            map_size: 1000,
            ..WorldConfig::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::MapSizeMismatch {
                map_size: 1000,
                map_shift: 10
            })
        );
    }

    #[test]
    fn fog_must_start_before_render_distance() {
        let config = WorldConfig {
            fog_start: 900.0,
            ..WorldConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::FogStart { .. })));
    }
}
