//! Typed mission data.
//!
//! Missions arrive as JSON (authored files or generated drafts). The raw value is
//! checked by [`crate::validation`] first; only then is it parsed into a
//! [`Mission`]. Parsing is lenient about anything validation merely warns on:
//! unknown difficulty or weather fall back to defaults, unknown objective types
//! are dropped, odd spawn counts are clamped.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::entity::{EntityKind, TargetSelector};
use crate::validation::validate_mission;

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("failed to read mission {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("mission is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("mission failed validation: {}", .errors.join("; "))]
    Invalid { errors: Vec<String> },
}

/// Mission difficulty. `normal` and anything unrecognised mean [`Difficulty::Medium`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
    Extreme,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Easy,
        Difficulty::Medium,
        Difficulty::Hard,
        Difficulty::Extreme,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
            Difficulty::Extreme => "extreme",
        }
    }

    /// Strict parse: canonical names plus the `normal` alias.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "easy" => Some(Difficulty::Easy),
            "medium" | "normal" => Some(Difficulty::Medium),
            "hard" => Some(Difficulty::Hard),
            "extreme" => Some(Difficulty::Extreme),
            _ => None,
        }
    }

    /// Damage multiplier applied to hostile fire.
    pub fn enemy_damage_scale(&self) -> f32 {
        match self {
            Difficulty::Easy => 0.6,
            Difficulty::Medium => 1.0,
            Difficulty::Hard => 1.4,
            Difficulty::Extreme => 2.0,
        }
    }
}

/// Total function: missing, `normal` and unknown names all give medium.
pub fn normalize_difficulty(name: Option<&str>) -> Difficulty {
    name.and_then(Difficulty::parse).unwrap_or_default()
}

impl From<Value> for Difficulty {
    fn from(value: Value) -> Self {
        normalize_difficulty(value.as_str())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "Value")]
pub enum Weather {
    #[default]
    Clear,
    Overcast,
    Rain,
    Fog,
    Storm,
    Snow,
}

impl Weather {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "clear" => Some(Weather::Clear),
            "overcast" | "cloudy" => Some(Weather::Overcast),
            "rain" => Some(Weather::Rain),
            "fog" => Some(Weather::Fog),
            "storm" => Some(Weather::Storm),
            "snow" => Some(Weather::Snow),
            _ => None,
        }
    }

    /// Fraction of the configured render distance visible in this weather.
    pub fn visibility(&self) -> f32 {
        match self {
            Weather::Clear => 1.0,
            Weather::Overcast => 0.9,
            Weather::Rain => 0.75,
            Weather::Snow => 0.7,
            Weather::Storm => 0.6,
            Weather::Fog => 0.45,
        }
    }
}

impl From<Value> for Weather {
    fn from(value: Value) -> Self {
        value.as_str().and_then(Weather::parse).unwrap_or_default()
    }
}

/// Where the player begins.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerStart {
    pub x: f32,
    pub y: f32,
    /// Altitude; terrain-relative default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_opt_f32")]
    pub z: Option<f32>,
    /// Radians; 0 when absent or not a number.
    #[serde(default, deserialize_with = "lenient_f32")]
    pub heading: f32,
}

/// A base, airport or helipad.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub id: Option<String>,
    pub x: f32,
    pub y: f32,
}

pub const DEFAULT_ZONE_RADIUS: f32 = 80.0;
pub const DEFAULT_ZONE_COUNT: u32 = 4;
pub const DEFAULT_REACH_RADIUS: f32 = 40.0;
/// Most units one zone may ask for.
pub const MAX_ZONE_COUNT: u32 = 40;

/// Area hostiles are scattered around at mission start.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpawnZone {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_zone_radius", deserialize_with = "lenient_radius")]
    pub radius: f32,
    #[serde(default = "default_zone_count", deserialize_with = "lenient_count")]
    pub count: u32,
    /// Single kind to spawn; a difficulty-based mix when absent.
    #[serde(
        rename = "type",
        alias = "entityType",
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_kind"
    )]
    pub kind: Option<EntityKind>,
}

fn default_zone_radius() -> f32 {
    DEFAULT_ZONE_RADIUS
}

fn default_zone_count() -> u32 {
    DEFAULT_ZONE_COUNT
}

fn default_reach_radius() -> f32 {
    DEFAULT_REACH_RADIUS
}

/// A typed mission win condition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Objective {
    /// No hostile left alive.
    DestroyAll,
    /// No hostile of the type left alive, or `count` of them killed.
    #[serde(rename_all = "camelCase")]
    DestroyType {
        target_type: TargetSelector,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        count: Option<u32>,
    },
    /// `count` kills of the type.
    #[serde(rename_all = "camelCase")]
    DestroyCount { target_type: TargetSelector, count: u32 },
    /// Fly within `radius` of a point.
    ReachLocation {
        x: f32,
        y: f32,
        #[serde(default = "default_reach_radius")]
        radius: f32,
    },
    /// Stay alive for `duration` seconds.
    SurviveTime { duration: f32 },
    /// Keep a labelled base or airport standing.
    #[serde(rename_all = "camelCase")]
    ProtectTarget { target_id: String },
}

impl Objective {
    pub const TYPE_NAMES: [&'static str; 6] = [
        "destroy_all",
        "destroy_type",
        "destroy_count",
        "reach_location",
        "survive_time",
        "protect_target",
    ];

    /// HUD line.
    pub fn describe(&self) -> String {
        match self {
            Objective::DestroyAll => "Destroy all hostile forces".to_string(),
            Objective::DestroyType { target_type, count: Some(n) } => {
                format!("Destroy {} {}", n, target_type)
            }
            Objective::DestroyType { target_type, count: None } => {
                format!("Destroy every {}", target_type)
            }
            Objective::DestroyCount { target_type, count } => format!("Destroy {} {}", count, target_type),
            Objective::ReachLocation { x, y, .. } => format!("Reach waypoint ({:.0}, {:.0})", x, y),
            Objective::SurviveTime { duration } => format!("Survive for {:.0}s", duration),
            Objective::ProtectTarget { target_id } => format!("Protect {}", target_id),
        }
    }
}

/// A parsed, validated mission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mission {
    #[serde(deserialize_with = "lenient_u32")]
    pub mission_id: u32,
    pub name: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub map_index: u32,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub weather: Weather,
    pub player_start: PlayerStart,
    #[serde(default, deserialize_with = "lenient_list")]
    pub airports: Vec<Site>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub bases: Vec<Site>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub helipads: Vec<Site>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub spawn_zones: Vec<SpawnZone>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub objectives: Vec<Objective>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub briefing: String,
    /// Seconds; no limit when absent.
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_time_limit")]
    pub time_limit: Option<f32>,
}

impl Mission {
    /// Validate then parse a JSON value.
    pub fn from_value(value: &Value) -> Result<Self, MissionError> {
        let report = validate_mission(value);
        for warning in &report.warnings {
            log::warn!("mission: {}", warning);
        }
        if !report.valid {
            return Err(MissionError::Invalid { errors: report.errors });
        }
        Ok(serde_json::from_value(value.clone())?)
    }

    pub fn from_json(text: &str) -> Result<Self, MissionError> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn load(path: &Path) -> Result<Self, MissionError> {
        let text = std::fs::read_to_string(path).map_err(|source| MissionError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mission = Self::from_json(&text)?;
        log::info!("Loaded mission {} '{}' from {}", mission.mission_id, mission.name, path.display());
        Ok(mission)
    }

    pub fn to_json(&self) -> Result<String, MissionError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Hostiles the spawn zones ask for.
    pub fn requested_hostiles(&self) -> u32 {
        self.spawn_zones.iter().map(|z| z.count).sum()
    }
}

fn lenient_u32<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_f64().map(|n| n.round().clamp(0.0, u32::MAX as f64) as u32).unwrap_or(0))
}

fn lenient_count<'de, D: Deserializer<'de>>(d: D) -> Result<u32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_f64()
        .map(|n| n.round().clamp(0.0, MAX_ZONE_COUNT as f64) as u32)
        .unwrap_or(DEFAULT_ZONE_COUNT))
}

fn lenient_radius<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_f64()
        .filter(|r| r.is_finite() && *r >= 0.0)
        .map(|r| r as f32)
        .unwrap_or(DEFAULT_ZONE_RADIUS))
}

fn lenient_f32<'de, D: Deserializer<'de>>(d: D) -> Result<f32, D::Error> {
    Ok(lenient_opt_f32(d)?.unwrap_or(0.0))
}

fn lenient_opt_f32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_f64().map(|n| n as f32).filter(|n| n.is_finite()))
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::String(s) => s,
        _ => String::new(),
    })
}

fn lenient_kind<'de, D: Deserializer<'de>>(d: D) -> Result<Option<EntityKind>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_str().and_then(EntityKind::from_name))
}

fn lenient_id<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(match v {
        Value::String(s) if !s.is_empty() => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_time_limit<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f32>, D::Error> {
    let v = Value::deserialize(d)?;
    Ok(v.as_f64().filter(|t| *t > 0.0).map(|t| t as f32))
}

/// Parse each array item on its own, dropping the ones that do not fit.
fn lenient_list<'de, D, T>(d: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = match Value::deserialize(d)? {
        Value::Array(items) => items,
        _ => return Ok(Vec::new()),
    };
    Ok(raw
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<T>(item) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::warn!("Dropping unusable mission entry: {}", e);
                None
            }
        })
        .collect())
}
