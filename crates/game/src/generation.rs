//! Mission generation through an external, untrusted text generator.
//!
//! The generator returns whatever it likes. [`sanitize_draft`] rebuilds a clean
//! mission value from it field by field (type-checked, clamped, defaulted) so
//! the same draft always yields the same mission. Any failure, including a
//! timeout, falls back to [`default_mission`].

use std::future::Future;
use std::path::PathBuf;
use std::time::Duration;

use engine_core::WorldConfig;
use procgen::MAX_MAP_INDEX;
use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::entity::{EntityKind, TargetSelector};
use crate::mission::{
    Difficulty, Mission, Objective, PlayerStart, Site, SpawnZone, Weather, DEFAULT_REACH_RADIUS,
    DEFAULT_ZONE_COUNT, DEFAULT_ZONE_RADIUS, MAX_ZONE_COUNT,
};

pub const TIME_LIMIT_RANGE: (f32, f32) = (60.0, 3600.0);
pub const MAX_SPAWN_ZONES: usize = 16;
pub const MAX_OBJECTIVES: usize = 8;
pub const MAX_SITES: usize = 4;
const MAX_NAME_LEN: usize = 60;
const MAX_BRIEFING_LEN: usize = 1000;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("mission generator timed out after {0:?}")]
    Timeout(Duration),
    #[error("mission generator unavailable: {0}")]
    Transport(String),
    #[error("mission generator returned malformed content: {0}")]
    Malformed(String),
}

/// What the player asked for.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub mission_id: u32,
    pub map_index: u32,
    pub difficulty: Difficulty,
    /// Free-text theme passed through to the generator.
    pub theme: Option<String>,
}

impl GenerationRequest {
    pub fn new(mission_id: u32, map_index: u32, difficulty: Difficulty) -> Self {
        Self {
            mission_id,
            map_index: map_index.clamp(1, MAX_MAP_INDEX),
            difficulty,
            theme: None,
        }
    }
}

/// Raw, unvalidated mission JSON from a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct MissionDraft(pub Value);

impl MissionDraft {
    /// Pull the first JSON object out of free text (generators like to wrap
    /// their answer in prose or code fences).
    pub fn from_text(text: &str) -> Result<Self, GenerationError> {
        let start = text.find('{');
        let end = text.rfind('}');
        let body = match (start, end) {
            (Some(s), Some(e)) if s < e => &text[s..=e],
            _ => return Err(GenerationError::Malformed("no JSON object in response".into())),
        };
        let value: Value =
            serde_json::from_str(body).map_err(|e| GenerationError::Malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(GenerationError::Malformed("response is not an object".into()));
        }
        Ok(Self(value))
    }
}

/// An external mission-content source.
pub trait MissionGenerator {
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<MissionDraft, GenerationError>>;
}

/// Reads a pre-generated draft from disk; used by the headless runner.
#[derive(Debug, Clone)]
pub struct FileGenerator {
    pub path: PathBuf,
}

impl MissionGenerator for FileGenerator {
    async fn generate(&self, _request: &GenerationRequest) -> Result<MissionDraft, GenerationError> {
        let text = std::fs::read_to_string(&self.path)
            .map_err(|e| GenerationError::Transport(format!("{}: {}", self.path.display(), e)))?;
        MissionDraft::from_text(&text)
    }
}

/// Run the generator under a deadline.
pub async fn request_draft<G: MissionGenerator>(
    generator: &G,
    request: &GenerationRequest,
    timeout: Duration,
) -> Result<MissionDraft, GenerationError> {
    tokio::time::timeout(timeout, generator.generate(request))
        .await
        .map_err(|_| GenerationError::Timeout(timeout))?
}

/// Generate a playable mission. Never fails: any generator or content problem
/// yields the default mission for the requested difficulty.
pub async fn generate_mission<G: MissionGenerator>(
    generator: &G,
    request: &GenerationRequest,
    config: &WorldConfig,
    timeout: Duration,
) -> Mission {
    let draft = match request_draft(generator, request, timeout).await {
        Ok(draft) => draft,
        Err(e) => {
            log::warn!("{}; using default {} mission", e, request.difficulty);
            return default_mission(request, config);
        }
    };
    let value = sanitize_draft(&draft, request, config);
    match Mission::from_value(&value) {
        Ok(mission) => {
            log::info!("Generated mission {} '{}'", mission.mission_id, mission.name);
            mission
        }
        Err(e) => {
            log::warn!("Sanitised draft still rejected ({}); using default mission", e);
            default_mission(request, config)
        }
    }
}

/// Deterministic fallback content per difficulty.
pub fn default_mission(request: &GenerationRequest, config: &WorldConfig) -> Mission {
    let size = config.map_size_f32();
    let start = (size * 0.25, size * 0.25);
    let at = |fx: f32, fy: f32| (size * fx, size * fy);

    let (zone_specs, time_limit): (Vec<(f32, f32, Option<EntityKind>, u32)>, f32) = match request.difficulty {
        Difficulty::Easy => (
            vec![(0.5, 0.35, Some(EntityKind::Soldier), 4), (0.4, 0.55, Some(EntityKind::Tank), 3)],
            900.0,
        ),
        Difficulty::Medium => (
            vec![
                (0.5, 0.35, Some(EntityKind::Tank), 4),
                (0.4, 0.6, None, 5),
                (0.65, 0.5, Some(EntityKind::Building), 3),
            ],
            720.0,
        ),
        Difficulty::Hard => (
            vec![
                (0.5, 0.35, Some(EntityKind::Tank), 5),
                (0.4, 0.6, None, 6),
                (0.65, 0.5, Some(EntityKind::SamSite), 3),
                (0.7, 0.7, Some(EntityKind::AirAttackHeli), 2),
            ],
            600.0,
        ),
        Difficulty::Extreme => (
            vec![
                (0.5, 0.35, Some(EntityKind::Tank), 6),
                (0.4, 0.6, None, 8),
                (0.65, 0.5, Some(EntityKind::SamSite), 4),
                (0.7, 0.7, Some(EntityKind::AirFighter), 3),
                (0.3, 0.75, Some(EntityKind::AirAttackHeli), 3),
            ],
            480.0,
        ),
    };

    let spawn_zones = zone_specs
        .into_iter()
        .map(|(fx, fy, kind, count)| {
            let (x, y) = at(fx, fy);
            SpawnZone {
                x,
                y,
                radius: DEFAULT_ZONE_RADIUS,
                count,
                kind,
            }
        })
        .collect();

    let base = Site {
        id: Some("home-base".to_string()),
        x: start.0 + 30.0,
        y: start.1 + 30.0,
    };

    let mut objectives = match request.difficulty {
        Difficulty::Easy => vec![],
        Difficulty::Medium => vec![Objective::DestroyCount {
            target_type: TargetSelector::Kind(EntityKind::Tank),
            count: 3,
        }],
        Difficulty::Hard => vec![
            Objective::DestroyType {
                target_type: TargetSelector::Kind(EntityKind::SamSite),
                count: None,
            },
            Objective::ProtectTarget {
                target_id: "home-base".to_string(),
            },
        ],
        Difficulty::Extreme => vec![
            Objective::DestroyType {
                target_type: TargetSelector::Air,
                count: None,
            },
            Objective::ProtectTarget {
                target_id: "home-base".to_string(),
            },
        ],
    };
    objectives.push(Objective::DestroyAll);

    Mission {
        mission_id: request.mission_id,
        name: format!("Operation {}", request.mission_id),
        map_index: request.map_index,
        difficulty: request.difficulty,
        weather: Weather::Clear,
        player_start: PlayerStart {
            x: start.0,
            y: start.1,
            z: None,
            heading: 0.0,
        },
        airports: Vec::new(),
        bases: vec![base],
        helipads: vec![Site {
            id: None,
            x: start.0,
            y: start.1,
        }],
        spawn_zones,
        objectives,
        briefing: format!(
            "Hostile forces are massing on map {}. Clear the area and bring the crew home.",
            request.map_index
        ),
        time_limit: Some(time_limit),
    }
}

/// Rebuild a clean mission value from an untrusted draft. Identity fields
/// (id, map, difficulty) always come from the request.
pub fn sanitize_draft(draft: &MissionDraft, request: &GenerationRequest, config: &WorldConfig) -> Value {
    let fallback = default_mission(request, config);
    let empty = Map::new();
    let src = draft.0.as_object().unwrap_or(&empty);
    let size = config.map_size_f32();
    let wrap_coord = |v: f64| (v as f32).rem_euclid(size);

    let name = src
        .get("name")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| truncate(s, MAX_NAME_LEN))
        .unwrap_or_else(|| fallback.name.clone());

    let weather = src
        .get("weather")
        .and_then(Value::as_str)
        .and_then(Weather::parse)
        .unwrap_or_default();

    let player_start = src
        .get("playerStart")
        .and_then(|p| Some((p.get("x")?.as_f64()?, p.get("y")?.as_f64()?)))
        .map(|(x, y)| json!({ "x": wrap_coord(x), "y": wrap_coord(y) }))
        .unwrap_or_else(|| json!({ "x": fallback.player_start.x, "y": fallback.player_start.y }));

    let sites = |key: &str, prefix: &str| -> Vec<Value> {
        list(src, key)
            .iter()
            .filter_map(|s| Some((s.get("id"), s.get("x")?.as_f64()?, s.get("y")?.as_f64()?)))
            .take(MAX_SITES)
            .enumerate()
            .map(|(i, (id, x, y))| {
                let id = id
                    .and_then(Value::as_str)
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| truncate(s, 32))
                    .unwrap_or_else(|| format!("{prefix}-{}", i + 1));
                json!({ "id": id, "x": wrap_coord(x), "y": wrap_coord(y) })
            })
            .collect()
    };
    let airports = sites("airports", "airport");
    let bases = sites("bases", "base");
    let helipads = sites("helipads", "helipad");

    let mut spawn_zones: Vec<Value> = list(src, "spawnZones")
        .iter()
        .filter_map(|z| {
            let x = z.get("x")?.as_f64()?;
            let y = z.get("y")?.as_f64()?;
            let radius = z
                .get("radius")
                .and_then(Value::as_f64)
                .map(|r| (r as f32).clamp(20.0, 300.0))
                .unwrap_or(DEFAULT_ZONE_RADIUS);
            let count = z
                .get("count")
                .and_then(Value::as_f64)
                .map(|c| (c.round().max(0.0) as u32).min(MAX_ZONE_COUNT))
                .unwrap_or(DEFAULT_ZONE_COUNT);
            let mut zone = json!({ "x": wrap_coord(x), "y": wrap_coord(y), "radius": radius, "count": count });
            if let Some(kind) = z.get("type").and_then(Value::as_str).and_then(EntityKind::from_name) {
                // Bases and airports are placed from their own lists.
                if !matches!(kind, EntityKind::Base | EntityKind::Airport) {
                    zone["type"] = json!(kind.name());
                }
            }
            Some(zone)
        })
        .take(MAX_SPAWN_ZONES)
        .collect();
    if spawn_zones.is_empty() {
        log::warn!("Draft has no usable spawn zones; using defaults");
        spawn_zones = to_values(&fallback.spawn_zones);
    }

    let time_limit = src
        .get("timeLimit")
        .and_then(Value::as_f64)
        .map(|t| (t as f32).clamp(TIME_LIMIT_RANGE.0, TIME_LIMIT_RANGE.1))
        .or(fallback.time_limit)
        .unwrap_or(TIME_LIMIT_RANGE.1);

    let protectable: Vec<&str> = airports
        .iter()
        .chain(bases.iter())
        .filter_map(|s| s.get("id").and_then(Value::as_str))
        .collect();
    let mut objectives: Vec<Value> = list(src, "objectives")
        .iter()
        .filter_map(|o| sanitize_objective(o, &protectable, time_limit, size))
        .take(MAX_OBJECTIVES)
        .collect();
    if objectives.is_empty() {
        log::warn!("Draft has no usable objectives; using defaults");
        objectives = to_values(&fallback.objectives)
            .into_iter()
            .filter(|o| {
                // Default protect objectives point at the default base.
                o.get("type").and_then(Value::as_str) != Some("protect_target")
            })
            .collect();
    }

    let briefing = src
        .get("briefing")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| truncate(s, MAX_BRIEFING_LEN))
        .unwrap_or_else(|| fallback.briefing.clone());

    json!({
        "missionId": request.mission_id,
        "name": name,
        "mapIndex": request.map_index.clamp(1, MAX_MAP_INDEX),
        "difficulty": request.difficulty.as_str(),
        "weather": weather,
        "playerStart": player_start,
        "airports": airports,
        "bases": bases,
        "helipads": helipads,
        "spawnZones": spawn_zones,
        "objectives": objectives,
        "briefing": briefing,
        "timeLimit": time_limit,
    })
}

fn sanitize_objective(o: &Value, protectable: &[&str], time_limit: f32, size: f32) -> Option<Value> {
    let kind = o.get("type")?.as_str()?;
    let target = || {
        o.get("targetType")
            .and_then(Value::as_str)
            .and_then(TargetSelector::parse)
            .map(|t| t.to_string())
    };
    let count = || {
        o.get("count")
            .and_then(Value::as_f64)
            .map(|c| (c.round() as i64).clamp(1, MAX_ZONE_COUNT as i64))
    };
    let value = match kind {
        "destroy_all" => json!({ "type": kind }),
        "destroy_type" => match count() {
            Some(n) => json!({ "type": kind, "targetType": target()?, "count": n }),
            None => json!({ "type": kind, "targetType": target()? }),
        },
        "destroy_count" => json!({ "type": kind, "targetType": target()?, "count": count()? }),
        "reach_location" => {
            let x = o.get("x")?.as_f64()? as f32;
            let y = o.get("y")?.as_f64()? as f32;
            let radius = o
                .get("radius")
                .and_then(Value::as_f64)
                .map(|r| (r as f32).clamp(10.0, 500.0))
                .unwrap_or(DEFAULT_REACH_RADIUS);
            json!({ "type": kind, "x": x.rem_euclid(size), "y": y.rem_euclid(size), "radius": radius })
        }
        "survive_time" => {
            let duration = (o.get("duration")?.as_f64()? as f32).clamp(10.0, time_limit);
            json!({ "type": kind, "duration": duration })
        }
        "protect_target" => {
            let id = o.get("targetId")?.as_str()?;
            if !protectable.contains(&id) {
                return None;
            }
            json!({ "type": kind, "targetId": id })
        }
        _ => return None,
    };
    Some(value)
}

fn list<'a>(src: &'a Map<String, Value>, key: &str) -> &'a [Value] {
    src.get(key).and_then(Value::as_array).map(Vec::as_slice).unwrap_or(&[])
}

fn to_values<T: serde::Serialize>(items: &[T]) -> Vec<Value> {
    items.iter().filter_map(|i| serde_json::to_value(i).ok()).collect()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::validate_mission;

    struct Scripted(String);

    impl MissionGenerator for Scripted {
        async fn generate(&self, _request: &GenerationRequest) -> Result<MissionDraft, GenerationError> {
            MissionDraft::from_text(&self.0)
        }
    }

    struct Stalled;

    impl MissionGenerator for Stalled {
        async fn generate(&self, _request: &GenerationRequest) -> Result<MissionDraft, GenerationError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Err(GenerationError::Transport("unreachable".into()))
        }
    }

    fn request(difficulty: Difficulty) -> GenerationRequest {
        GenerationRequest::new(12, 4, difficulty)
    }

    #[test]
    fn default_missions_validate_for_every_difficulty() {
        let config = WorldConfig::default();
        for d in Difficulty::ALL {
            let mission = default_mission(&request(d), &config);
            let value = serde_json::to_value(&mission).expect("serialize");
            let report = validate_mission(&value);
            assert!(report.valid, "{d}: {:?}", report.errors);
            assert_eq!(mission.difficulty, d);
            assert!(mission.objectives.contains(&Objective::DestroyAll));
        }
    }

    #[test]
    fn draft_text_extracts_fenced_json() {
        let draft = MissionDraft::from_text("Sure! ```json\n{\"name\": \"Dusk\"}\n``` Enjoy.").expect("object");
        assert_eq!(draft.0["name"], "Dusk");
        assert!(matches!(MissionDraft::from_text("no mission today"), Err(GenerationError::Malformed(_))));
        assert!(matches!(MissionDraft::from_text("{ broken"), Err(GenerationError::Malformed(_))));
    }

    #[test]
    fn sanitize_clamps_every_field() {
        let config = WorldConfig::default();
        let zones: Vec<Value> = (0..30)
            .map(|i| json!({ "x": -10 - i, "y": 5000, "count": 500, "radius": 1 }))
            .collect();
        let draft = MissionDraft(json!({
            "missionId": "x",
            "name": "",
            "difficulty": "legendary",
            "weather": "volcanic",
            "playerStart": { "x": 1500, "y": -24 },
            "bases": [{ "id": "hq", "x": 10, "y": 10 }],
            "spawnZones": zones,
            "objectives": [
                { "type": "destroy_count", "targetType": "TANK", "count": 999 },
                { "type": "protect_target", "targetId": "ghost" },
                { "type": "protect_target", "targetId": "hq" },
                { "type": "survive_time", "duration": 99999 },
                { "type": "teleport" }
            ],
            "timeLimit": 5
        }));
        let value = sanitize_draft(&draft, &request(Difficulty::Hard), &config);
        let report = validate_mission(&value);
        assert!(report.valid, "{:?}", report.errors);
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);

        let mission = Mission::from_value(&value).expect("parse");
        assert_eq!(mission.mission_id, 12);
        assert_eq!(mission.difficulty, Difficulty::Hard);
        assert_eq!(mission.weather, Weather::Clear);
        assert_eq!(mission.name, "Operation 12");
        assert_eq!(mission.time_limit, Some(60.0));
        assert_eq!(mission.player_start.x, 1500.0 - 1024.0);
        assert_eq!(mission.player_start.y, 1000.0);
        assert_eq!(mission.spawn_zones.len(), MAX_SPAWN_ZONES);
        assert!(mission.spawn_zones.iter().all(|z| z.count == MAX_ZONE_COUNT && z.radius == 20.0));
        assert!(mission.spawn_zones.iter().all(|z| (0.0..1024.0).contains(&z.x)));
        assert_eq!(
            mission.objectives,
            vec![
                Objective::DestroyCount {
                    target_type: TargetSelector::Kind(EntityKind::Tank),
                    count: MAX_ZONE_COUNT,
                },
                Objective::ProtectTarget { target_id: "hq".into() },
                Objective::SurviveTime { duration: 60.0 },
            ]
        );
    }

    #[test]
    fn sanitize_is_deterministic_and_fills_gaps() {
        let config = WorldConfig::default();
        let draft = MissionDraft(json!({ "name": "Quiet Valley" }));
        let a = sanitize_draft(&draft, &request(Difficulty::Easy), &config);
        let b = sanitize_draft(&draft, &request(Difficulty::Easy), &config);
        assert_eq!(a, b);
        let mission = Mission::from_value(&a).expect("parse");
        assert_eq!(mission.name, "Quiet Valley");
        assert_eq!(mission.spawn_zones.len(), 2);
        assert_eq!(mission.objectives, vec![Objective::DestroyAll]);
    }

    #[tokio::test]
    async fn generate_uses_sanitised_draft() {
        let generator = Scripted(
            r#"{"name": "Iron Rain", "weather": "storm", "objectives": [{"type": "destroy_all"}]}"#.into(),
        );
        let mission = generate_mission(
            &generator,
            &request(Difficulty::Medium),
            &WorldConfig::default(),
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(mission.name, "Iron Rain");
        assert_eq!(mission.weather, Weather::Storm);
    }

    #[tokio::test]
    async fn timeout_and_garbage_fall_back_to_default() {
        let config = WorldConfig::default();
        let req = request(Difficulty::Extreme);
        let expected = default_mission(&req, &config);

        let err = request_draft(&Stalled, &req, Duration::from_millis(20)).await;
        assert!(matches!(err, Err(GenerationError::Timeout(_))));

        let mission = generate_mission(&Stalled, &req, &config, Duration::from_millis(20)).await;
        assert_eq!(mission, expected);

        let mission = generate_mission(&Scripted("I cannot help with that".into()), &req, &config, Duration::from_secs(1)).await;
        assert_eq!(mission, expected);
    }
}
