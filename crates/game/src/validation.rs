//! Pre-play checks on raw mission JSON.
//!
//! Errors block a mission; warnings only describe what the parser will default
//! or drop. Nothing here panics on any input.

use std::collections::HashMap;

use engine_core::WorldConfig;
use procgen::MAX_MAP_INDEX;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::entity::{EntityKind, TargetSelector};
use crate::mission::{Difficulty, Objective, Weather, MAX_ZONE_COUNT};

/// Outcome of validating one mission or a mission set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// `errors.is_empty()`.
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    fn finish(mut self) -> Self {
        self.valid = self.errors.is_empty();
        self
    }
}

/// Validate against the default world size.
pub fn validate_mission(value: &Value) -> ValidationReport {
    validate_mission_for(value, &WorldConfig::default())
}

/// Validate one mission; `config` supplies the map bounds.
pub fn validate_mission_for(value: &Value, config: &WorldConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let Some(root) = value.as_object() else {
        report.error("mission must be a JSON object");
        return report.finish();
    };

    check_identity(root, &mut report);
    check_player_start(root, config.map_size as f64, &mut report);
    check_spawn_zones(root, &mut report);
    check_enums(root, &mut report);
    check_objectives(root, &mut report);

    if let Some(briefing) = root.get("briefing").filter(|b| !b.is_string()) {
        report.warn(format!("briefing {briefing} is not a string and will be left empty"));
    }

    if let Some(limit) = root.get("timeLimit") {
        if !limit.as_f64().is_some_and(|t| t > 0.0) {
            report.warn("timeLimit should be a positive number of seconds; mission will have no limit");
        }
    }

    report.finish()
}

/// Validate every mission and reject duplicate `missionId`s.
pub fn validate_mission_set(missions: &[Value], config: &WorldConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen: HashMap<String, usize> = HashMap::new();

    for (i, mission) in missions.iter().enumerate() {
        let single = validate_mission_for(mission, config);
        report.errors.extend(single.errors.into_iter().map(|e| format!("mission[{i}]: {e}")));
        report.warnings.extend(single.warnings.into_iter().map(|w| format!("mission[{i}]: {w}")));

        if let Some(id) = mission.get("missionId").filter(|v| v.is_number()) {
            let key = id.to_string();
            if let Some(first) = seen.get(&key) {
                report.error(format!("mission[{i}]: missionId {key} duplicates mission[{first}]"));
            } else {
                seen.insert(key, i);
            }
        }
    }

    report.finish()
}

fn check_identity(root: &Map<String, Value>, report: &mut ValidationReport) {
    match root.get("missionId") {
        None => report.error("missionId is required"),
        Some(id) => match id.as_f64() {
            None => report.error("missionId must be a number"),
            Some(n) if n.fract() != 0.0 || !(1.0..=99.0).contains(&n) => {
                report.warn(format!("missionId {n} is outside the usual 1-99 range"))
            }
            Some(_) => {}
        },
    }

    let name_ok = root
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if !name_ok {
        report.error("name must be a non-empty string");
    }

    match root.get("mapIndex").and_then(Value::as_f64) {
        Some(n) if n >= 1.0 => {
            if n > MAX_MAP_INDEX as f64 {
                report.warn(format!("mapIndex {n} is past the last shipped map ({MAX_MAP_INDEX})"));
            }
        }
        _ => report.error("mapIndex must be a number >= 1"),
    }
}

fn check_player_start(root: &Map<String, Value>, map_size: f64, report: &mut ValidationReport) {
    let Some(start) = root.get("playerStart").and_then(Value::as_object) else {
        report.error("playerStart is required");
        return;
    };
    let mut coords = [0.0; 2];
    for (slot, axis) in coords.iter_mut().zip(["x", "y"]) {
        match start.get(axis).and_then(Value::as_f64) {
            Some(v) => *slot = v,
            None => {
                report.error(format!("playerStart.{axis} must be a number"));
                return;
            }
        }
    }
    if coords.iter().any(|c| !(0.0..=map_size).contains(c)) {
        report.warn(format!(
            "playerStart ({}, {}) lies outside the map bounds [0, {map_size}]",
            coords[0], coords[1]
        ));
    }
    if let Some(heading) = start.get("heading").filter(|h| !h.is_number()) {
        report.warn(format!("playerStart.heading {heading} is not a number; 0 will be used"));
    }
    if let Some(z) = start.get("z").filter(|z| !z.is_number()) {
        report.warn(format!("playerStart.z {z} is not a number; terrain height will be used"));
    }
}

fn check_spawn_zones(root: &Map<String, Value>, report: &mut ValidationReport) {
    let zones = match root.get("spawnZones") {
        None => return,
        Some(Value::Array(zones)) => zones,
        Some(_) => {
            report.error("spawnZones must be an array");
            return;
        }
    };
    for (i, zone) in zones.iter().enumerate() {
        for axis in ["x", "y"] {
            if !zone.get(axis).is_some_and(Value::is_number) {
                report.error(format!("spawnZones[{i}].{axis} must be a number"));
            }
        }
        if let Some(count) = zone.get("count") {
            match count.as_f64() {
                Some(c) if c > MAX_ZONE_COUNT as f64 => {
                    report.warn(format!("spawnZones[{i}].count {c} is capped at {MAX_ZONE_COUNT}"))
                }
                Some(c) if c >= 0.0 => {}
                _ => report.warn(format!("spawnZones[{i}].count must be a non-negative number")),
            }
        }
        if let Some(radius) = zone.get("radius") {
            if !radius.as_f64().is_some_and(|r| r >= 0.0) {
                report.warn(format!("spawnZones[{i}].radius must be a non-negative number; the default will be used"));
            }
        }
        let kind = zone.get("type").or_else(|| zone.get("entityType"));
        if let Some(kind) = kind {
            if !kind.as_str().is_some_and(|k| EntityKind::from_name(k).is_some()) {
                report.warn(format!("spawnZones[{i}]: unknown unit type {kind}, a mixed group will spawn"));
            }
        }
    }
}

fn check_enums(root: &Map<String, Value>, report: &mut ValidationReport) {
    if let Some(d) = root.get("difficulty") {
        if d.as_str().and_then(Difficulty::parse).is_none() {
            report.warn(format!("unknown difficulty {d}, using medium"));
        }
    }
    if let Some(w) = root.get("weather") {
        if w.as_str().and_then(Weather::parse).is_none() {
            report.warn(format!("unknown weather {w}, using clear"));
        }
    }
}

fn check_objectives(root: &Map<String, Value>, report: &mut ValidationReport) {
    let objectives = match root.get("objectives") {
        None => return,
        Some(Value::Array(list)) => list,
        Some(_) => {
            report.warn("objectives must be an array; destroy_all will be used");
            return;
        }
    };
    for (i, objective) in objectives.iter().enumerate() {
        let Some(kind) = objective.get("type").and_then(Value::as_str) else {
            report.warn(format!("objectives[{i}] has no type and will be ignored"));
            continue;
        };
        if !Objective::TYPE_NAMES.contains(&kind) {
            report.warn(format!("objectives[{i}]: unknown objective type '{kind}' will be ignored"));
            continue;
        }
        if let Some(target) = objective.get("targetType") {
            if !target.as_str().is_some_and(|t| TargetSelector::parse(t).is_some()) {
                report.warn(format!("objectives[{i}]: unknown targetType {target}"));
                continue;
            }
        }
        if let Err(e) = serde_json::from_value::<Objective>(objective.clone()) {
            report.warn(format!("objectives[{i}] ({kind}) is malformed and will be ignored: {e}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mission::tests::sample_mission;
    use serde_json::json;

    #[test]
    fn sample_mission_is_valid() {
        let report = validate_mission(&sample_mission());
        assert!(report.valid, "{:?}", report);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty(), "{:?}", report.warnings);
    }

    #[test]
    fn missing_mission_id_is_an_error() {
        let mut value = sample_mission();
        value.as_object_mut().expect("object").remove("missionId");
        let report = validate_mission(&value);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("missionId")));

        value["missionId"] = json!("seven");
        let report = validate_mission(&value);
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("missionId")));
    }

    #[test]
    fn unknown_difficulty_is_only_a_warning() {
        let mut value = sample_mission();
        value["difficulty"] = json!("impossible");
        let report = validate_mission(&value);
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("difficulty")));

        value["difficulty"] = json!("normal");
        assert!(validate_mission(&value).warnings.is_empty());
    }

    #[test]
    fn field_errors_and_zone_warnings() {
        let value = json!({
            "missionId": 3,
            "name": "  ",
            "mapIndex": 0,
            "playerStart": { "x": "left", "y": 10 },
            "spawnZones": [{ "x": 10 }, { "x": 1, "y": 2, "count": -1 }],
            "weather": "hail"
        });
        let report = validate_mission(&value);
        assert!(!report.valid);
        for needle in ["name", "mapIndex", "playerStart.x", "spawnZones[0].y"] {
            assert!(report.errors.iter().any(|e| e.contains(needle)), "missing {needle}: {:?}", report.errors);
        }
        assert!(report.warnings.iter().any(|w| w.contains("spawnZones[1].count")));
        assert!(report.warnings.iter().any(|w| w.contains("weather")));
    }

    #[test]
    fn non_object_and_odd_shapes_never_panic() {
        for value in [json!(null), json!(42), json!([1, 2]), json!("mission")] {
            let report = validate_mission(&value);
            assert!(!report.valid);
        }
        let mut value = sample_mission();
        value["spawnZones"] = json!({ "x": 1 });
        value["objectives"] = json!([{ "type": "capture_flag" }, { "type": "destroy_count" }, 5]);
        let report = validate_mission(&value);
        assert!(report.errors.iter().any(|e| e.contains("spawnZones")));
        assert!(report.warnings.iter().any(|w| w.contains("capture_flag")));
        assert!(report.warnings.iter().any(|w| w.contains("objectives[1]")));
        assert!(report.warnings.iter().any(|w| w.contains("objectives[2]")));
    }

    #[test]
    fn out_of_range_values_warn() {
        let mut value = sample_mission();
        value["missionId"] = json!(140);
        value["playerStart"] = json!({ "x": -5, "y": 20 });
        let report = validate_mission_for(&value, &WorldConfig::with_shift(10));
        assert!(report.valid);
        assert!(report.warnings.iter().any(|w| w.contains("1-99")));
        assert!(report.warnings.iter().any(|w| w.contains("playerStart")));
    }

    #[test]
    fn odd_field_types_warn_and_still_load() {
        use crate::mission::{Mission, MAX_ZONE_COUNT};

        let cases = [
            ("briefing", json!(null)),
            ("briefing", json!(42)),
            ("heading", json!("north")),
            ("z", json!([1, 2])),
            ("radius", json!("wide")),
            ("count", json!(1_000_000)),
        ];
        for (field, odd) in cases {
            let mut value = sample_mission();
            match field {
                "briefing" => value["briefing"] = odd,
                "heading" | "z" => value["playerStart"][field] = odd,
                _ => value["spawnZones"][0][field] = odd,
            }
            let report = validate_mission(&value);
            assert!(report.valid, "{field}: {:?}", report.errors);
            assert!(report.warnings.iter().any(|w| w.contains(field)), "{field}: {:?}", report.warnings);

            let mission = Mission::from_value(&value).unwrap_or_else(|e| panic!("{field}: {e}"));
            assert_eq!(mission.spawn_zones.len(), 2, "{field}");
            match field {
                "briefing" => assert!(mission.briefing.is_empty()),
                "heading" => assert_eq!(mission.player_start.heading, 0.0),
                "z" => assert_eq!(mission.player_start.z, None),
                "radius" => assert_eq!(mission.spawn_zones[0].radius, crate::mission::DEFAULT_ZONE_RADIUS),
                _ => assert_eq!(mission.spawn_zones[0].count, MAX_ZONE_COUNT),
            }
        }
    }

    #[test]
    fn mission_set_rejects_duplicate_ids() {
        let a = sample_mission();
        let mut b = sample_mission();
        b["name"] = json!("Copy");
        let mut c = sample_mission();
        c["missionId"] = json!(8);
        let report = validate_mission_set(&[a, b, c], &WorldConfig::default());
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("mission[1]"));
    }
}
