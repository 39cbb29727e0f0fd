//! Mission and objective state machine.
//!
//! Objectives go `Pending → InProgress → {Satisfied | Failed}`; the mission
//! goes `Briefing → Playing → {Victory | Defeat}`. Every terminal state is
//! final. Progress only changes inside [`MissionRun::record_kill`] and
//! [`MissionRun::update`], both called from the simulation tick.

use std::collections::HashMap;
use std::fmt;

use engine_core::{distance_2d_wrapped, Faction, Vec2};
use serde::Serialize;

use crate::combat::KillEvent;
use crate::entity::{Census, EntityKind, TargetSelector};
use crate::mission::{Mission, Objective};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveStatus {
    Pending,
    InProgress,
    Satisfied,
    Failed,
}

impl ObjectiveStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ObjectiveStatus::Satisfied | ObjectiveStatus::Failed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissionPhase {
    Briefing,
    Playing,
    Victory,
    Defeat,
}

impl MissionPhase {
    pub fn is_over(&self) -> bool {
        matches!(self, MissionPhase::Victory | MissionPhase::Defeat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DefeatReason {
    /// Index of the objective that failed.
    ObjectiveFailed(usize),
    PlayerDestroyed,
    TimeExpired,
}

impl fmt::Display for DefeatReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefeatReason::ObjectiveFailed(i) => write!(f, "objective {} failed", i + 1),
            DefeatReason::PlayerDestroyed => f.write_str("player destroyed"),
            DefeatReason::TimeExpired => f.write_str("time expired"),
        }
    }
}

/// World facts the objectives are judged against this tick.
#[derive(Debug, Clone, Copy)]
pub struct Situation<'a> {
    pub census: &'a Census,
    pub player_position: Vec2,
    pub player_alive: bool,
    pub map_size: f32,
}

#[derive(Debug, Clone)]
pub struct ObjectiveTracker {
    pub objective: Objective,
    pub status: ObjectiveStatus,
    /// Matching kills since the mission started.
    pub kills: u32,
}

impl ObjectiveTracker {
    fn new(objective: Objective) -> Self {
        Self {
            objective,
            status: ObjectiveStatus::Pending,
            kills: 0,
        }
    }

    fn counts_kill(&self, kind: EntityKind) -> bool {
        match &self.objective {
            Objective::DestroyType { target_type, .. } | Objective::DestroyCount { target_type, .. } => {
                target_type.matches(kind)
            }
            _ => false,
        }
    }

    fn is_protect(&self) -> bool {
        matches!(self.objective, Objective::ProtectTarget { .. })
    }

    /// HUD line with a checkbox and progress.
    pub fn text(&self) -> String {
        let mark = match self.status {
            ObjectiveStatus::Satisfied => "[x]",
            ObjectiveStatus::Failed => "[!]",
            _ => "[ ]",
        };
        let progress = match &self.objective {
            Objective::DestroyCount { count, .. } | Objective::DestroyType { count: Some(count), .. } => {
                format!(" ({}/{})", self.kills.min(*count), count)
            }
            _ => String::new(),
        };
        format!("{} {}{}", mark, self.objective.describe(), progress)
    }
}

/// End-of-mission numbers for scoring and the debrief.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MissionSummary {
    pub mission_id: u32,
    pub phase: MissionPhase,
    pub defeat_reason: Option<DefeatReason>,
    pub elapsed: f32,
    pub objectives_completed: u32,
    pub objectives_total: u32,
    pub kills: u32,
    /// Friendly bases and airports destroyed by hostile fire.
    pub structures_lost: u32,
}

/// Live progress of one mission.
#[derive(Debug, Clone)]
pub struct MissionRun {
    pub mission_id: u32,
    objectives: Vec<ObjectiveTracker>,
    phase: MissionPhase,
    defeat_reason: Option<DefeatReason>,
    elapsed: f32,
    time_limit: Option<f32>,
    kills_by_kind: HashMap<EntityKind, u32>,
    structures_lost: u32,
}

impl MissionRun {
    pub fn new(mission: &Mission) -> Self {
        let mut objectives: Vec<ObjectiveTracker> =
            mission.objectives.iter().cloned().map(ObjectiveTracker::new).collect();
        if objectives.is_empty() {
            log::warn!("Mission {} has no objectives; defaulting to destroy_all", mission.mission_id);
            objectives.push(ObjectiveTracker::new(Objective::DestroyAll));
        }
        Self {
            mission_id: mission.mission_id,
            objectives,
            phase: MissionPhase::Briefing,
            defeat_reason: None,
            elapsed: 0.0,
            time_limit: mission.time_limit,
            kills_by_kind: HashMap::new(),
            structures_lost: 0,
        }
    }

    /// Leave the briefing. No effect once playing or finished.
    pub fn start(&mut self) {
        if self.phase != MissionPhase::Briefing {
            return;
        }
        self.phase = MissionPhase::Playing;
        for tracker in &mut self.objectives {
            tracker.status = ObjectiveStatus::InProgress;
        }
        log::info!("Mission {} started with {} objective(s)", self.mission_id, self.objectives.len());
    }

    pub fn phase(&self) -> MissionPhase {
        self.phase
    }

    pub fn defeat_reason(&self) -> Option<DefeatReason> {
        self.defeat_reason
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Seconds left, if the mission has a limit.
    pub fn time_remaining(&self) -> Option<f32> {
        self.time_limit.map(|t| (t - self.elapsed).max(0.0))
    }

    pub fn objectives(&self) -> &[ObjectiveTracker] {
        &self.objectives
    }

    pub fn kills_of(&self, selector: TargetSelector) -> u32 {
        self.kills_by_kind
            .iter()
            .filter(|(k, _)| selector.matches(**k))
            .map(|(_, n)| *n)
            .sum()
    }

    pub fn total_kills(&self) -> u32 {
        self.kills_by_kind.values().sum()
    }

    /// Count a hostile kill toward every open objective that tracks its type.
    pub fn record_kill(&mut self, kill: &KillEvent) {
        if self.phase != MissionPhase::Playing || kill.faction != Faction::Hostile {
            return;
        }
        *self.kills_by_kind.entry(kill.kind).or_insert(0) += 1;
        for tracker in &mut self.objectives {
            if !tracker.status.is_terminal() && tracker.counts_kill(kill.kind) {
                tracker.kills += 1;
                log::debug!("Objective progress: {}", tracker.text());
            }
        }
    }

    /// A friendly site fell to hostile fire. Protect objectives read the
    /// census; this only feeds the summary.
    pub fn record_structure_lost(&mut self, kind: EntityKind, label: Option<&str>) {
        if self.phase != MissionPhase::Playing {
            return;
        }
        self.structures_lost += 1;
        log::info!("Lost {} {}", kind, label.unwrap_or("(unlabelled)"));
    }

    /// Advance the clock and settle objectives. Returns the new phase if the
    /// mission ended this call.
    pub fn update(&mut self, dt: f32, situation: &Situation<'_>) -> Option<MissionPhase> {
        if self.phase != MissionPhase::Playing {
            return None;
        }
        self.elapsed += dt.max(0.0);
        let elapsed = self.elapsed;

        if !situation.player_alive {
            return self.finish(MissionPhase::Defeat, Some(DefeatReason::PlayerDestroyed));
        }

        for tracker in self.objectives.iter_mut().filter(|t| !t.status.is_terminal()) {
            if let Some(status) = evaluate(tracker, situation, elapsed) {
                tracker.status = status;
                log::debug!("Objective settled: {}", tracker.text());
            }
        }

        if let Some(i) = self.objectives.iter().position(|t| t.status == ObjectiveStatus::Failed) {
            return self.finish(MissionPhase::Defeat, Some(DefeatReason::ObjectiveFailed(i)));
        }

        let time_up = self.time_limit.is_some_and(|limit| elapsed >= limit);
        let has_others = self.objectives.iter().any(|t| !t.is_protect());
        let others_done = self
            .objectives
            .iter()
            .filter(|t| !t.is_protect())
            .all(|t| t.status == ObjectiveStatus::Satisfied);
        // Protected targets that outlived the rest of the mission count as saved.
        if (has_others && others_done) || (!has_others && time_up) {
            for tracker in self.objectives.iter_mut().filter(|t| t.is_protect() && !t.status.is_terminal()) {
                tracker.status = ObjectiveStatus::Satisfied;
            }
        }

        if self.objectives.iter().all(|t| t.status == ObjectiveStatus::Satisfied) {
            return self.finish(MissionPhase::Victory, None);
        }
        if time_up {
            return self.finish(MissionPhase::Defeat, Some(DefeatReason::TimeExpired));
        }
        None
    }

    fn finish(&mut self, phase: MissionPhase, reason: Option<DefeatReason>) -> Option<MissionPhase> {
        self.phase = phase;
        self.defeat_reason = reason;
        match reason {
            Some(r) => log::info!("Mission {} lost: {} after {:.1}s", self.mission_id, r, self.elapsed),
            None => log::info!("Mission {} won in {:.1}s", self.mission_id, self.elapsed),
        }
        Some(phase)
    }

    pub fn objective_text(&self) -> Vec<String> {
        self.objectives.iter().map(ObjectiveTracker::text).collect()
    }

    pub fn summary(&self) -> MissionSummary {
        MissionSummary {
            mission_id: self.mission_id,
            phase: self.phase,
            defeat_reason: self.defeat_reason,
            elapsed: self.elapsed,
            objectives_completed: self
                .objectives
                .iter()
                .filter(|t| t.status == ObjectiveStatus::Satisfied)
                .count() as u32,
            objectives_total: self.objectives.len() as u32,
            kills: self.total_kills(),
            structures_lost: self.structures_lost,
        }
    }
}

/// Status an open, non-terminal objective moves to this tick, if any.
fn evaluate(tracker: &ObjectiveTracker, s: &Situation<'_>, elapsed: f32) -> Option<ObjectiveStatus> {
    let satisfied = match &tracker.objective {
        Objective::DestroyAll => s.census.hostiles_alive == 0,
        Objective::DestroyType { target_type, count } => {
            s.census.hostiles_matching(*target_type) == 0 || count.is_some_and(|n| tracker.kills >= n)
        }
        Objective::DestroyCount { count, .. } => tracker.kills >= *count,
        Objective::ReachLocation { x, y, radius } => {
            distance_2d_wrapped(s.player_position, Vec2::new(*x, *y), s.map_size) < *radius
        }
        Objective::SurviveTime { duration } => elapsed >= *duration,
        Objective::ProtectTarget { target_id } => {
            if s.census.label_alive(target_id) == Some(false) {
                return Some(ObjectiveStatus::Failed);
            }
            false
        }
    };
    satisfied.then_some(ObjectiveStatus::Satisfied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{resolve_hit, DamageTable};
    use crate::entity::{Unit, UnitBundle};
    use crate::mission::{Difficulty, PlayerStart, Weather};
    use crate::weapons::WeaponType;
    use engine_core::Position;
    use hecs::World;

    fn mission(objectives: Vec<Objective>, time_limit: Option<f32>) -> Mission {
        Mission {
            mission_id: 1,
            name: "Test".into(),
            map_index: 1,
            difficulty: Difficulty::Medium,
            weather: Weather::Clear,
            player_start: PlayerStart {
                x: 0.0,
                y: 0.0,
                z: None,
                heading: 0.0,
            },
            airports: vec![],
            bases: vec![],
            helipads: vec![],
            spawn_zones: vec![],
            objectives,
            briefing: String::new(),
            time_limit,
        }
    }

    fn situation(census: &Census) -> Situation<'_> {
        Situation {
            census,
            player_position: Vec2::ZERO,
            player_alive: true,
            map_size: 1024.0,
        }
    }

    fn kill_one(world: &mut World, kind: EntityKind) -> KillEvent {
        let e = UnitBundle::new(kind, Faction::Hostile, Position::default()).spawn(world);
        let mut last = None;
        for _ in 0..10 {
            match resolve_hit(world, e, WeaponType::Missile, &DamageTable::standard(), 1.0) {
                Some(hit) => last = hit.kill,
                None => break,
            }
        }
        last.expect("target destroyed")
    }

    #[test]
    fn destroy_count_needs_exactly_two_tank_kills() {
        let mut world = World::new();
        // A live tank keeps destroy_all-style checks honest.
        UnitBundle::new(EntityKind::Tank, Faction::Hostile, Position::default()).spawn(&mut world);
        let mut run = MissionRun::new(&mission(
            vec![Objective::DestroyCount {
                target_type: TargetSelector::Kind(EntityKind::Tank),
                count: 2,
            }],
            None,
        ));
        run.start();

        let kill = kill_one(&mut world, EntityKind::Tank);
        run.record_kill(&kill);
        let census = Census::gather(&world);
        assert_eq!(run.update(0.1, &situation(&census)), None);
        assert_eq!(run.phase(), MissionPhase::Playing);
        assert_eq!(run.objectives()[0].status, ObjectiveStatus::InProgress);

        let kill = kill_one(&mut world, EntityKind::Tank);
        run.record_kill(&kill);
        let census = Census::gather(&world);
        assert_eq!(run.update(0.1, &situation(&census)), Some(MissionPhase::Victory));
        assert_eq!(run.objectives()[0].status, ObjectiveStatus::Satisfied);
    }

    #[test]
    fn kills_of_other_types_do_not_count() {
        let mut world = World::new();
        let mut run = MissionRun::new(&mission(
            vec![Objective::DestroyCount {
                target_type: TargetSelector::Kind(EntityKind::Tank),
                count: 1,
            }],
            None,
        ));
        run.start();
        let kill = kill_one(&mut world, EntityKind::Soldier);
        run.record_kill(&kill);
        let census = Census::gather(&world);
        assert_eq!(run.update(0.1, &situation(&census)), None);
        assert_eq!(run.kills_of(TargetSelector::Kind(EntityKind::Soldier)), 1);
        assert_eq!(run.objectives()[0].kills, 0);
    }

    #[test]
    fn kills_before_start_are_ignored() {
        let mut world = World::new();
        let mut run = MissionRun::new(&mission(vec![Objective::DestroyAll], None));
        let kill = kill_one(&mut world, EntityKind::Tank);
        run.record_kill(&kill);
        assert_eq!(run.total_kills(), 0);
        assert_eq!(run.phase(), MissionPhase::Briefing);
        assert_eq!(run.update(1.0, &situation(&Census::default())), None);
    }

    #[test]
    fn destroy_type_is_scoped_destroy_all() {
        let mut world = World::new();
        UnitBundle::new(EntityKind::Soldier, Faction::Hostile, Position::default()).spawn(&mut world);
        let sam = UnitBundle::new(EntityKind::SamSite, Faction::Hostile, Position::default()).spawn(&mut world);
        let mut run = MissionRun::new(&mission(
            vec![Objective::DestroyType {
                target_type: TargetSelector::Kind(EntityKind::SamSite),
                count: None,
            }],
            None,
        ));
        run.start();
        assert_eq!(run.update(0.1, &situation(&Census::gather(&world))), None);

        world.get::<&mut Unit>(sam).expect("sam").alive = false;
        assert_eq!(
            run.update(0.1, &situation(&Census::gather(&world))),
            Some(MissionPhase::Victory)
        );
    }

    #[test]
    fn reach_location_uses_wrapped_distance() {
        let mut run = MissionRun::new(&mission(
            vec![Objective::ReachLocation {
                x: 1020.0,
                y: 10.0,
                radius: 20.0,
            }],
            None,
        ));
        run.start();
        let census = Census::default();
        let mut s = situation(&census);
        s.player_position = Vec2::new(500.0, 10.0);
        assert_eq!(run.update(0.1, &s), None);
        s.player_position = Vec2::new(5.0, 10.0);
        assert_eq!(run.update(0.1, &s), Some(MissionPhase::Victory));
    }

    #[test]
    fn protect_target_fails_when_target_dies() {
        let mut world = World::new();
        UnitBundle::new(EntityKind::Tank, Faction::Hostile, Position::default()).spawn(&mut world);
        let base = UnitBundle::new(EntityKind::Base, Faction::Friendly, Position::default())
            .with_label("fob")
            .spawn(&mut world);
        let mut run = MissionRun::new(&mission(
            vec![
                Objective::DestroyAll,
                Objective::ProtectTarget { target_id: "fob".into() },
            ],
            None,
        ));
        run.start();
        assert_eq!(run.update(0.1, &situation(&Census::gather(&world))), None);

        world.get::<&mut Unit>(base).expect("base").alive = false;
        assert_eq!(
            run.update(0.1, &situation(&Census::gather(&world))),
            Some(MissionPhase::Defeat)
        );
        assert_eq!(run.defeat_reason(), Some(DefeatReason::ObjectiveFailed(1)));
        // Terminal: nothing reopens.
        assert_eq!(run.update(0.1, &situation(&Census::default())), None);
        assert_eq!(run.phase(), MissionPhase::Defeat);
    }

    #[test]
    fn protect_target_satisfied_with_the_rest() {
        let mut world = World::new();
        UnitBundle::new(EntityKind::Base, Faction::Friendly, Position::default())
            .with_label("fob")
            .spawn(&mut world);
        let mut run = MissionRun::new(&mission(
            vec![
                Objective::ProtectTarget { target_id: "fob".into() },
                Objective::DestroyAll,
            ],
            None,
        ));
        run.start();
        assert_eq!(
            run.update(0.1, &situation(&Census::gather(&world))),
            Some(MissionPhase::Victory)
        );
        assert!(run.objectives().iter().all(|t| t.status == ObjectiveStatus::Satisfied));
    }

    #[test]
    fn survive_time_and_time_limit() {
        let census = Census::default();
        let mut run = MissionRun::new(&mission(vec![Objective::SurviveTime { duration: 5.0 }], Some(60.0)));
        run.start();
        assert_eq!(run.update(4.0, &situation(&census)), None);
        assert_eq!(run.update(1.0, &situation(&census)), Some(MissionPhase::Victory));

        let mut run = MissionRun::new(&mission(
            vec![Objective::DestroyCount {
                target_type: TargetSelector::Air,
                count: 3,
            }],
            Some(10.0),
        ));
        run.start();
        assert_eq!(run.update(9.0, &situation(&census)), None);
        assert_eq!(run.time_remaining(), Some(1.0));
        assert_eq!(run.update(1.0, &situation(&census)), Some(MissionPhase::Defeat));
        assert_eq!(run.defeat_reason(), Some(DefeatReason::TimeExpired));
    }

    #[test]
    fn player_death_is_defeat() {
        let census = Census::default();
        let mut run = MissionRun::new(&mission(vec![Objective::SurviveTime { duration: 5.0 }], None));
        run.start();
        let mut s = situation(&census);
        s.player_alive = false;
        assert_eq!(run.update(10.0, &s), Some(MissionPhase::Defeat));
        assert_eq!(run.defeat_reason(), Some(DefeatReason::PlayerDestroyed));
        assert_eq!(run.summary().objectives_completed, 0);
    }

    #[test]
    fn empty_objectives_default_to_destroy_all() {
        let run = MissionRun::new(&mission(vec![], None));
        assert_eq!(run.objectives().len(), 1);
        assert_eq!(run.objectives()[0].objective, Objective::DestroyAll);
        assert_eq!(run.objective_text(), vec!["[ ] Destroy all hostile forces".to_string()]);
    }
}
