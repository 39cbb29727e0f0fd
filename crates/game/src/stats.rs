//! Stats events, the in-memory ledger, and the post-mission debrief.
//!
//! The simulation only ever writes here; nothing read back during play
//! affects the outcome.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityKind;
use crate::objectives::{MissionPhase, MissionSummary};
use crate::weapons::WeaponType;

/// Leaderboard length.
pub const LEADERBOARD_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatsEvent {
    Kill {
        kind: EntityKind,
        weapon: WeaponType,
    },
    Death {
        mission_id: u32,
    },
    MissionComplete {
        mission_id: u32,
        victory: bool,
        score: u32,
        time_seconds: f32,
    },
    HighScore {
        callsign: String,
        score: u32,
    },
}

/// Receiver of gameplay statistics.
pub trait StatsSink {
    fn record(&mut self, event: StatsEvent);
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StatsTotals {
    pub kills: u32,
    pub deaths: u32,
    pub missions_flown: u32,
    pub missions_won: u32,
    pub kills_by_kind: HashMap<EntityKind, u32>,
    pub kills_by_weapon: HashMap<WeaponType, u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub callsign: String,
    pub score: u32,
}

/// In-memory sink with aggregate counters and a top-ten board.
#[derive(Debug, Clone, Default)]
pub struct StatsLedger {
    totals: StatsTotals,
    leaderboard: Vec<LeaderboardEntry>,
}

impl StatsLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn totals(&self) -> &StatsTotals {
        &self.totals
    }

    /// Best first; ties keep the earlier entry ahead.
    pub fn leaderboard(&self) -> &[LeaderboardEntry] {
        &self.leaderboard
    }

    /// Would `score` make the board?
    pub fn qualifies(&self, score: u32) -> bool {
        self.leaderboard.len() < LEADERBOARD_SIZE || self.leaderboard.last().is_some_and(|e| score > e.score)
    }
}

impl StatsSink for StatsLedger {
    fn record(&mut self, event: StatsEvent) {
        match event {
            StatsEvent::Kill { kind, weapon } => {
                self.totals.kills += 1;
                *self.totals.kills_by_kind.entry(kind).or_insert(0) += 1;
                *self.totals.kills_by_weapon.entry(weapon).or_insert(0) += 1;
            }
            StatsEvent::Death { .. } => self.totals.deaths += 1,
            StatsEvent::MissionComplete { victory, .. } => {
                self.totals.missions_flown += 1;
                if victory {
                    self.totals.missions_won += 1;
                }
            }
            StatsEvent::HighScore { callsign, score } => {
                if !self.qualifies(score) {
                    return;
                }
                let at = self.leaderboard.partition_point(|e| e.score >= score);
                self.leaderboard.insert(at, LeaderboardEntry { callsign, score });
                self.leaderboard.truncate(LEADERBOARD_SIZE);
            }
        }
    }
}

/// Consecutive kills inside a short window.
#[derive(Debug, Clone)]
pub struct KillStreak {
    pub count: u32,
    pub best: u32,
    time_since_kill: f32,
    timeout: f32,
}

impl Default for KillStreak {
    fn default() -> Self {
        Self {
            count: 0,
            best: 0,
            time_since_kill: f32::INFINITY,
            timeout: 3.0,
        }
    }
}

impl KillStreak {
    /// Register a kill; returns the callout for a new multi-kill tier.
    pub fn register_kill(&mut self) -> Option<&'static str> {
        self.time_since_kill = 0.0;
        self.count += 1;
        self.best = self.best.max(self.count);
        match self.count {
            2 => Some("DOUBLE KILL"),
            3 => Some("TRIPLE KILL"),
            5 => Some("RAMPAGE"),
            n if n >= 10 && n % 5 == 0 => Some("UNSTOPPABLE"),
            _ => None,
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.time_since_kill += dt;
        if self.time_since_kill > self.timeout {
            self.count = 0;
        }
    }
}

/// Numbers handed to a debrief advisor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebriefTelemetry {
    pub kills: u32,
    pub deaths: u32,
    pub accuracy: f32,
    pub objectives_completed: u32,
    pub objectives_total: u32,
    pub time_seconds: f32,
    pub victory: bool,
    pub structures_lost: u32,
}

impl DebriefTelemetry {
    pub fn from_summary(summary: &MissionSummary, accuracy: f32) -> Self {
        Self {
            kills: summary.kills,
            deaths: u32::from(summary.defeat_reason == Some(crate::objectives::DefeatReason::PlayerDestroyed)),
            accuracy,
            objectives_completed: summary.objectives_completed,
            objectives_total: summary.objectives_total,
            time_seconds: summary.elapsed,
            victory: summary.phase == MissionPhase::Victory,
            structures_lost: summary.structures_lost,
        }
    }
}

/// Mission score: kill value, objective bonus, a victory bonus that shrinks
/// with time taken, and an accuracy bonus.
pub fn mission_score(kill_value: u32, telemetry: &DebriefTelemetry) -> u32 {
    let objectives = telemetry.objectives_completed * 250;
    let victory = if telemetry.victory {
        let time_bonus = (600.0 - telemetry.time_seconds).max(0.0) as u32;
        1000 + time_bonus
    } else {
        0
    };
    let accuracy = (telemetry.accuracy.clamp(0.0, 1.0) * 500.0) as u32;
    kill_value + objectives + victory + accuracy
}

/// Source of post-mission advice (an external service in production).
pub trait DebriefAdvisor {
    /// `None` when no advice could be produced; callers fall back to
    /// [`local_debrief`].
    fn advise(&self, telemetry: &DebriefTelemetry) -> Option<String>;
}

/// Always declines, so the local summary is used.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineAdvisor;

impl DebriefAdvisor for OfflineAdvisor {
    fn advise(&self, _telemetry: &DebriefTelemetry) -> Option<String> {
        None
    }
}

/// Rule-based debrief used when no advisor answers.
pub fn local_debrief(t: &DebriefTelemetry) -> String {
    let mut lines = Vec::new();
    lines.push(if t.victory {
        format!("Mission accomplished in {:.0}s.", t.time_seconds)
    } else {
        format!("Mission failed after {:.0}s.", t.time_seconds)
    });
    lines.push(format!(
        "Objectives {}/{}, {} kill(s), {:.0}% accuracy.",
        t.objectives_completed,
        t.objectives_total,
        t.kills,
        t.accuracy * 100.0
    ));
    if t.deaths > 0 {
        lines.push("You were shot down. Stay out of SAM range and use terrain for cover.".into());
    }
    if t.structures_lost > 0 {
        lines.push(format!(
            "{} friendly site(s) lost. Intercept attackers before they reach the bases.",
            t.structures_lost
        ));
    }
    if t.accuracy < 0.25 && t.kills > 0 {
        lines.push("Accuracy was low. Close the distance before firing.".into());
    }
    if !t.victory && t.deaths == 0 && t.objectives_completed < t.objectives_total {
        lines.push("Prioritise the objectives over targets of opportunity.".into());
    }
    lines.join("\n")
}

/// Ask the advisor, falling back to the local summary.
pub fn debrief<A: DebriefAdvisor + ?Sized>(advisor: &A, telemetry: &DebriefTelemetry) -> String {
    match advisor.advise(telemetry) {
        Some(text) if !text.trim().is_empty() => text,
        _ => {
            log::debug!("Debrief advisor unavailable; using local summary");
            local_debrief(telemetry)
        }
    }
}
