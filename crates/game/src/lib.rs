//! Voxel Strike gameplay: entities, combat, missions and the simulation tick.
//!
//! The renderer and the gameplay code share one toroidal world model from
//! `engine_core`, so "in range", "on screen" and "reached" all agree.

pub mod ai;
pub mod combat;
pub mod config;
pub mod entity;
pub mod generation;
pub mod mission;
pub mod objectives;
pub mod player;
pub mod radar;
pub mod sim;
pub mod spawner;
pub mod stats;
pub mod validation;
pub mod view;
pub mod weapons;

pub use combat::{DamageTable, KillEvent};
pub use config::GameConfig;
pub use entity::{EntityKind, TargetSelector};
pub use generation::{generate_mission, default_mission, GenerationRequest, MissionGenerator};
pub use mission::{normalize_difficulty, Difficulty, Mission, Objective};
pub use objectives::{MissionPhase, MissionRun};
pub use sim::Simulation;
pub use validation::{validate_mission, ValidationReport};
pub use weapons::WeaponType;
