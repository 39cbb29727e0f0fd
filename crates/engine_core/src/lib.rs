//! Core engine types and utilities for Voxel Strike.
//!
//! This crate provides the foundational types used across all engine systems:
//! - World configuration (map size, render distance, flight envelope)
//! - Toroidal spatial math shared by the renderer and gameplay
//! - Time management for the fixed-step simulation
//! - Common component types for the entity world

pub mod components;
pub mod config;
pub mod spatial;
pub mod time;

pub use components::*;
pub use config::*;
pub use spatial::*;
pub use time::*;

// Re-export commonly used types
pub use glam::{Vec2, Vec3};
