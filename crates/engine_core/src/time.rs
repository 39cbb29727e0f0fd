//! Time management for the game loop.
//!
//! The clock is advanced explicitly by the caller rather than reading the wall
//! clock, so a run fed the same deltas replays identically.

use std::time::Duration;

/// Manages frame timing and the fixed simulation step.
#[derive(Debug)]
pub struct Time {
    /// Total elapsed time since start.
    elapsed: Duration,
    /// Fixed timestep for the simulation (default 30 Hz).
    fixed_timestep: Duration,
    /// Accumulated time for fixed updates.
    accumulator: Duration,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    /// Create a new time manager.
    pub fn new() -> Self {
        Self {
            elapsed: Duration::ZERO,
            fixed_timestep: Duration::from_secs_f64(1.0 / 30.0),
            accumulator: Duration::ZERO,
        }
    }

    /// Advance by one frame of `dt` seconds. Negative and non-finite deltas
    /// are treated as zero.
    pub fn advance(&mut self, dt: f32) {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let delta = Duration::from_secs_f32(dt);
        self.elapsed += delta;
        self.accumulator += delta;
    }

    /// Get total elapsed time in seconds.
    pub fn elapsed_seconds(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    /// Get the fixed timestep in seconds.
    pub fn fixed_timestep_seconds(&self) -> f32 {
        self.fixed_timestep.as_secs_f32()
    }

    /// Check if a fixed update should run and consume the time.
    pub fn should_fixed_update(&mut self) -> bool {
        if self.accumulator >= self.fixed_timestep {
            self.accumulator -= self.fixed_timestep;
            true
        } else {
            false
        }
    }

    /// Set the fixed timestep rate in Hz.
    pub fn set_fixed_rate(&mut self, hz: f64) {
        self.fixed_timestep = Duration::from_secs_f64(1.0 / hz.max(1.0));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_steps_drain_accumulator() {
        let mut time = Time::new();
        time.set_fixed_rate(10.0);
        time.advance(0.25);
        let mut steps = 0;
        while time.should_fixed_update() {
            steps += 1;
        }
        assert_eq!(steps, 2);
        assert!((time.elapsed_seconds() - 0.25).abs() < 1e-6);
    }

    #[test]
    fn bad_deltas_are_ignored() {
        let mut time = Time::new();
        for dt in [f32::NAN, f32::INFINITY, f32::NEG_INFINITY, -1.0] {
            time.advance(dt);
        }
        assert_eq!(time.elapsed_seconds(), 0.0);
        assert!(!time.should_fixed_update());
    }
}
